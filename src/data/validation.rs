/// A steric clash between two atoms, each given as a selection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clash {
    /// Selection of the first atom.
    pub sele1: String,
    /// Selection of the second atom.
    pub sele2: String,
}

/// Validation report attached to a structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    name: String,
    clashes: Vec<Clash>,
}

impl Validation {
    /// Report with the given clashes.
    #[must_use]
    pub fn new(name: &str, clashes: Vec<Clash>) -> Self {
        Self {
            name: name.to_owned(),
            clashes,
        }
    }

    /// Report name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All clashes.
    #[must_use]
    pub fn clashes(&self) -> &[Clash] {
        &self.clashes
    }
}
