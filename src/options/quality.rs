use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Geometry detail level for tessellated primitives.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Pick a level from the size of the data.
    Auto,
    /// Coarse tessellation.
    Low,
    /// Default tessellation.
    #[default]
    Medium,
    /// Fine tessellation.
    High,
}

impl Quality {
    /// Every level, in ascending order of detail after `Auto`.
    pub const ALL: [&'static str; 4] = ["auto", "low", "medium", "high"];

    /// Resolve `Auto` for an object with `atom_count` atoms.
    #[must_use]
    pub fn resolve(self, atom_count: usize) -> Self {
        match self {
            Self::Auto if atom_count < 15_000 => Self::High,
            Self::Auto if atom_count < 80_000 => Self::Medium,
            Self::Auto => Self::Low,
            q => q,
        }
    }

    /// Segments around cylinder and tube cross-sections.
    #[must_use]
    pub fn radial_segments(self, atom_count: usize) -> u32 {
        match self.resolve(atom_count) {
            Self::Low => 6,
            Self::High => 20,
            _ => 10,
        }
    }

    /// Sphere subdivision level.
    #[must_use]
    pub fn sphere_detail(self, atom_count: usize) -> u32 {
        match self.resolve(atom_count) {
            Self::Low => 0,
            Self::High => 2,
            _ => 1,
        }
    }

    /// Spline subdivisions between consecutive trace points.
    #[must_use]
    pub fn subdiv(self, atom_count: usize) -> u32 {
        match self.resolve(atom_count) {
            Self::Low => 3,
            Self::High => 12,
            _ => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_scales_with_size() {
        assert_eq!(Quality::Auto.resolve(100), Quality::High);
        assert_eq!(Quality::Auto.resolve(20_000), Quality::Medium);
        assert_eq!(Quality::Auto.resolve(200_000), Quality::Low);
        assert_eq!(Quality::Low.resolve(10), Quality::Low);
    }

    #[test]
    fn detail_follows_level() {
        assert!(Quality::High.radial_segments(0) > Quality::Low.radial_segments(0));
        assert_eq!(Quality::Medium.sphere_detail(0), 1);
    }
}
