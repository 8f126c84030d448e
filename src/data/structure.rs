//! Columnar atom/bond store with index-based proxies.

use std::rc::Rc;

use glam::Vec3;

use super::selection::Selection;
use super::{bounds, Instance};

/// One atom as handed to [`StructureBuilder::add_atom`].
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    /// Atom name, e.g. `CA`.
    pub name: String,
    /// Residue name, e.g. `ALA`.
    pub resname: String,
    /// Residue number.
    pub resno: i32,
    /// Chain name.
    pub chain: String,
    /// Element symbol.
    pub element: String,
    /// Whether the atom belongs to a HETATM record.
    pub hetero: bool,
    /// Cartesian position in angstroms.
    pub position: Vec3,
}

/// Bond topology as parallel arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondStore {
    atom1: Vec<u32>,
    atom2: Vec<u32>,
    order: Vec<u8>,
}

impl BondStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bond between two atom indices.
    pub fn add_bond(&mut self, atom1: usize, atom2: usize, order: u8) {
        self.atom1.push(atom1 as u32);
        self.atom2.push(atom2 as u32);
        self.order.push(order);
    }

    /// Number of bonds.
    #[must_use]
    pub fn count(&self) -> usize {
        self.atom1.len()
    }

    /// Atom indices of bond `index`.
    #[must_use]
    pub fn atoms(&self, index: usize) -> (usize, usize) {
        (self.atom1[index] as usize, self.atom2[index] as usize)
    }

    /// Bond order of bond `index`.
    #[must_use]
    pub fn order(&self, index: usize) -> u8 {
        self.order[index]
    }
}

/// A molecular structure: atoms in columns, bonds, assembly instances.
#[derive(Debug, Clone)]
pub struct Structure {
    name: String,
    atom_name: Vec<String>,
    resname: Vec<String>,
    resno: Vec<i32>,
    chain: Vec<String>,
    element: Vec<String>,
    hetero: Vec<bool>,
    position: Vec<Vec3>,
    bonds: Rc<BondStore>,
    instances: Vec<Instance>,
}

impl Structure {
    /// Structure name (usually the file stem).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of atoms.
    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.position.len()
    }

    /// Number of distinct residues, counted as runs of (chain, resno).
    #[must_use]
    pub fn residue_count(&self) -> usize {
        (0..self.atom_count())
            .filter(|&i| {
                i == 0
                    || self.resno[i] != self.resno[i - 1]
                    || self.chain[i] != self.chain[i - 1]
            })
            .count()
    }

    /// Atom name column value.
    #[must_use]
    pub fn atom_name(&self, index: usize) -> &str {
        &self.atom_name[index]
    }

    /// Residue name column value.
    #[must_use]
    pub fn resname(&self, index: usize) -> &str {
        &self.resname[index]
    }

    /// Residue number column value.
    #[must_use]
    pub fn resno(&self, index: usize) -> i32 {
        self.resno[index]
    }

    /// Chain name column value.
    #[must_use]
    pub fn chain(&self, index: usize) -> &str {
        &self.chain[index]
    }

    /// Element column value.
    #[must_use]
    pub fn element(&self, index: usize) -> &str {
        &self.element[index]
    }

    /// Hetero flag column value.
    #[must_use]
    pub fn is_hetero(&self, index: usize) -> bool {
        self.hetero[index]
    }

    /// Position of atom `index`.
    #[must_use]
    pub fn position(&self, index: usize) -> Vec3 {
        self.position[index]
    }

    /// All atom positions.
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.position
    }

    /// Shared bond store.
    #[must_use]
    pub fn bonds(&self) -> &Rc<BondStore> {
        &self.bonds
    }

    /// Assembly instances. Empty means a single untransformed copy.
    #[must_use]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Copy of this structure with new coordinates. Returns `None` when the
    /// coordinate count does not match the atom count.
    #[must_use]
    pub fn with_positions(&self, positions: &[Vec3]) -> Option<Self> {
        if positions.len() != self.atom_count() {
            return None;
        }
        let mut copy = self.clone();
        copy.position = positions.to_vec();
        Some(copy)
    }

    /// Indices of atoms matching `selection`, ascending.
    #[must_use]
    pub fn atom_indices(&self, selection: &Selection) -> Vec<usize> {
        (0..self.atom_count())
            .filter(|&i| selection.matches(self, i))
            .collect()
    }

    /// Center of the bounding box of all atoms.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        bounds(self.position.iter().copied())
            .map_or(Vec3::ZERO, |(min, max)| (min + max) * 0.5)
    }

    /// Center and bounding-box diagonal of the atoms in `selection`.
    #[must_use]
    pub fn selection_extent(&self, selection: &Selection) -> Option<(Vec3, f32)> {
        let (min, max) = bounds(
            self.atom_indices(selection)
                .into_iter()
                .map(|i| self.position[i]),
        )?;
        Some(((min + max) * 0.5, (max - min).length()))
    }
}

/// Incremental builder for [`Structure`].
#[derive(Debug, Default)]
pub struct StructureBuilder {
    name: String,
    atoms: Vec<AtomRecord>,
    bonds: BondStore,
    instances: Vec<Instance>,
}

impl StructureBuilder {
    /// Start a structure with the given name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Append an atom; returns its index.
    pub fn add_atom(&mut self, atom: AtomRecord) -> usize {
        self.atoms.push(atom);
        self.atoms.len() - 1
    }

    /// Append a bond between two existing atoms.
    pub fn add_bond(&mut self, atom1: usize, atom2: usize, order: u8) -> &mut Self {
        self.bonds.add_bond(atom1, atom2, order);
        self
    }

    /// Append an assembly instance.
    pub fn add_instance(&mut self, instance: Instance) -> &mut Self {
        self.instances.push(instance);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Structure {
        let n = self.atoms.len();
        let mut s = Structure {
            name: self.name,
            atom_name: Vec::with_capacity(n),
            resname: Vec::with_capacity(n),
            resno: Vec::with_capacity(n),
            chain: Vec::with_capacity(n),
            element: Vec::with_capacity(n),
            hetero: Vec::with_capacity(n),
            position: Vec::with_capacity(n),
            bonds: Rc::new(self.bonds),
            instances: self.instances,
        };
        for a in self.atoms {
            s.atom_name.push(a.name);
            s.resname.push(a.resname);
            s.resno.push(a.resno);
            s.chain.push(a.chain);
            s.element.push(a.element);
            s.hetero.push(a.hetero);
            s.position.push(a.position);
        }
        s
    }
}

/// The part of a structure a component currently exposes.
#[derive(Debug, Clone)]
pub struct StructureView {
    structure: Rc<Structure>,
    atoms: Vec<usize>,
}

impl StructureView {
    /// View restricted to `selection`.
    #[must_use]
    pub fn new(structure: Rc<Structure>, selection: &Selection) -> Self {
        let atoms = structure.atom_indices(selection);
        Self { structure, atoms }
    }

    /// The underlying full structure.
    #[must_use]
    pub fn structure(&self) -> &Rc<Structure> {
        &self.structure
    }

    /// Number of atoms in the view.
    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Atom indices (into the full structure) in the view.
    #[must_use]
    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    /// Atoms of the view that also match `selection`.
    #[must_use]
    pub fn atom_indices(&self, selection: &Selection) -> Vec<usize> {
        if selection.is_all() {
            return self.atoms.clone();
        }
        self.atoms
            .iter()
            .copied()
            .filter(|&i| selection.matches(&self.structure, i))
            .collect()
    }

    /// Bonds whose two atoms are both inside `atoms` (sorted ascending).
    #[must_use]
    pub fn bonds_within(&self, atoms: &[usize]) -> Vec<usize> {
        let bonds = self.structure.bonds();
        (0..bonds.count())
            .filter(|&b| {
                let (a1, a2) = bonds.atoms(b);
                atoms.binary_search(&a1).is_ok()
                    && atoms.binary_search(&a2).is_ok()
            })
            .collect()
    }
}

/// Live view of one atom; reads through to the columnar store.
#[derive(Debug, Clone)]
pub struct AtomProxy {
    structure: Rc<Structure>,
    index: usize,
}

impl AtomProxy {
    /// Proxy for atom `index` of `structure`.
    #[must_use]
    pub fn new(structure: Rc<Structure>, index: usize) -> Self {
        Self { structure, index }
    }

    /// Atom index in the structure.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Owning structure.
    #[must_use]
    pub fn structure(&self) -> &Rc<Structure> {
        &self.structure
    }

    /// Atom position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.structure.position(self.index)
    }

    /// Atom name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.structure.atom_name(self.index)
    }

    /// Residue name.
    #[must_use]
    pub fn resname(&self) -> &str {
        self.structure.resname(self.index)
    }

    /// Residue number.
    #[must_use]
    pub fn resno(&self) -> i32 {
        self.structure.resno(self.index)
    }

    /// Chain name.
    #[must_use]
    pub fn chain(&self) -> &str {
        self.structure.chain(self.index)
    }

    /// Element symbol.
    #[must_use]
    pub fn element(&self) -> &str {
        self.structure.element(self.index)
    }

    /// Euclidean distance to another atom.
    #[must_use]
    pub fn distance_to(&self, other: &AtomProxy) -> f32 {
        self.position().distance(other.position())
    }

    /// `[RES]NUM:CHAIN.ATOM` label.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!(
            "[{}]{}:{}.{}",
            self.resname(),
            self.resno(),
            self.chain(),
            self.name()
        )
    }
}

impl PartialEq for AtomProxy {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.structure, &other.structure) && self.index == other.index
    }
}

/// Live view of one bond in a bond store.
#[derive(Debug, Clone)]
pub struct BondProxy {
    structure: Rc<Structure>,
    bonds: Rc<BondStore>,
    index: usize,
}

impl BondProxy {
    /// Proxy for bond `index` of `bonds`, whose atoms live in `structure`.
    #[must_use]
    pub fn new(structure: Rc<Structure>, bonds: Rc<BondStore>, index: usize) -> Self {
        Self {
            structure,
            bonds,
            index,
        }
    }

    /// Bond index in its store.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// First atom.
    #[must_use]
    pub fn atom1(&self) -> AtomProxy {
        AtomProxy::new(Rc::clone(&self.structure), self.bonds.atoms(self.index).0)
    }

    /// Second atom.
    #[must_use]
    pub fn atom2(&self) -> AtomProxy {
        AtomProxy::new(Rc::clone(&self.structure), self.bonds.atoms(self.index).1)
    }

    /// Bond order.
    #[must_use]
    pub fn order(&self) -> u8 {
        self.bonds.order(self.index)
    }

    /// Midpoint between the two atoms.
    #[must_use]
    pub fn midpoint(&self) -> Vec3 {
        (self.atom1().position() + self.atom2().position()) * 0.5
    }
}
