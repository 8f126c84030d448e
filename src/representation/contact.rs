//! Polar contacts: N/O pairs from different residues within a cutoff.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::color::uniform_colors;
use super::{
    set_kind_attribute, DisplayParams, Representation, RepresentationSource, StructureSource,
};
use crate::buffer::{Buffer, BufferError, BufferKind};
use crate::data::BondStore;
use crate::params::{Attribute, ChangeClass, ParamKind, ParamSpec, What};
use crate::picking::Picker;
use crate::representation::ColorScheme;

/// Contact type stored as the pseudo-bond order.
const HYDROGEN_BOND: u8 = 1;

/// Parameters of the `contact` representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContactParams {
    /// Shared options.
    #[serde(flatten)]
    pub display: DisplayParams,
    /// Maximum donor-acceptor distance in angstroms.
    pub max_distance: f32,
    /// Cylinder radius.
    pub radius: f32,
}

impl Default for ContactParams {
    fn default() -> Self {
        Self {
            display: DisplayParams {
                color_scheme: ColorScheme::Uniform,
                color: [0.2, 0.6, 1.0],
                ..DisplayParams::default()
            },
            max_distance: 3.5,
            radius: 0.05,
        }
    }
}

const PARAMS: &[ParamSpec] = &[
    ParamSpec::new(
        "max_distance",
        ParamKind::Number { min: 0.5, max: 10.0 },
        ChangeClass::Rebuild,
    ),
    ParamSpec::new(
        "radius",
        ParamKind::Number { min: 0.01, max: 2.0 },
        ChangeClass::Update(Attribute::Radius),
    ),
];

/// Dashed-bond style cylinders between polar atoms.
#[derive(Debug, Clone, Default)]
pub struct ContactRepresentation {
    params: ContactParams,
}

impl ContactRepresentation {
    /// Representation with the default cutoff.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn contacts(&self, source: &StructureSource) -> BondStore {
        let structure = source.view.structure();
        let polar: Vec<usize> = source
            .atoms(&self.params.display.sele)
            .into_iter()
            .filter(|&a| matches!(structure.element(a), "N" | "O"))
            .collect();
        let max_sq = self.params.max_distance * self.params.max_distance;
        let mut store = BondStore::new();
        for (i, &a) in polar.iter().enumerate() {
            for &b in &polar[i + 1..] {
                let same_residue = structure.resno(a) == structure.resno(b)
                    && structure.chain(a) == structure.chain(b);
                if !same_residue
                    && structure.position(a).distance_squared(structure.position(b)) <= max_sq
                {
                    store.add_bond(a, b, HYDROGEN_BOND);
                }
            }
        }
        store
    }

    fn ends(source: &StructureSource, contacts: &BondStore) -> (Vec<f32>, Vec<f32>) {
        let structure = source.view.structure();
        let mut p1 = Vec::with_capacity(contacts.count() * 3);
        let mut p2 = Vec::with_capacity(contacts.count() * 3);
        for i in 0..contacts.count() {
            let (a, b) = contacts.atoms(i);
            p1.extend_from_slice(&structure.position(a).to_array());
            p2.extend_from_slice(&structure.position(b).to_array());
        }
        (p1, p2)
    }
}

impl Representation for ContactRepresentation {
    fn type_name(&self) -> &'static str {
        "contact"
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        PARAMS
    }

    params_accessors!();

    fn supports(&self, source: &RepresentationSource) -> bool {
        source.structure().is_some()
    }

    fn create(&self, source: &RepresentationSource) -> Vec<Buffer> {
        let Some(src) = source.structure() else {
            return Vec::new();
        };
        let contacts = self.contacts(src);
        let n = contacts.count();
        if n == 0 {
            return Vec::new();
        }
        let structure = src.view.structure();
        let (p1, p2) = Self::ends(src, &contacts);
        vec![Buffer::new(BufferKind::Cylinder, p1)
            .with_attribute("position2", p2)
            .with_attribute("color", uniform_colors(self.params.display.color, n))
            .with_attribute("radius", vec![self.params.radius; n])
            .with_picker(Picker::Contact {
                structure: Rc::clone(structure),
                contacts: Rc::new(contacts),
                array: None,
            })
            .with_instances(structure.instances().to_vec())
            .with_params(self.params.display.buffer_params(src.view.atom_count()))]
    }

    fn update(
        &self,
        source: &RepresentationSource,
        what: What,
        buffers: &mut [Buffer],
    ) -> Result<(), BufferError> {
        let Some(src) = source.structure() else {
            return Ok(());
        };
        let contacts = self.contacts(src);
        let n = contacts.count();
        if what.position {
            let (p1, p2) = Self::ends(src, &contacts);
            set_kind_attribute(buffers, BufferKind::Cylinder, "position", &p1)?;
            set_kind_attribute(buffers, BufferKind::Cylinder, "position2", &p2)?;
        }
        if what.color {
            let colors = uniform_colors(self.params.display.color, n);
            set_kind_attribute(buffers, BufferKind::Cylinder, "color", &colors)?;
        }
        if what.radius {
            let radii = vec![self.params.radius; n];
            set_kind_attribute(buffers, BufferKind::Cylinder, "radius", &radii)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{fixtures, Selection, StructureView};

    fn source() -> RepresentationSource {
        RepresentationSource::Structure(StructureSource::new(StructureView::new(
            Rc::new(fixtures::peptide(3)),
            &Selection::all(),
        )))
    }

    #[test]
    fn only_cross_residue_polar_pairs() {
        let repr = ContactRepresentation::new();
        let RepresentationSource::Structure(src) = source() else {
            unreachable!()
        };
        let contacts = repr.contacts(&src);
        // N atoms sit 3.8 apart along the chain, beyond the cutoff
        assert_eq!(contacts.count(), 0);
    }

    #[test]
    fn cutoff_is_a_parameter() {
        let mut repr = ContactRepresentation::new();
        repr.params.max_distance = 4.0;
        let buffers = repr.create(&source());
        assert_eq!(buffers.len(), 1);
        assert_eq!(buffers[0].count(), 2);
        assert_eq!(
            buffers[0].picker().map(|p| p.picker_type().as_str()),
            Some("contact")
        );
    }
}
