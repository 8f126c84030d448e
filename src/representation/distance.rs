//! Distance measurements between atom pairs.
//!
//! Each `[sele1, sele2]` pair resolves both selections to their first
//! atom. Pairs where either side selects nothing are dropped. Every kept
//! pair gets a cylinder and a text label with the distance in angstroms.

use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::color::{uniform_colors, Colormaker};
use super::{DisplayParams, Representation, RepresentationSource, StructureSource};
use crate::buffer::{Buffer, BufferError, BufferKind};
use crate::data::{flatten_vec3, BondStore};
use crate::params::{Attribute, ChangeClass, ParamKind, ParamSpec, What};
use crate::picking::Picker;
use crate::representation::{set_kind_attribute, ColorScheme};

/// Parameters of the `distance` representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DistanceParams {
    /// Shared options.
    #[serde(flatten)]
    pub display: DisplayParams,
    /// Selection pairs to measure.
    pub atom_pair: Vec<[String; 2]>,
    /// Cylinder radius.
    pub radius: f32,
    /// Label size.
    pub label_size: f32,
    /// RGB label color.
    pub label_color: [f32; 3],
    /// Show the labels.
    pub label_visible: bool,
    /// Label offset towards the camera.
    pub label_z_offset: f32,
}

impl Default for DistanceParams {
    fn default() -> Self {
        Self {
            display: DisplayParams {
                color_scheme: ColorScheme::Uniform,
                ..DisplayParams::default()
            },
            atom_pair: Vec::new(),
            radius: 0.15,
            label_size: 2.0,
            label_color: [1.0, 1.0, 1.0],
            label_visible: true,
            label_z_offset: 0.5,
        }
    }
}

const PARAMS: &[ParamSpec] = &[
    ParamSpec::new("atom_pair", ParamKind::Pairs, ChangeClass::Rebuild),
    ParamSpec::new(
        "radius",
        ParamKind::Number { min: 0.01, max: 2.0 },
        ChangeClass::Update(Attribute::Radius),
    ),
    ParamSpec::new(
        "label_size",
        ParamKind::Number { min: 0.1, max: 20.0 },
        ChangeClass::Update(Attribute::Labels),
    ),
    ParamSpec::new(
        "label_color",
        ParamKind::Color,
        ChangeClass::Update(Attribute::Labels),
    ),
    ParamSpec::new("label_visible", ParamKind::Bool, ChangeClass::Visibility),
    ParamSpec::new(
        "label_z_offset",
        ParamKind::Number { min: -20.0, max: 20.0 },
        ChangeClass::Buffer,
    ),
];

/// Cylinders and labels between atom pairs.
#[derive(Debug, Clone, Default)]
pub struct DistanceRepresentation {
    params: DistanceParams,
}

impl DistanceRepresentation {
    /// Representation without pairs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved atom pairs.
    fn pairs(&self, source: &StructureSource) -> BondStore {
        let mut store = BondStore::new();
        for [sele1, sele2] in &self.params.atom_pair {
            match (source.atoms(sele1).first(), source.atoms(sele2).first()) {
                (Some(&a1), Some(&a2)) => store.add_bond(a1, a2, 1),
                _ => log::debug!("distance: pair '{sele1}' / '{sele2}' selects nothing, skipped"),
            }
        }
        store
    }

    fn ends(source: &StructureSource, pairs: &BondStore) -> (Vec<Vec3>, Vec<Vec3>) {
        let structure = source.view.structure();
        (0..pairs.count())
            .map(|i| {
                let (a1, a2) = pairs.atoms(i);
                (structure.position(a1), structure.position(a2))
            })
            .unzip()
    }

    fn labels(p1: &[Vec3], p2: &[Vec3]) -> Vec<String> {
        p1.iter()
            .zip(p2)
            .map(|(a, b)| format!("{:.2}", a.distance(*b)))
            .collect()
    }

    fn midpoints(p1: &[Vec3], p2: &[Vec3]) -> Vec<f32> {
        let mid: Vec<Vec3> = p1.iter().zip(p2).map(|(a, b)| (*a + *b) * 0.5).collect();
        flatten_vec3(&mid)
    }

    fn colors(&self, source: &StructureSource, pairs: &BondStore) -> (Vec<f32>, Vec<f32>) {
        let structure = source.view.structure();
        let d = &self.params.display;
        let colormaker = Colormaker::new(d.color_scheme, d.color, structure);
        let mut c1 = Vec::with_capacity(pairs.count() * 3);
        let mut c2 = Vec::with_capacity(pairs.count() * 3);
        for i in 0..pairs.count() {
            let (a1, a2) = pairs.atoms(i);
            c1.extend(colormaker.atom_color(structure, a1));
            c2.extend(colormaker.atom_color(structure, a2));
        }
        (c1, c2)
    }
}

impl Representation for DistanceRepresentation {
    fn type_name(&self) -> &'static str {
        "distance"
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
        let pairs = self.pairs(src);
        let n = pairs.count();
        if n == 0 {
            return Vec::new();
        }
        let structure = src.view.structure();
        let (p1, p2) = Self::ends(src, &pairs);
        let (c1, c2) = self.colors(src, &pairs);
        let p = &self.params;
        let mut params = p.display.buffer_params(src.view.atom_count());

        let cylinders = Buffer::new(BufferKind::Cylinder, flatten_vec3(&p1))
            .with_attribute("position2", flatten_vec3(&p2))
            .with_attribute("color", c1)
            .with_attribute("color2", c2)
            .with_attribute("radius", vec![p.radius; n])
            .with_picker(Picker::Distance {
                structure: Rc::clone(structure),
                pairs: Rc::new(pairs),
                array: None,
            })
            .with_instances(structure.instances().to_vec())
            .with_params(params.clone());

        params.z_offset = p.label_z_offset;
        let mut text = Buffer::new(BufferKind::Text, Self::midpoints(&p1, &p2))
            .with_attribute("color", uniform_colors(p.label_color, n))
            .with_attribute("size", vec![p.label_size; n])
            .with_labels(Self::labels(&p1, &p2))
            .with_instances(structure.instances().to_vec())
            .with_params(params);
        text.set_visibility(p.label_visible);

        vec![text, cylinders]
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
        let pairs = self.pairs(src);
        let n = pairs.count();
        let p = &self.params;
        if what.position {
            let (p1, p2) = Self::ends(src, &pairs);
            set_kind_attribute(buffers, BufferKind::Cylinder, "position", &flatten_vec3(&p1))?;
            set_kind_attribute(buffers, BufferKind::Cylinder, "position2", &flatten_vec3(&p2))?;
            set_kind_attribute(buffers, BufferKind::Text, "position", &Self::midpoints(&p1, &p2))?;
            for b in buffers.iter_mut().filter(|b| b.kind() == BufferKind::Text) {
                b.set_labels(Self::labels(&p1, &p2))?;
            }
        }
        if what.color {
            let (c1, c2) = self.colors(src, &pairs);
            set_kind_attribute(buffers, BufferKind::Cylinder, "color", &c1)?;
            set_kind_attribute(buffers, BufferKind::Cylinder, "color2", &c2)?;
        }
        if what.radius {
            set_kind_attribute(buffers, BufferKind::Cylinder, "radius", &vec![p.radius; n])?;
        }
        if what.labels {
            let colors = uniform_colors(p.label_color, n);
            set_kind_attribute(buffers, BufferKind::Text, "color", &colors)?;
            set_kind_attribute(buffers, BufferKind::Text, "size", &vec![p.label_size; n])?;
        }
        Ok(())
    }

    fn apply_buffer_params(&self, buffer: &mut Buffer) {
        let d = &self.params.display;
        let is_text = buffer.kind() == BufferKind::Text;
        let params = buffer.params_mut();
        params.opacity = d.opacity;
        params.wireframe = d.wireframe;
        if is_text {
            params.z_offset = self.params.label_z_offset;
        }
    }

    fn buffer_visible(&self, buffer: &Buffer) -> bool {
        buffer.kind() != BufferKind::Text || self.params.label_visible
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::{fixtures, Selection, StructureView};

    fn source() -> RepresentationSource {
        RepresentationSource::Structure(StructureSource::new(StructureView::new(
            Rc::new(fixtures::peptide(5)),
            &Selection::all(),
        )))
    }

    fn with_pairs(pairs: serde_json::Value) -> DistanceRepresentation {
        let mut repr = DistanceRepresentation::new();
        let patch = json!({ "atom_pair": pairs });
        repr.merge_parameters(patch.as_object().unwrap()).unwrap();
        repr
    }

    #[test]
    fn pair_gives_label_and_cylinder() {
        let repr = with_pairs(json!([["1.CA", "4.CA"]]));
        let buffers = repr.create(&source());
        assert_eq!(buffers.len(), 2);
        let text = &buffers[0];
        assert_eq!(text.kind(), BufferKind::Text);
        let d = 3.0 * fixtures::CA_SPACING;
        assert_eq!(text.labels(), [format!("{d:.2}")]);
        assert_eq!(buffers[1].count(), 1);
        assert_eq!(
            buffers[1].picker().map(|p| p.picker_type().as_str()),
            Some("distance")
        );
    }

    #[test]
    fn missing_atom_skips_pair() {
        let repr = with_pairs(json!([["99.CA", "1.CA"]]));
        assert!(repr.create(&source()).is_empty());
        let repr = with_pairs(json!([["99.CA", "1.CA"], ["1.CA", "2.CA"]]));
        assert_eq!(repr.create(&source())[0].count(), 1);
    }

    #[test]
    fn label_update_keeps_topology() {
        let src = source();
        let mut repr = with_pairs(json!([["1.CA", "2.CA"], ["2.CA", "3.CA"]]));
        let mut buffers = repr.create(&src);
        repr.params.label_size = 4.0;
        let what = What {
            labels: true,
            ..What::default()
        };
        repr.update(&src, what, &mut buffers).unwrap();
        assert_eq!(buffers[0].attribute("size"), Some(&[4.0, 4.0][..]));
    }

    #[test]
    fn hidden_labels_are_not_drawn() {
        let mut repr = with_pairs(json!([["1.CA", "2.CA"]]));
        repr.params.label_visible = false;
        let buffers = repr.create(&source());
        assert!(!repr.buffer_visible(&buffers[0]));
        assert!(repr.buffer_visible(&buffers[1]));
        assert!(!buffers[0].visible());
    }
}
