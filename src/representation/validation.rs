//! Clash cylinders from a structure's validation report.

use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::color::{hex, uniform_colors};
use super::{
    set_kind_attribute, DisplayParams, Representation, RepresentationSource, StructureSource,
};
use crate::buffer::{Buffer, BufferError, BufferKind};
use crate::data::flatten_vec3;
use crate::params::{Attribute, ChangeClass, ParamKind, ParamSpec, What};
use crate::picking::Picker;
use crate::representation::ColorScheme;

/// Parameters of the `validation` representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationParams {
    /// Shared options.
    #[serde(flatten)]
    pub display: DisplayParams,
    /// Clash cylinder radius.
    pub radius: f32,
}

impl Default for ValidationParams {
    fn default() -> Self {
        Self {
            display: DisplayParams {
                color_scheme: ColorScheme::Uniform,
                color: hex(0xFF_00FF),
                ..DisplayParams::default()
            },
            radius: 0.15,
        }
    }
}

const PARAMS: &[ParamSpec] = &[ParamSpec::new(
    "radius",
    ParamKind::Number { min: 0.01, max: 2.0 },
    ChangeClass::Update(Attribute::Radius),
)];

/// One cylinder per clash whose two selections resolve to atoms.
#[derive(Debug, Clone, Default)]
pub struct ValidationRepresentation {
    params: ValidationParams,
}

struct ClashGeometry {
    clashes: Vec<usize>,
    start: Vec<Vec3>,
    end: Vec<Vec3>,
}

impl ValidationRepresentation {
    /// Magenta clash cylinders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn geometry(&self, source: &StructureSource) -> Option<ClashGeometry> {
        let validation = source.validation.as_ref()?;
        let structure = source.view.structure();
        let sele = &self.params.display.sele;
        let in_sele = source.atoms(sele);
        let mut g = ClashGeometry {
            clashes: Vec::new(),
            start: Vec::new(),
            end: Vec::new(),
        };
        for (i, clash) in validation.clashes().iter().enumerate() {
            let a1 = source.atoms(&clash.sele1).first().copied();
            let a2 = source.atoms(&clash.sele2).first().copied();
            let (Some(a1), Some(a2)) = (a1, a2) else {
                continue;
            };
            if in_sele.binary_search(&a1).is_err() || in_sele.binary_search(&a2).is_err() {
                continue;
            }
            g.clashes.push(i);
            g.start.push(structure.position(a1));
            g.end.push(structure.position(a2));
        }
        Some(g)
    }
}

impl Representation for ValidationRepresentation {
    fn type_name(&self) -> &'static str {
        "validation"
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        PARAMS
    }

    params_accessors!();

    fn supports(&self, source: &RepresentationSource) -> bool {
        source.structure().is_some_and(|s| s.validation.is_some())
    }

    fn create(&self, source: &RepresentationSource) -> Vec<Buffer> {
        let Some(src) = source.structure() else {
            return Vec::new();
        };
        let (Some(g), Some(validation)) = (self.geometry(src), src.validation.as_ref()) else {
            return Vec::new();
        };
        let n = g.clashes.len();
        if n == 0 {
            return Vec::new();
        }
        let structure = src.view.structure();
        vec![Buffer::new(BufferKind::Cylinder, flatten_vec3(&g.start))
            .with_attribute("position2", flatten_vec3(&g.end))
            .with_attribute("color", uniform_colors(self.params.display.color, n))
            .with_attribute("radius", vec![self.params.radius; n])
            .with_picker(Picker::Clash {
                structure: Rc::clone(structure),
                validation: Rc::clone(validation),
                array: Some(g.clashes),
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
        let Some(g) = source.structure().and_then(|s| self.geometry(s)) else {
            return Ok(());
        };
        let n = g.clashes.len();
        if what.position {
            set_kind_attribute(buffers, BufferKind::Cylinder, "position", &flatten_vec3(&g.start))?;
            set_kind_attribute(buffers, BufferKind::Cylinder, "position2", &flatten_vec3(&g.end))?;
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
