//! Path of an atom across the frames of a trajectory.

use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::color::{hex, uniform_colors};
use super::{DisplayParams, Representation, RepresentationSource, StructureSource};
use crate::buffer::{Buffer, BufferError, BufferKind};
use crate::data::flatten_vec3;
use crate::params::{ChangeClass, ParamKind, ParamSpec, What};
use crate::picking::Picker;
use crate::representation::ColorScheme;

/// Parameters of the `trajectory` representation.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrajectoryParams {
    /// Shared options.
    #[serde(flatten)]
    pub display: DisplayParams,
    /// Connect consecutive positions with lines.
    pub draw_line: bool,
    /// Connect consecutive positions with cylinders.
    pub draw_cylinder: bool,
    /// Mark each position with a point.
    pub draw_point: bool,
    /// Mark each position with a sphere.
    pub draw_sphere: bool,
    /// Line width in pixels.
    pub linewidth: u32,
    /// Point size in pixels.
    pub point_size: u32,
}

impl Default for TrajectoryParams {
    fn default() -> Self {
        Self {
            display: DisplayParams {
                color_scheme: ColorScheme::Uniform,
                color: hex(0xDD_DDDD),
                ..DisplayParams::default()
            },
            draw_line: true,
            draw_cylinder: false,
            draw_point: false,
            draw_sphere: false,
            linewidth: 1,
            point_size: 1,
        }
    }
}

const PARAMS: &[ParamSpec] = &[
    ParamSpec::new("draw_line", ParamKind::Bool, ChangeClass::Rebuild),
    ParamSpec::new("draw_cylinder", ParamKind::Bool, ChangeClass::Rebuild),
    ParamSpec::new("draw_point", ParamKind::Bool, ChangeClass::Rebuild),
    ParamSpec::new("draw_sphere", ParamKind::Bool, ChangeClass::Rebuild),
    ParamSpec::new(
        "linewidth",
        ParamKind::Integer { min: 1, max: 20 },
        ChangeClass::Rebuild,
    ),
    ParamSpec::new(
        "point_size",
        ParamKind::Integer { min: 1, max: 20 },
        ChangeClass::Rebuild,
    ),
];

const SPHERE_RADIUS: f32 = 0.2;
const CYLINDER_RADIUS: f32 = 0.05;

/// Path of the first selected atom through every frame.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryRepresentation {
    params: TrajectoryParams,
}

impl TrajectoryRepresentation {
    /// Line path representation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn path(&self, source: &StructureSource) -> Vec<Vec3> {
        let Some(trajectory) = source.trajectory.as_ref() else {
            return Vec::new();
        };
        source
            .atoms(&self.params.display.sele)
            .first()
            .map(|&atom| trajectory.path(atom))
            .unwrap_or_default()
    }
}

impl Representation for TrajectoryRepresentation {
    fn type_name(&self) -> &'static str {
        "trajectory"
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        PARAMS
    }

    params_accessors!();

    fn supports(&self, source: &RepresentationSource) -> bool {
        source.structure().is_some_and(|s| s.trajectory.is_some())
    }

    fn create(&self, source: &RepresentationSource) -> Vec<Buffer> {
        let Some(src) = source.structure() else {
            return Vec::new();
        };
        let path = self.path(src);
        if path.is_empty() {
            return Vec::new();
        }
        let p = &self.params;
        let color = p.display.color;
        let params = p.display.buffer_params(path.len());
        let mut buffers = Vec::new();

        if path.len() > 1 {
            let from = flatten_vec3(&path[..path.len() - 1]);
            let to = flatten_vec3(&path[1..]);
            let n = path.len() - 1;
            if p.draw_line {
                buffers.push(
                    Buffer::new(BufferKind::Line, from.clone())
                        .with_attribute("position2", to.clone())
                        .with_attribute("color", uniform_colors(color, n))
                        .with_attribute("linewidth", vec![p.linewidth as f32; n]),
                );
            }
            if p.draw_cylinder {
                buffers.push(
                    Buffer::new(BufferKind::Cylinder, from)
                        .with_attribute("position2", to)
                        .with_attribute("color", uniform_colors(color, n))
                        .with_attribute("radius", vec![CYLINDER_RADIUS; n]),
                );
            }
        }
        let n = path.len();
        if p.draw_point {
            buffers.push(
                Buffer::new(BufferKind::Point, flatten_vec3(&path))
                    .with_attribute("color", uniform_colors(color, n))
                    .with_attribute("size", vec![p.point_size as f32; n]),
            );
        }
        if p.draw_sphere {
            buffers.push(
                Buffer::new(BufferKind::Sphere, flatten_vec3(&path))
                    .with_attribute("color", uniform_colors(color, n))
                    .with_attribute("radius", vec![SPHERE_RADIUS; n]),
            );
        }
        buffers
            .into_iter()
            .map(|b| b.with_picker(Picker::Ignore).with_params(params.clone()))
            .collect()
    }

    fn update(
        &self,
        _source: &RepresentationSource,
        _what: What,
        _buffers: &mut [Buffer],
    ) -> Result<(), BufferError> {
        // Every parameter rebuilds.
        Ok(())
    }
}
