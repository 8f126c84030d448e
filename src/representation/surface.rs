//! Surface meshes and volume dot clouds.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::color::uniform_colors;
use super::{set_kind_attribute, DisplayParams, Representation, RepresentationSource};
use crate::buffer::{Buffer, BufferError, BufferKind};
use crate::data::{flatten_vec3, Volume};
use crate::params::{Attribute, ChangeClass, ParamKind, ParamSpec, What};
use crate::picking::Picker;

/// Parameters of the `surface` representation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SurfaceParams {
    /// Shared options.
    #[serde(flatten)]
    pub display: DisplayParams,
}

/// Triangulated surface drawn as a mesh.
#[derive(Debug, Clone, Default)]
pub struct SurfaceRepresentation {
    params: SurfaceParams,
}

impl SurfaceRepresentation {
    /// Plain mesh representation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Representation for SurfaceRepresentation {
    fn type_name(&self) -> &'static str {
        "surface"
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        &[]
    }

    params_accessors!();

    fn supports(&self, source: &RepresentationSource) -> bool {
        matches!(source, RepresentationSource::Surface(_))
    }

    fn create(&self, source: &RepresentationSource) -> Vec<Buffer> {
        let RepresentationSource::Surface(surface) = source else {
            return Vec::new();
        };
        let n = surface.vertex_count();
        if n == 0 {
            return Vec::new();
        }
        let d = &self.params.display;
        vec![Buffer::new(BufferKind::Mesh, surface.position().to_vec())
            .with_attribute("color", uniform_colors(d.color, n))
            .with_index(surface.index().to_vec())
            .with_picker(Picker::Surface {
                surface: Rc::clone(surface),
                array: None,
            })
            .with_params(d.buffer_params(n))]
    }

    fn update(
        &self,
        source: &RepresentationSource,
        what: What,
        buffers: &mut [Buffer],
    ) -> Result<(), BufferError> {
        let RepresentationSource::Surface(surface) = source else {
            return Ok(());
        };
        if what.position {
            set_kind_attribute(buffers, BufferKind::Mesh, "position", surface.position())?;
        }
        if what.color {
            let colors = uniform_colors(self.params.display.color, surface.vertex_count());
            set_kind_attribute(buffers, BufferKind::Mesh, "color", &colors)?;
        }
        Ok(())
    }
}

/// How `threshold_min` / `threshold_max` are interpreted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdType {
    /// Raw data values.
    Value,
    /// Multiples of the data RMS above the mean.
    Sigma,
}

impl ThresholdType {
    /// Serialized names.
    pub const ALL: [&'static str; 2] = ["value", "sigma"];

    /// Convert a threshold to a raw data value.
    #[must_use]
    pub fn resolve(self, volume: &Volume, threshold: f32) -> f32 {
        match self {
            Self::Value => threshold,
            Self::Sigma => volume.value_for_sigma(threshold),
        }
    }
}

/// Parameters of the `dot` representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DotParams {
    /// Shared options.
    #[serde(flatten)]
    pub display: DisplayParams,
    /// Threshold interpretation.
    pub threshold_type: ThresholdType,
    /// Lowest drawn value.
    pub threshold_min: f32,
    /// Highest drawn value.
    pub threshold_max: f32,
    /// Dot radius.
    pub dot_radius: f32,
}

impl Default for DotParams {
    fn default() -> Self {
        Self {
            display: DisplayParams::default(),
            threshold_type: ThresholdType::Sigma,
            threshold_min: 2.0,
            threshold_max: f32::MAX,
            dot_radius: 0.1,
        }
    }
}

const VALUE_RANGE: ParamKind = ParamKind::Number {
    min: -(f32::MAX as f64),
    max: f32::MAX as f64,
};

const DOT_PARAMS: &[ParamSpec] = &[
    ParamSpec::new(
        "threshold_type",
        ParamKind::Select(&ThresholdType::ALL),
        ChangeClass::Rebuild,
    ),
    ParamSpec::new(
        "threshold_min",
        VALUE_RANGE,
        ChangeClass::Rebuild,
    ),
    ParamSpec::new(
        "threshold_max",
        VALUE_RANGE,
        ChangeClass::Rebuild,
    ),
    ParamSpec::new(
        "dot_radius",
        ParamKind::Number { min: 0.01, max: 5.0 },
        ChangeClass::Update(Attribute::Radius),
    ),
];

/// Volume voxels within a threshold range drawn as points.
#[derive(Debug, Clone, Default)]
pub struct DotRepresentation {
    params: DotParams,
}

impl DotRepresentation {
    /// Dots at 2 sigma and above.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn voxels(&self, volume: &Volume) -> Vec<usize> {
        let p = &self.params;
        let min = p.threshold_type.resolve(volume, p.threshold_min);
        let max = p.threshold_type.resolve(volume, p.threshold_max);
        (0..volume.voxel_count())
            .filter(|&i| (min..=max).contains(&volume.value(i)))
            .collect()
    }
}

impl Representation for DotRepresentation {
    fn type_name(&self) -> &'static str {
        "dot"
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        DOT_PARAMS
    }

    params_accessors!();

    fn supports(&self, source: &RepresentationSource) -> bool {
        matches!(source, RepresentationSource::Volume(_))
    }

    fn create(&self, source: &RepresentationSource) -> Vec<Buffer> {
        let RepresentationSource::Volume(volume) = source else {
            return Vec::new();
        };
        let voxels = self.voxels(volume);
        if voxels.is_empty() {
            return Vec::new();
        }
        let n = voxels.len();
        let positions: Vec<_> = voxels.iter().map(|&i| volume.position(i)).collect();
        let d = &self.params.display;
        vec![Buffer::new(BufferKind::Sphere, flatten_vec3(&positions))
            .with_attribute("color", uniform_colors(d.color, n))
            .with_attribute("radius", vec![self.params.dot_radius; n])
            .with_picker(Picker::Volume {
                volume: Rc::clone(volume),
                array: Some(voxels),
            })
            .with_params(d.buffer_params(volume.voxel_count()))]
    }

    fn update(
        &self,
        source: &RepresentationSource,
        what: What,
        buffers: &mut [Buffer],
    ) -> Result<(), BufferError> {
        let RepresentationSource::Volume(volume) = source else {
            return Ok(());
        };
        let n = self.voxels(volume).len();
        if what.color {
            let colors = uniform_colors(self.params.display.color, n);
            set_kind_attribute(buffers, BufferKind::Sphere, "color", &colors)?;
        }
        if what.radius {
            let radii = vec![self.params.dot_radius; n];
            set_kind_attribute(buffers, BufferKind::Sphere, "radius", &radii)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    #[test]
    fn surface_mesh_uses_surface_picker() {
        let src = RepresentationSource::Surface(Rc::new(fixtures::surface()));
        let repr = SurfaceRepresentation::new();
        assert!(repr.supports(&src));
        let buffers = repr.create(&src);
        assert_eq!(buffers.len(), 1);
        assert_eq!(buffers[0].index(), Some(&[0, 1, 2][..]));
        assert_eq!(
            buffers[0].picker().map(|p| p.picker_type().as_str()),
            Some("surface")
        );
    }

    #[test]
    fn dots_respect_value_thresholds() {
        let src = RepresentationSource::Volume(Rc::new(fixtures::volume()));
        let mut repr = DotRepresentation::new();
        repr.params.threshold_type = ThresholdType::Value;
        repr.params.threshold_min = 20.0;
        let buffers = repr.create(&src);
        // values 20, 21, 22, 23
        assert_eq!(buffers[0].count(), 4);
        assert_eq!(buffers[0].picker().map(|p| p.index(0)), Some(20));
    }

    #[test]
    fn dots_need_a_volume() {
        let src = RepresentationSource::Surface(Rc::new(fixtures::surface()));
        assert!(!DotRepresentation::new().supports(&src));
        assert!(DotRepresentation::new().create(&src).is_empty());
    }
}
