//! Axis-aligned image slices through a volume.
//!
//! The slice plane sits at `position` percent along `dimension`. Every
//! pixel of the plane is one primitive of an image buffer, so pick ids map
//! straight back to voxels. Pixels outside the threshold range are fully
//! transparent.

use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::color::ColorRamp;
use super::surface::ThresholdType;
use super::{DisplayParams, Representation, RepresentationSource};
use crate::buffer::{Buffer, BufferError, BufferKind};
use crate::data::{flatten_vec3, Volume};
use crate::params::{ChangeClass, ParamKind, ParamSpec, What};
use crate::picking::Picker;

/// Volume axis the slice is perpendicular to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Plane of constant x.
    X,
    /// Plane of constant y.
    Y,
    /// Plane of constant z.
    Z,
}

impl Dimension {
    const ALL: [&'static str; 3] = ["x", "y", "z"];
}

/// Image texture filters.
pub const FILTERS: [&str; 5] = [
    "nearest",
    "linear",
    "cubic-bspline",
    "cubic-catmulrom",
    "cubic-mitchell",
];

/// Parameters of the `slice` representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SliceParams {
    /// Shared options.
    #[serde(flatten)]
    pub display: DisplayParams,
    /// Axis of the plane.
    pub dimension: Dimension,
    /// Plane position, 1 to 100 percent.
    pub position: f32,
    /// Texture filter.
    pub filter: String,
    /// Threshold interpretation.
    pub threshold_type: ThresholdType,
    /// Pixels at or below this are transparent.
    pub threshold_min: f32,
    /// Pixels at or above this are transparent.
    pub threshold_max: f32,
}

impl Default for SliceParams {
    fn default() -> Self {
        Self {
            display: DisplayParams::default(),
            dimension: Dimension::X,
            position: 30.0,
            filter: "cubic-bspline".to_owned(),
            threshold_type: ThresholdType::Sigma,
            threshold_min: -f32::MAX,
            threshold_max: f32::MAX,
        }
    }
}

const VALUE_RANGE: ParamKind = ParamKind::Number {
    min: -(f32::MAX as f64),
    max: f32::MAX as f64,
};

const PARAMS: &[ParamSpec] = &[
    ParamSpec::new("dimension", ParamKind::Select(&Dimension::ALL), ChangeClass::Rebuild),
    ParamSpec::new(
        "position",
        ParamKind::Number { min: 1.0, max: 100.0 },
        ChangeClass::Rebuild,
    ),
    ParamSpec::new("filter", ParamKind::Select(&FILTERS), ChangeClass::Buffer),
    ParamSpec::new(
        "threshold_type",
        ParamKind::Select(&ThresholdType::ALL),
        ChangeClass::Rebuild,
    ),
    ParamSpec::new("threshold_min", VALUE_RANGE, ChangeClass::Rebuild),
    ParamSpec::new("threshold_max", VALUE_RANGE, ChangeClass::Rebuild),
];

/// Pixels of one slice: voxel index, pixel center and RGBA color.
#[derive(Debug, Default)]
struct SliceImage {
    voxels: Vec<usize>,
    centers: Vec<Vec3>,
    rgba: Vec<f32>,
    corners: Vec<Vec3>,
    width: usize,
    height: usize,
}

/// Image slice through a volume.
#[derive(Debug, Clone, Default)]
pub struct SliceRepresentation {
    params: SliceParams,
}

/// Plane index for `position` percent along an axis with `len` samples.
fn plane_index(len: usize, position: f32) -> usize {
    let i = ((len as f32 / 100.0) * (position - 1.0)).round() as usize;
    i.min(len.saturating_sub(1))
}

impl SliceRepresentation {
    /// Slice at 30% along x.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn image(&self, v: &Volume) -> SliceImage {
        let p = &self.params;
        let (nx, ny, nz) = v.dimensions();
        if nx * ny * nz == 0 {
            return SliceImage::default();
        }
        let (lx, ly, lz) = (nx - 1, ny - 1, nz - 1);
        let (xs, ys, zs, width, height, corners) = match p.dimension {
            Dimension::X => {
                let x = plane_index(nx, p.position);
                let corners = [(x, 0, 0), (x, ly, 0), (x, 0, lz), (x, ly, lz)];
                (x..x + 1, 0..ny, 0..nz, nz, ny, corners)
            }
            Dimension::Y => {
                let y = plane_index(ny, p.position);
                let corners = [(0, y, 0), (lx, y, 0), (0, y, lz), (lx, y, lz)];
                (0..nx, y..y + 1, 0..nz, nz, nx, corners)
            }
            Dimension::Z => {
                let z = plane_index(nz, p.position);
                let corners = [(0, 0, z), (0, ly, z), (lx, 0, z), (lx, ly, z)];
                (0..nx, 0..ny, z..z + 1, nx, ny, corners)
            }
        };

        let min = p.threshold_type.resolve(v, p.threshold_min);
        let max = p.threshold_type.resolve(v, p.threshold_max);
        let (lo, hi) = (v.data_min(), v.data_max());
        let span = if hi > lo { hi - lo } else { 1.0 };
        let ramp = ColorRamp::default();

        let mut image = SliceImage {
            corners: corners
                .iter()
                .map(|&(x, y, z)| v.grid_position(x, y, z))
                .collect(),
            width,
            height,
            ..SliceImage::default()
        };
        for iy in ys {
            for ix in xs.clone() {
                for iz in zs.clone() {
                    let idx = v.index(ix, iy, iz);
                    let value = v.value(idx);
                    let alpha = if value > min && value < max { 1.0 } else { 0.0 };
                    image.rgba.extend(ramp.sample((value - lo) / span));
                    image.rgba.push(alpha);
                    image.centers.push(v.grid_position(ix, iy, iz));
                    image.voxels.push(idx);
                }
            }
        }
        image
    }
}

impl Representation for SliceRepresentation {
    fn type_name(&self) -> &'static str {
        "slice"
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        PARAMS
    }

    params_accessors!();

    fn supports(&self, source: &RepresentationSource) -> bool {
        matches!(source, RepresentationSource::Volume(_))
    }

    fn create(&self, source: &RepresentationSource) -> Vec<Buffer> {
        let RepresentationSource::Volume(volume) = source else {
            return Vec::new();
        };
        let image = self.image(volume);
        if image.voxels.is_empty() {
            return Vec::new();
        }
        let mut params = self.params.display.buffer_params(volume.voxel_count());
        params.filter.clone_from(&self.params.filter);
        vec![Buffer::new(BufferKind::Image, flatten_vec3(&image.centers))
            .with_attribute("color", image.rgba)
            .with_attribute("corners", flatten_vec3(&image.corners))
            .with_attribute("size", vec![image.width as f32, image.height as f32])
            .with_picker(Picker::Slice {
                volume: Rc::clone(volume),
                array: Some(image.voxels),
            })
            .with_params(params)]
    }

    fn update(
        &self,
        _source: &RepresentationSource,
        _what: What,
        _buffers: &mut [Buffer],
    ) -> Result<(), BufferError> {
        // Colors come from the data values; nothing updates in place.
        Ok(())
    }

    fn apply_buffer_params(&self, buffer: &mut Buffer) {
        let params = buffer.params_mut();
        params.opacity = self.params.display.opacity;
        params.filter.clone_from(&self.params.filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    fn source() -> RepresentationSource {
        RepresentationSource::Volume(Rc::new(fixtures::volume()))
    }

    #[test]
    fn plane_index_is_clamped() {
        assert_eq!(plane_index(4, 1.0), 0);
        assert_eq!(plane_index(4, 30.0), 1);
        assert_eq!(plane_index(4, 100.0), 3);
    }

    #[test]
    fn x_slice_covers_the_yz_plane() {
        let buffers = SliceRepresentation::new().create(&source());
        assert_eq!(buffers.len(), 1);
        let b = &buffers[0];
        assert_eq!(b.kind(), BufferKind::Image);
        // 4x3x2 grid: a constant-x plane has 3 * 2 pixels
        assert_eq!(b.count(), 6);
        assert_eq!(b.attribute("size"), Some(&[2.0, 3.0][..]));
        assert_eq!(b.params().filter, "cubic-bspline");
        // position 30 on nx = 4 is plane x = 1
        assert_eq!(b.picker().map(|p| p.index(0)), Some(1));
    }

    #[test]
    fn thresholds_hide_pixels() {
        let mut repr = SliceRepresentation::new();
        repr.params.dimension = Dimension::Z;
        repr.params.position = 1.0;
        repr.params.threshold_type = ThresholdType::Value;
        repr.params.threshold_min = 5.0;
        let buffers = repr.create(&source());
        let alpha: Vec<f32> = buffers[0]
            .attribute("color")
            .map(|c| c.chunks(4).map(|px| px[3]).collect())
            .unwrap_or_default();
        // z = 0 plane holds values 0..12, pixels above 5 stay opaque
        assert_eq!(alpha.iter().filter(|&&a| a == 1.0).count(), 6);
    }
}
