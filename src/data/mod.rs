//! Data objects the stage wraps in components.
//!
//! Parsers are external; these types are the columnar stores they produce.
//! Everything here is immutable once shared: components hold `Rc`s, and a
//! coordinate change (trajectory frame, superposition) swaps in a new
//! `Rc` rather than mutating the old one, so pickers built from the previous
//! data keep a consistent snapshot.

mod selection;
mod shape;
mod structure;
mod surface;
mod trajectory;
mod validation;
mod volume;

#[cfg(test)]
pub(crate) mod fixtures;

use glam::{Mat4, Vec3};
pub use selection::Selection;
pub use shape::{EllipsoidArrays, SegmentArrays, Shape, ShapeMesh, SphereArrays};
pub use structure::{
    AtomProxy, AtomRecord, BondProxy, BondStore, Structure, StructureBuilder,
    StructureView,
};
pub use surface::Surface;
pub use trajectory::Trajectory;
pub use validation::{Clash, Validation};
pub use volume::Volume;

/// One rendered copy of an object (crystallographic mate, assembly unit).
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// Instance index within its assembly.
    pub id: u32,
    /// Display name of the instance.
    pub name: String,
    /// Local-to-assembly transform.
    pub matrix: Mat4,
}

impl Instance {
    /// Instance with an identity transform.
    #[must_use]
    pub fn identity(id: u32) -> Self {
        Self {
            id,
            name: id.to_string(),
            matrix: Mat4::IDENTITY,
        }
    }
}

/// Read a `Vec3` from a flat `[x0, y0, z0, x1, ...]` array.
#[must_use]
pub fn vec3_at(array: &[f32], index: usize) -> Vec3 {
    let i = index * 3;
    Vec3::new(array[i], array[i + 1], array[i + 2])
}

/// Flatten points into an `[x0, y0, z0, x1, ...]` array.
#[must_use]
pub fn flatten_vec3(points: &[Vec3]) -> Vec<f32> {
    points.iter().flat_map(|p| p.to_array()).collect()
}

/// Arithmetic mean of a flat position array. `Vec3::ZERO` when empty.
#[must_use]
pub fn mean_vec3(array: &[f32]) -> Vec3 {
    let n = array.len() / 3;
    if n == 0 {
        return Vec3::ZERO;
    }
    let sum = (0..n).fold(Vec3::ZERO, |acc, i| acc + vec3_at(array, i));
    sum / n as f32
}

/// Axis-aligned bounds of a set of points, `None` when empty.
#[must_use]
pub fn bounds(points: impl IntoIterator<Item = Vec3>) -> Option<(Vec3, Vec3)> {
    points.into_iter().fold(None, |acc, p| match acc {
        None => Some((p, p)),
        Some((min, max)) => Some((min.min(p), max.max(p))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_array_helpers_agree() {
        let pts = [Vec3::new(1.0, 2.0, 3.0), Vec3::new(3.0, 4.0, 5.0)];
        let flat = flatten_vec3(&pts);
        assert_eq!(vec3_at(&flat, 1), pts[1]);
        assert_eq!(mean_vec3(&flat), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(mean_vec3(&[]), Vec3::ZERO);
    }

    #[test]
    fn bounds_of_points() {
        let b = bounds([Vec3::new(1.0, -1.0, 0.0), Vec3::new(-2.0, 3.0, 1.0)]);
        assert_eq!(
            b,
            Some((Vec3::new(-2.0, -1.0, 0.0), Vec3::new(1.0, 3.0, 1.0)))
        );
        assert_eq!(bounds(std::iter::empty()), None);
    }
}
