//! User-defined geometric primitives stored as flat parallel arrays.

use glam::Vec3;

use super::{bounds, mean_vec3, vec3_at};

/// Parallel arrays for two-point primitives (cylinders, cones, arrows).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentArrays {
    /// Start points, `3 * n` floats.
    pub position1: Vec<f32>,
    /// End points, `3 * n` floats.
    pub position2: Vec<f32>,
    /// RGB colors, `3 * n` floats.
    pub color: Vec<f32>,
    /// Radii, `n` floats.
    pub radius: Vec<f32>,
    /// Names, `n` entries.
    pub name: Vec<String>,
}

impl SegmentArrays {
    fn push(&mut self, p1: Vec3, p2: Vec3, color: Vec3, radius: f32, name: &str) {
        self.position1.extend_from_slice(&p1.to_array());
        self.position2.extend_from_slice(&p2.to_array());
        self.color.extend_from_slice(&color.to_array());
        self.radius.push(radius);
        self.name.push(name.to_owned());
    }

    /// Number of primitives.
    #[must_use]
    pub fn count(&self) -> usize {
        self.radius.len()
    }

    /// Mean of the two endpoints of primitive `index`.
    #[must_use]
    pub fn midpoint(&self, index: usize) -> Vec3 {
        (vec3_at(&self.position1, index) + vec3_at(&self.position2, index)) * 0.5
    }
}

/// Parallel arrays for spheres.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SphereArrays {
    /// Centers, `3 * n` floats.
    pub position: Vec<f32>,
    /// RGB colors, `3 * n` floats.
    pub color: Vec<f32>,
    /// Radii, `n` floats.
    pub radius: Vec<f32>,
    /// Names, `n` entries.
    pub name: Vec<String>,
}

/// Parallel arrays for ellipsoids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EllipsoidArrays {
    /// Centers, `3 * n` floats.
    pub position: Vec<f32>,
    /// RGB colors, `3 * n` floats.
    pub color: Vec<f32>,
    /// Radii, `n` floats.
    pub radius: Vec<f32>,
    /// Major axes, `3 * n` floats.
    pub major_axis: Vec<f32>,
    /// Minor axes, `3 * n` floats.
    pub minor_axis: Vec<f32>,
    /// Names, `n` entries.
    pub name: Vec<String>,
}

/// A free-form triangle mesh inside a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMesh {
    /// Vertex positions, `3 * n` floats.
    pub position: Vec<f32>,
    /// Vertex colors, `3 * n` floats.
    pub color: Vec<f32>,
    /// Triangle indices.
    pub index: Vec<u32>,
    /// Mesh name.
    pub name: String,
    /// Serial number within the shape.
    pub serial: usize,
}

/// A collection of primitives added programmatically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    name: String,
    /// Sphere primitives.
    pub spheres: SphereArrays,
    /// Cylinder primitives.
    pub cylinders: SegmentArrays,
    /// Cone primitives.
    pub cones: SegmentArrays,
    /// Arrow primitives.
    pub arrows: SegmentArrays,
    /// Ellipsoid primitives.
    pub ellipsoids: EllipsoidArrays,
    /// Triangle meshes.
    pub meshes: Vec<ShapeMesh>,
}

impl Shape {
    /// Empty shape.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Shape name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a sphere.
    pub fn add_sphere(&mut self, position: Vec3, color: Vec3, radius: f32, name: &str) {
        let s = &mut self.spheres;
        s.position.extend_from_slice(&position.to_array());
        s.color.extend_from_slice(&color.to_array());
        s.radius.push(radius);
        s.name.push(name.to_owned());
    }

    /// Add a cylinder between two points.
    pub fn add_cylinder(&mut self, p1: Vec3, p2: Vec3, color: Vec3, radius: f32, name: &str) {
        self.cylinders.push(p1, p2, color, radius, name);
    }

    /// Add a cone from base `p1` to tip `p2`.
    pub fn add_cone(&mut self, p1: Vec3, p2: Vec3, color: Vec3, radius: f32, name: &str) {
        self.cones.push(p1, p2, color, radius, name);
    }

    /// Add an arrow from `p1` to `p2`.
    pub fn add_arrow(&mut self, p1: Vec3, p2: Vec3, color: Vec3, radius: f32, name: &str) {
        self.arrows.push(p1, p2, color, radius, name);
    }

    /// Add an ellipsoid.
    pub fn add_ellipsoid(
        &mut self,
        position: Vec3,
        color: Vec3,
        radius: f32,
        major_axis: Vec3,
        minor_axis: Vec3,
        name: &str,
    ) {
        let e = &mut self.ellipsoids;
        e.position.extend_from_slice(&position.to_array());
        e.color.extend_from_slice(&color.to_array());
        e.radius.push(radius);
        e.major_axis.extend_from_slice(&major_axis.to_array());
        e.minor_axis.extend_from_slice(&minor_axis.to_array());
        e.name.push(name.to_owned());
    }

    /// Add a triangle mesh.
    pub fn add_mesh(&mut self, position: Vec<f32>, color: Vec<f32>, index: Vec<u32>, name: &str) {
        let serial = self.meshes.len();
        self.meshes.push(ShapeMesh {
            position,
            color,
            index,
            name: name.to_owned(),
            serial,
        });
    }

    /// Mean vertex position of mesh `mesh`.
    #[must_use]
    pub fn mesh_center(&self, mesh: usize) -> Vec3 {
        mean_vec3(&self.meshes[mesh].position)
    }

    /// Bounding-box center over every primitive anchor point.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        let flat = [
            &self.spheres.position,
            &self.cylinders.position1,
            &self.cylinders.position2,
            &self.cones.position1,
            &self.cones.position2,
            &self.arrows.position1,
            &self.arrows.position2,
            &self.ellipsoids.position,
        ];
        let points = flat
            .into_iter()
            .chain(self.meshes.iter().map(|m| &m.position))
            .flat_map(|a| (0..a.len() / 3).map(move |i| vec3_at(a, i)));
        bounds(points).map_or(Vec3::ZERO, |(min, max)| (min + max) * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    #[test]
    fn segment_midpoint() {
        let s = fixtures::shape();
        assert_eq!(s.cylinders.midpoint(0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(s.arrows.midpoint(0), Vec3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn mesh_serials_follow_insertion() {
        let mut s = fixtures::shape();
        s.add_mesh(vec![1.0, 1.0, 1.0], vec![0.0; 3], vec![0], "point");
        assert_eq!(s.meshes[1].serial, 1);
        assert_eq!(s.mesh_center(1), Vec3::ONE);
    }
}
