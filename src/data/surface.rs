use glam::Vec3;

use super::{bounds, vec3_at};

/// A triangulated molecular surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    name: String,
    position: Vec<f32>,
    index: Vec<u32>,
}

impl Surface {
    /// Surface from flat vertex positions and triangle indices.
    #[must_use]
    pub fn new(name: &str, position: Vec<f32>, index: Vec<u32>) -> Self {
        Self {
            name: name.to_owned(),
            position,
            index,
        }
    }

    /// Surface name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flat vertex positions.
    #[must_use]
    pub fn position(&self) -> &[f32] {
        &self.position
    }

    /// Triangle indices.
    #[must_use]
    pub fn index(&self) -> &[u32] {
        &self.index
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.position.len() / 3
    }

    /// Bounding-box center of the vertices.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        let points = (0..self.vertex_count()).map(|i| vec3_at(&self.position, i));
        bounds(points).map_or(Vec3::ZERO, |(min, max)| (min + max) * 0.5)
    }
}
