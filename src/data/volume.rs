//! Scalar grid data (density maps, electrostatics).

use glam::{Mat4, Vec3};

/// A regular 3D grid of scalar values.
///
/// Voxels are stored x-fastest: `index = (z * ny + y) * nx + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    name: String,
    nx: usize,
    ny: usize,
    nz: usize,
    data: Vec<f32>,
    /// Grid coordinates to cartesian coordinates.
    matrix: Mat4,
}

impl Volume {
    /// Create a volume. `data.len()` must equal `nx * ny * nz`.
    #[must_use]
    pub fn new(
        name: &str,
        nx: usize,
        ny: usize,
        nz: usize,
        data: Vec<f32>,
        matrix: Mat4,
    ) -> Self {
        debug_assert_eq!(data.len(), nx * ny * nz);
        Self {
            name: name.to_owned(),
            nx,
            ny,
            nz,
            data,
            matrix,
        }
    }

    /// Volume name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grid dimensions.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    /// Number of voxels.
    #[must_use]
    pub fn voxel_count(&self) -> usize {
        self.data.len()
    }

    /// Raw voxel values.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Value of voxel `index`.
    #[must_use]
    pub fn value(&self, index: usize) -> f32 {
        self.data[index]
    }

    /// Grid-to-cartesian transform.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Flat index of grid cell `(x, y, z)`.
    #[must_use]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.ny + y) * self.nx + x
    }

    /// Cartesian position of grid cell `(x, y, z)`.
    #[must_use]
    pub fn grid_position(&self, x: usize, y: usize, z: usize) -> Vec3 {
        self.matrix
            .transform_point3(Vec3::new(x as f32, y as f32, z as f32))
    }

    /// Cartesian position of voxel `index`.
    #[must_use]
    pub fn position(&self, index: usize) -> Vec3 {
        let x = index % self.nx;
        let y = (index / self.nx) % self.ny;
        let z = index / (self.nx * self.ny);
        self.grid_position(x, y, z)
    }

    /// Smallest value.
    #[must_use]
    pub fn data_min(&self) -> f32 {
        self.data.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Largest value.
    #[must_use]
    pub fn data_max(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Mean value.
    #[must_use]
    pub fn data_mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f32>() / self.data.len() as f32
    }

    /// Root-mean-square deviation from the mean.
    #[must_use]
    pub fn data_rms(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let mean = self.data_mean();
        let sum: f32 = self.data.iter().map(|v| (v - mean).powi(2)).sum();
        (sum / self.data.len() as f32).sqrt()
    }

    /// Absolute value corresponding to `sigma` standard deviations above
    /// the mean.
    #[must_use]
    pub fn value_for_sigma(&self, sigma: f32) -> f32 {
        self.data_mean() + sigma * self.data_rms()
    }

    /// Bounding-box center of the grid in cartesian space.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        let far = self.grid_position(
            self.nx.saturating_sub(1),
            self.ny.saturating_sub(1),
            self.nz.saturating_sub(1),
        );
        (self.grid_position(0, 0, 0) + far) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    #[test]
    fn index_and_position_agree() {
        let v = fixtures::volume();
        let idx = v.index(3, 2, 1);
        assert_eq!(idx, 23);
        assert_eq!(v.position(idx), Vec3::new(6.0, 4.0, 2.0));
        assert_eq!(v.value(idx), 23.0);
    }

    #[test]
    fn statistics() {
        let v = fixtures::volume();
        assert_eq!(v.data_min(), 0.0);
        assert_eq!(v.data_max(), 23.0);
        assert!((v.data_mean() - 11.5).abs() < 1e-5);
        assert!(v.value_for_sigma(1.0) > v.data_mean());
        assert_eq!(v.center(), Vec3::new(3.0, 2.0, 1.0));
    }
}
