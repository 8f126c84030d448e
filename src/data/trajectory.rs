use glam::Vec3;

/// Coordinate frames for a structure, one position per atom per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    name: String,
    frames: Vec<Vec<Vec3>>,
}

impl Trajectory {
    /// Trajectory over pre-loaded frames.
    #[must_use]
    pub fn new(name: &str, frames: Vec<Vec<Vec3>>) -> Self {
        Self {
            name: name.to_owned(),
            frames,
        }
    }

    /// Trajectory name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Coordinates of frame `index`.
    #[must_use]
    pub fn frame(&self, index: usize) -> Option<&[Vec3]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    /// Position of `atom` in every frame, in frame order. Frames that do
    /// not cover the atom are skipped.
    #[must_use]
    pub fn path(&self, atom: usize) -> Vec<Vec3> {
        self.frames.iter().filter_map(|f| f.get(atom).copied()).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::data::fixtures;

    #[test]
    fn path_follows_frames() {
        let s = fixtures::ca_trace(2);
        let t = fixtures::trajectory(&s, 3);
        let path = t.path(1);
        assert_eq!(path.len(), 3);
        assert_eq!(path[2].z, 2.0);
        assert!(t.frame(3).is_none());
    }
}
