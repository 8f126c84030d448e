//! CPU-side geometry buffers handed to the viewer.
//!
//! A buffer is a set of named per-primitive `f32` attributes with a fixed
//! primitive count. Updates replace attribute values in place; the count
//! (and therefore every attribute length) is fixed at construction, and a
//! change in topology means building a new buffer.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::data::Instance;
use crate::picking::Picker;

/// Unique buffer identifier, stable for the lifetime of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Primitive kind a buffer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Spheres (impostor or tessellated).
    Sphere,
    /// Cylinders between two points.
    Cylinder,
    /// Cones from base to tip.
    Cone,
    /// Arrows (cylinder + cone).
    Arrow,
    /// Ellipsoids.
    Ellipsoid,
    /// Screen-space points.
    Point,
    /// Line segments.
    Line,
    /// Indexed triangle mesh.
    Mesh,
    /// Text labels.
    Text,
    /// Textured plane (slice images).
    Image,
}

impl BufferKind {
    /// Number of floats one primitive occupies in its `position` attribute.
    #[must_use]
    pub fn position_stride(self) -> usize {
        3
    }

    /// Whether the kind can be drawn with raycasted impostors.
    #[must_use]
    pub fn supports_impostor(self) -> bool {
        matches!(self, Self::Sphere | Self::Cylinder | Self::Ellipsoid)
    }
}

/// Errors raised by in-place buffer updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// The update would change an attribute's length.
    LengthMismatch {
        /// Attribute name.
        attribute: String,
        /// Current length.
        expected: usize,
        /// Length of the rejected data.
        actual: usize,
    },
    /// The buffer has no attribute with this name.
    UnknownAttribute(String),
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                attribute,
                expected,
                actual,
            } => write!(
                f,
                "attribute '{attribute}' has length {expected}, update has {actual}"
            ),
            Self::UnknownAttribute(name) => {
                write!(f, "unknown attribute '{name}'")
            }
        }
    }
}

impl std::error::Error for BufferError {}

/// Material-level parameters shared by every primitive of a buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferParams {
    /// 0.0 (transparent) to 1.0 (opaque).
    pub opacity: f32,
    /// Draw triangle edges instead of faces.
    pub wireframe: bool,
    /// Draw impostors instead of tessellated geometry.
    pub impostor: bool,
    /// Tessellation segments around cylinders.
    pub radial_segments: u32,
    /// Sphere subdivision level.
    pub sphere_detail: u32,
    /// Scale applied to every radius / point size.
    pub scale: f32,
    /// Screen-space offset towards the camera (text labels).
    pub z_offset: f32,
    /// Texture filtering of image buffers: `nearest`, `linear`, `cubic-bspline`.
    pub filter: String,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            wireframe: false,
            impostor: true,
            radial_segments: 10,
            sphere_detail: 1,
            scale: 1.0,
            z_offset: 0.0,
            filter: "linear".to_owned(),
        }
    }
}

/// A CPU-side geometry buffer.
#[derive(Debug, Clone)]
pub struct Buffer {
    id: BufferId,
    kind: BufferKind,
    count: usize,
    attributes: FxHashMap<String, Vec<f32>>,
    index: Option<Vec<u32>>,
    labels: Vec<String>,
    picker: Option<Rc<Picker>>,
    instances: Vec<Instance>,
    params: BufferParams,
    matrix: Mat4,
    visible: bool,
}

impl Buffer {
    /// New buffer of `kind` with primitive positions `position`
    /// (`3 * count` floats).
    #[must_use]
    pub fn new(kind: BufferKind, position: Vec<f32>) -> Self {
        let count = position.len() / kind.position_stride();
        let mut attributes = FxHashMap::default();
        let _ = attributes.insert("position".to_owned(), position);
        Self {
            id: BufferId::next(),
            kind,
            count,
            attributes,
            index: None,
            labels: Vec::new(),
            picker: None,
            instances: Vec::new(),
            params: BufferParams::default(),
            matrix: Mat4::IDENTITY,
            visible: true,
        }
    }

    /// Add an attribute at construction time. Its length defines the
    /// stride for later updates.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, values: Vec<f32>) -> Self {
        let _ = self.attributes.insert(name.to_owned(), values);
        self
    }

    /// Set the triangle index (meshes).
    #[must_use]
    pub fn with_index(mut self, index: Vec<u32>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set per-primitive labels (text buffers).
    #[must_use]
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Attach the picker that resolves this buffer's pick ids.
    #[must_use]
    pub fn with_picker(mut self, picker: Picker) -> Self {
        self.picker = Some(Rc::new(picker));
        self
    }

    /// Draw one copy per instance.
    #[must_use]
    pub fn with_instances(mut self, instances: Vec<Instance>) -> Self {
        self.instances = instances;
        self
    }

    /// Set the material parameters.
    #[must_use]
    pub fn with_params(mut self, params: BufferParams) -> Self {
        self.params = params;
        self
    }

    /// Buffer id.
    #[must_use]
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Primitive kind.
    #[must_use]
    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Number of primitives.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Attribute values, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&[f32]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    /// Length of every attribute, keyed by name.
    #[must_use]
    pub fn attribute_lengths(&self) -> FxHashMap<String, usize> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.len()))
            .collect()
    }

    /// Replace an attribute's values in place. Fails without modifying the
    /// buffer when the length differs or the attribute does not exist.
    pub fn set_attribute(
        &mut self,
        name: &str,
        values: Vec<f32>,
    ) -> Result<(), BufferError> {
        let slot = self
            .attributes
            .get_mut(name)
            .ok_or_else(|| BufferError::UnknownAttribute(name.to_owned()))?;
        if slot.len() != values.len() {
            return Err(BufferError::LengthMismatch {
                attribute: name.to_owned(),
                expected: slot.len(),
                actual: values.len(),
            });
        }
        *slot = values;
        Ok(())
    }

    /// Triangle index, if any.
    #[must_use]
    pub fn index(&self) -> Option<&[u32]> {
        self.index.as_deref()
    }

    /// Labels of a text buffer.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Replace label texts. The label count is part of the topology.
    pub fn set_labels(&mut self, labels: Vec<String>) -> Result<(), BufferError> {
        if labels.len() != self.labels.len() {
            return Err(BufferError::LengthMismatch {
                attribute: "labels".to_owned(),
                expected: self.labels.len(),
                actual: labels.len(),
            });
        }
        self.labels = labels;
        Ok(())
    }

    /// Picker resolving this buffer's pick ids.
    #[must_use]
    pub fn picker(&self) -> Option<&Rc<Picker>> {
        self.picker.as_ref()
    }

    /// Instances the buffer is drawn with. Empty means one untransformed
    /// copy.
    #[must_use]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Material parameters.
    #[must_use]
    pub fn params(&self) -> &BufferParams {
        &self.params
    }

    /// Mutable material parameters.
    pub fn params_mut(&mut self) -> &mut BufferParams {
        &mut self.params
    }

    /// Model matrix of the owning component.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Set the model matrix.
    pub fn set_matrix(&mut self, matrix: Mat4) {
        self.matrix = matrix;
    }

    /// Whether the buffer is drawn.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the buffer.
    pub fn set_visibility(&mut self, visible: bool) {
        self.visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spheres() -> Buffer {
        Buffer::new(BufferKind::Sphere, vec![0.0; 6])
            .with_attribute("color", vec![1.0; 6])
            .with_attribute("radius", vec![1.5, 1.5])
    }

    #[test]
    fn count_follows_position_length() {
        let b = spheres();
        assert_eq!(b.count(), 2);
        assert!(b.visible());
        assert_ne!(b.id(), spheres().id());
    }

    #[test]
    fn update_keeps_lengths() {
        let mut b = spheres();
        let before = b.attribute_lengths();
        b.set_attribute("radius", vec![2.0, 3.0]).unwrap();
        assert_eq!(b.attribute("radius"), Some(&[2.0, 3.0][..]));
        assert_eq!(b.attribute_lengths(), before);
    }

    #[test]
    fn update_rejects_length_change() {
        let mut b = spheres();
        let err = b.set_attribute("radius", vec![2.0]).unwrap_err();
        assert_eq!(
            err,
            BufferError::LengthMismatch {
                attribute: "radius".into(),
                expected: 2,
                actual: 1,
            }
        );
        assert_eq!(b.attribute("radius"), Some(&[1.5, 1.5][..]));
        assert!(matches!(
            b.set_attribute("size", vec![]),
            Err(BufferError::UnknownAttribute(_))
        ));
    }

    #[test]
    fn labels_keep_count() {
        let mut b = Buffer::new(BufferKind::Text, vec![0.0; 3])
            .with_labels(vec!["a".into()]);
        assert!(b.set_labels(vec!["b".into()]).is_ok());
        assert!(b.set_labels(Vec::new()).is_err());
        assert_eq!(b.labels(), ["b".to_owned()]);
    }
}
