//! The `buffer` representation: draws the primitives of a [`Shape`].
//!
//! [`Shape`]: crate::data::Shape

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{DisplayParams, Representation, RepresentationSource};
use crate::buffer::{Buffer, BufferError, BufferKind};
use crate::data::{SegmentArrays, Shape};
use crate::params::{ParamSpec, What};
use crate::picking::Picker;

/// Parameters of the `buffer` representation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShapeParams {
    /// Shared options.
    #[serde(flatten)]
    pub display: DisplayParams,
}

/// One buffer per non-empty primitive kind of a shape, one per mesh.
#[derive(Debug, Clone, Default)]
pub struct ShapeRepresentation {
    params: ShapeParams,
}

impl ShapeRepresentation {
    /// Representation drawing shapes as given.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn segments(
        kind: BufferKind,
        arrays: &SegmentArrays,
        picker: Picker,
    ) -> Option<Buffer> {
        (arrays.count() > 0).then(|| {
            Buffer::new(kind, arrays.position1.clone())
                .with_attribute("position2", arrays.position2.clone())
                .with_attribute("color", arrays.color.clone())
                .with_attribute("radius", arrays.radius.clone())
                .with_picker(picker)
        })
    }

    fn buffers(shape: &Rc<Shape>) -> Vec<Buffer> {
        let mut out = Vec::new();
        let s = &shape.spheres;
        if !s.radius.is_empty() {
            out.push(
                Buffer::new(BufferKind::Sphere, s.position.clone())
                    .with_attribute("color", s.color.clone())
                    .with_attribute("radius", s.radius.clone())
                    .with_picker(Picker::Sphere(Rc::clone(shape))),
            );
        }
        out.extend(Self::segments(
            BufferKind::Cylinder,
            &shape.cylinders,
            Picker::Cylinder(Rc::clone(shape)),
        ));
        out.extend(Self::segments(
            BufferKind::Cone,
            &shape.cones,
            Picker::Cone(Rc::clone(shape)),
        ));
        out.extend(Self::segments(
            BufferKind::Arrow,
            &shape.arrows,
            Picker::Arrow(Rc::clone(shape)),
        ));
        let e = &shape.ellipsoids;
        if !e.radius.is_empty() {
            out.push(
                Buffer::new(BufferKind::Ellipsoid, e.position.clone())
                    .with_attribute("color", e.color.clone())
                    .with_attribute("radius", e.radius.clone())
                    .with_attribute("major_axis", e.major_axis.clone())
                    .with_attribute("minor_axis", e.minor_axis.clone())
                    .with_picker(Picker::Ellipsoid(Rc::clone(shape))),
            );
        }
        for mesh in &shape.meshes {
            out.push(
                Buffer::new(BufferKind::Mesh, mesh.position.clone())
                    .with_attribute("color", mesh.color.clone())
                    .with_index(mesh.index.clone())
                    .with_picker(Picker::Mesh {
                        shape: Rc::clone(shape),
                        mesh: mesh.serial,
                    }),
            );
        }
        out
    }
}

impl Representation for ShapeRepresentation {
    fn type_name(&self) -> &'static str {
        "buffer"
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        &[]
    }

    params_accessors!();

    fn supports(&self, source: &RepresentationSource) -> bool {
        matches!(source, RepresentationSource::Shape(_))
    }

    fn create(&self, source: &RepresentationSource) -> Vec<Buffer> {
        let RepresentationSource::Shape(shape) = source else {
            return Vec::new();
        };
        let params = self.params.display.buffer_params(0);
        Self::buffers(shape)
            .into_iter()
            .map(|b| b.with_params(params.clone()))
            .collect()
    }

    fn update(
        &self,
        _source: &RepresentationSource,
        _what: What,
        _buffers: &mut [Buffer],
    ) -> Result<(), BufferError> {
        // Shape colors are part of the data.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;
    use crate::picking::PickedObject;

    #[test]
    fn one_buffer_per_primitive_kind() {
        let src = RepresentationSource::Shape(Rc::new(fixtures::shape()));
        let buffers = ShapeRepresentation::new().create(&src);
        let kinds: Vec<_> = buffers.iter().map(Buffer::kind).collect();
        assert_eq!(
            kinds,
            vec![
                BufferKind::Sphere,
                BufferKind::Cylinder,
                BufferKind::Cone,
                BufferKind::Arrow,
                BufferKind::Ellipsoid,
                BufferKind::Mesh,
            ]
        );
    }

    #[test]
    fn mesh_picker_names_the_mesh() {
        let src = RepresentationSource::Shape(Rc::new(fixtures::shape()));
        let buffers = ShapeRepresentation::new().create(&src);
        let mesh = buffers.last().and_then(|b| b.picker()).map(|p| p.object(0));
        let Some(PickedObject::Mesh(m)) = mesh else {
            unreachable!("expected a mesh pick")
        };
        assert_eq!(m.name, "triangle");
    }

    #[test]
    fn empty_shape_builds_nothing() {
        let src = RepresentationSource::Shape(Rc::new(Shape::new("empty")));
        assert!(ShapeRepresentation::new().create(&src).is_empty());
    }
}
