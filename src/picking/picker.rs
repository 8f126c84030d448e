//! Resolvers from per-buffer pick ids to picked objects and positions.
//!
//! Every buffer that can be picked carries one [`Picker`]. The viewer
//! reports a pick id local to that buffer; the picker maps it to the data
//! object behind the primitive and to a world-space position.
//!
//! Pickers over a compacted id space (a buffer drawing a subset of atoms,
//! the voxels above a threshold) carry a remap array from pick id to the
//! index in the underlying store. Shape pickers index their primitive
//! arrays by pick id directly.
//!
//! Pick ids outside the buffer's range are a caller error and index out of
//! bounds.

use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::data::{
    mean_vec3, vec3_at, AtomProxy, BondProxy, BondStore, Clash, Instance, SegmentArrays, Selection,
    Shape, Structure, Surface, Validation, Volume,
};

/// Picker discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickerType {
    /// Atoms.
    Atom,
    /// Covalent bonds.
    Bond,
    /// Non-covalent contacts.
    Contact,
    /// Measured atom-pair distances.
    Distance,
    /// Validation clashes.
    Clash,
    /// Volume voxels.
    Volume,
    /// Voxels sampled on a slice plane.
    Slice,
    /// Surface vertices.
    Surface,
    /// Shape spheres.
    Sphere,
    /// Shape cylinders.
    Cylinder,
    /// Shape cones.
    Cone,
    /// Shape arrows.
    Arrow,
    /// Shape ellipsoids.
    Ellipsoid,
    /// Shape meshes.
    Mesh,
    /// Picks that resolve to nothing on purpose.
    Ignore,
    /// Picks of an unknown kind.
    Unknown,
}

impl PickerType {
    /// Lower-case name of the picker kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Atom => "atom",
            Self::Bond => "bond",
            Self::Contact => "contact",
            Self::Distance => "distance",
            Self::Clash => "clash",
            Self::Volume => "volume",
            Self::Slice => "slice",
            Self::Surface => "surface",
            Self::Sphere => "sphere",
            Self::Cylinder => "cylinder",
            Self::Cone => "cone",
            Self::Arrow => "arrow",
            Self::Ellipsoid => "ellipsoid",
            Self::Mesh => "mesh",
            Self::Ignore => "ignore",
            Self::Unknown => "unknown",
        }
    }
}

/// A picked voxel.
#[derive(Debug, Clone)]
pub struct VoxelPick {
    /// Owning volume.
    pub volume: Rc<Volume>,
    /// Flat voxel index.
    pub index: usize,
    /// Voxel value.
    pub value: f32,
}

/// A picked surface vertex.
#[derive(Debug, Clone)]
pub struct SurfacePick {
    /// Owning surface.
    pub surface: Rc<Surface>,
    /// Vertex index.
    pub index: usize,
}

/// A picked clash.
#[derive(Debug, Clone)]
pub struct ClashPick {
    /// Owning validation report.
    pub validation: Rc<Validation>,
    /// Clash index within the report.
    pub index: usize,
    /// The clash record.
    pub clash: Clash,
}

/// A picked shape primitive (sphere, cylinder, cone, arrow, ellipsoid).
#[derive(Debug, Clone)]
pub struct PrimitivePick {
    /// Owning shape.
    pub shape: Rc<Shape>,
    /// Primitive index within its kind.
    pub index: usize,
    /// Primitive name.
    pub name: String,
    /// Primitive color.
    pub color: Vec3,
    /// Primitive radius.
    pub radius: f32,
    /// Center (sphere, ellipsoid) or start point (segments).
    pub position1: Vec3,
    /// End point of two-point primitives.
    pub position2: Option<Vec3>,
}

/// A picked shape mesh.
#[derive(Debug, Clone)]
pub struct MeshPick {
    /// Owning shape.
    pub shape: Rc<Shape>,
    /// Mesh name.
    pub name: String,
    /// Mesh serial within the shape.
    pub serial: usize,
}

/// What a pick id resolved to.
#[derive(Debug, Clone)]
pub enum PickedObject {
    /// An atom.
    Atom(AtomProxy),
    /// A covalent bond.
    Bond(BondProxy),
    /// A contact; the bond order carries the contact type.
    Contact(BondProxy),
    /// A measured distance between two atoms.
    Distance(BondProxy),
    /// A validation clash.
    Clash(ClashPick),
    /// A volume voxel.
    Volume(VoxelPick),
    /// A slice voxel.
    Slice(VoxelPick),
    /// A surface vertex.
    Surface(SurfacePick),
    /// A shape sphere.
    Sphere(PrimitivePick),
    /// A shape cylinder.
    Cylinder(PrimitivePick),
    /// A shape cone.
    Cone(PrimitivePick),
    /// A shape arrow.
    Arrow(PrimitivePick),
    /// A shape ellipsoid.
    Ellipsoid(PrimitivePick),
    /// A shape mesh.
    Mesh(MeshPick),
    /// Nothing pickable.
    None,
}

/// Resolver for one buffer's pick ids.
#[derive(Debug, Clone)]
pub enum Picker {
    /// Atoms of a structure.
    Atom {
        /// Structure the atoms live in.
        structure: Rc<Structure>,
        /// Pick id to atom index.
        array: Option<Vec<usize>>,
    },
    /// Bonds of a structure.
    Bond {
        /// Structure the bonded atoms live in.
        structure: Rc<Structure>,
        /// Bond store the ids index into.
        bonds: Rc<BondStore>,
        /// Pick id to bond index.
        array: Option<Vec<usize>>,
    },
    /// Contacts between atoms, stored as pseudo-bonds.
    Contact {
        /// Structure the atoms live in.
        structure: Rc<Structure>,
        /// Contact pairs; the bond order is the contact type.
        contacts: Rc<BondStore>,
        /// Pick id to contact index.
        array: Option<Vec<usize>>,
    },
    /// Measured distances, stored as pseudo-bonds.
    Distance {
        /// Structure the atoms live in.
        structure: Rc<Structure>,
        /// Measured pairs.
        pairs: Rc<BondStore>,
        /// Pick id to pair index.
        array: Option<Vec<usize>>,
    },
    /// Validation clashes.
    Clash {
        /// Structure the clash selections refer to.
        structure: Rc<Structure>,
        /// Validation report.
        validation: Rc<Validation>,
        /// Pick id to clash index.
        array: Option<Vec<usize>>,
    },
    /// Volume voxels.
    Volume {
        /// Volume the voxels live in.
        volume: Rc<Volume>,
        /// Pick id to flat voxel index.
        array: Option<Vec<usize>>,
    },
    /// Voxels sampled on a slice plane.
    Slice {
        /// Volume the voxels live in.
        volume: Rc<Volume>,
        /// Pick id (pixel) to flat voxel index.
        array: Option<Vec<usize>>,
    },
    /// Surface vertices.
    Surface {
        /// Surface.
        surface: Rc<Surface>,
        /// Pick id to vertex index.
        array: Option<Vec<usize>>,
    },
    /// Shape spheres.
    Sphere(Rc<Shape>),
    /// Shape cylinders.
    Cylinder(Rc<Shape>),
    /// Shape cones.
    Cone(Rc<Shape>),
    /// Shape arrows.
    Arrow(Rc<Shape>),
    /// Shape ellipsoids.
    Ellipsoid(Rc<Shape>),
    /// One mesh of a shape.
    Mesh {
        /// Shape holding the mesh.
        shape: Rc<Shape>,
        /// Mesh serial.
        mesh: usize,
    },
    /// Resolves to nothing.
    Ignore,
    /// Resolves to nothing; kind unknown.
    Unknown,
}

fn remap(array: Option<&Vec<usize>>, pid: usize) -> usize {
    array.map_or(pid, |a| a[pid])
}

fn first_atom(structure: &Structure, sele: &str) -> Option<Vec3> {
    structure
        .atom_indices(&Selection::new(sele))
        .first()
        .map(|&i| structure.position(i))
}

impl Picker {
    /// Discriminator of this picker.
    #[must_use]
    pub fn picker_type(&self) -> PickerType {
        match self {
            Self::Atom { .. } => PickerType::Atom,
            Self::Bond { .. } => PickerType::Bond,
            Self::Contact { .. } => PickerType::Contact,
            Self::Distance { .. } => PickerType::Distance,
            Self::Clash { .. } => PickerType::Clash,
            Self::Volume { .. } => PickerType::Volume,
            Self::Slice { .. } => PickerType::Slice,
            Self::Surface { .. } => PickerType::Surface,
            Self::Sphere(_) => PickerType::Sphere,
            Self::Cylinder(_) => PickerType::Cylinder,
            Self::Cone(_) => PickerType::Cone,
            Self::Arrow(_) => PickerType::Arrow,
            Self::Ellipsoid(_) => PickerType::Ellipsoid,
            Self::Mesh { .. } => PickerType::Mesh,
            Self::Ignore => PickerType::Ignore,
            Self::Unknown => PickerType::Unknown,
        }
    }

    /// Remap array, when the picker has one.
    #[must_use]
    pub fn array(&self) -> Option<&[usize]> {
        match self {
            Self::Atom { array, .. }
            | Self::Bond { array, .. }
            | Self::Contact { array, .. }
            | Self::Distance { array, .. }
            | Self::Clash { array, .. }
            | Self::Volume { array, .. }
            | Self::Slice { array, .. }
            | Self::Surface { array, .. } => array.as_deref(),
            _ => None,
        }
    }

    /// Index into the underlying store for pick id `pid`.
    #[must_use]
    pub fn index(&self, pid: usize) -> usize {
        self.array().map_or(pid, |a| a[pid])
    }

    /// Object behind pick id `pid`.
    #[must_use]
    pub fn object(&self, pid: usize) -> PickedObject {
        match self {
            Self::Atom { structure, array } => PickedObject::Atom(
                AtomProxy::new(Rc::clone(structure), remap(array.as_ref(), pid)),
            ),
            Self::Bond {
                structure,
                bonds,
                array,
            } => PickedObject::Bond(BondProxy::new(
                Rc::clone(structure),
                Rc::clone(bonds),
                remap(array.as_ref(), pid),
            )),
            Self::Contact {
                structure,
                contacts,
                array,
            } => PickedObject::Contact(BondProxy::new(
                Rc::clone(structure),
                Rc::clone(contacts),
                remap(array.as_ref(), pid),
            )),
            Self::Distance {
                structure,
                pairs,
                array,
            } => PickedObject::Distance(BondProxy::new(
                Rc::clone(structure),
                Rc::clone(pairs),
                remap(array.as_ref(), pid),
            )),
            Self::Clash {
                validation, array, ..
            } => {
                let index = remap(array.as_ref(), pid);
                PickedObject::Clash(ClashPick {
                    validation: Rc::clone(validation),
                    index,
                    clash: validation.clashes()[index].clone(),
                })
            }
            Self::Volume { volume, array } => {
                PickedObject::Volume(voxel(volume, remap(array.as_ref(), pid)))
            }
            Self::Slice { volume, array } => {
                PickedObject::Slice(voxel(volume, remap(array.as_ref(), pid)))
            }
            Self::Surface { surface, array } => PickedObject::Surface(SurfacePick {
                surface: Rc::clone(surface),
                index: remap(array.as_ref(), pid),
            }),
            Self::Sphere(shape) => {
                let s = &shape.spheres;
                PickedObject::Sphere(PrimitivePick {
                    shape: Rc::clone(shape),
                    index: pid,
                    name: s.name[pid].clone(),
                    color: vec3_at(&s.color, pid),
                    radius: s.radius[pid],
                    position1: vec3_at(&s.position, pid),
                    position2: None,
                })
            }
            Self::Cylinder(shape) => PickedObject::Cylinder(segment(shape, &shape.cylinders, pid)),
            Self::Cone(shape) => PickedObject::Cone(segment(shape, &shape.cones, pid)),
            Self::Arrow(shape) => PickedObject::Arrow(segment(shape, &shape.arrows, pid)),
            Self::Ellipsoid(shape) => {
                let e = &shape.ellipsoids;
                PickedObject::Ellipsoid(PrimitivePick {
                    shape: Rc::clone(shape),
                    index: pid,
                    name: e.name[pid].clone(),
                    color: vec3_at(&e.color, pid),
                    radius: e.radius[pid],
                    position1: vec3_at(&e.position, pid),
                    position2: None,
                })
            }
            Self::Mesh { shape, mesh } => {
                let m = &shape.meshes[*mesh];
                PickedObject::Mesh(MeshPick {
                    shape: Rc::clone(shape),
                    name: m.name.clone(),
                    serial: m.serial,
                })
            }
            Self::Ignore | Self::Unknown => PickedObject::None,
        }
    }

    /// Position of pick id `pid` before any transform.
    #[must_use]
    pub fn local_position(&self, pid: usize) -> Vec3 {
        match self {
            Self::Atom { structure, array } => structure.position(remap(array.as_ref(), pid)),
            Self::Bond {
                structure,
                bonds: store,
                array,
            }
            | Self::Contact {
                structure,
                contacts: store,
                array,
            }
            | Self::Distance {
                structure,
                pairs: store,
                array,
            } => {
                let (a1, a2) = store.atoms(remap(array.as_ref(), pid));
                (structure.position(a1) + structure.position(a2)) * 0.5
            }
            Self::Clash {
                structure,
                validation,
                array,
            } => {
                let clash = &validation.clashes()[remap(array.as_ref(), pid)];
                match (first_atom(structure, &clash.sele1), first_atom(structure, &clash.sele2)) {
                    (Some(p1), Some(p2)) => (p1 + p2) * 0.5,
                    (Some(p), None) | (None, Some(p)) => p,
                    (None, None) => Vec3::ZERO,
                }
            }
            Self::Volume { volume, array } | Self::Slice { volume, array } => {
                volume.position(remap(array.as_ref(), pid))
            }
            Self::Surface { surface, .. } => surface.center(),
            Self::Sphere(shape) => vec3_at(&shape.spheres.position, pid),
            Self::Cylinder(shape) => shape.cylinders.midpoint(pid),
            Self::Cone(shape) => shape.cones.midpoint(pid),
            Self::Arrow(shape) => shape.arrows.midpoint(pid),
            Self::Ellipsoid(shape) => vec3_at(&shape.ellipsoids.position, pid),
            Self::Mesh { shape, mesh } => mean_vec3(&shape.meshes[*mesh].position),
            Self::Ignore | Self::Unknown => Vec3::ZERO,
        }
    }

    /// World position of pick id `pid`: the primitive's local position,
    /// transformed by the instance matrix (if any), then by `matrix`, the
    /// owning component's model matrix.
    #[must_use]
    pub fn position(&self, pid: usize, instance: Option<&Instance>, matrix: Mat4) -> Vec3 {
        let mut p = self.local_position(pid);
        if let Some(instance) = instance {
            p = instance.matrix.transform_point3(p);
        }
        matrix.transform_point3(p)
    }
}

fn voxel(volume: &Rc<Volume>, index: usize) -> VoxelPick {
    VoxelPick {
        volume: Rc::clone(volume),
        index,
        value: volume.value(index),
    }
}

fn segment(shape: &Rc<Shape>, arrays: &SegmentArrays, pid: usize) -> PrimitivePick {
    PrimitivePick {
        shape: Rc::clone(shape),
        index: pid,
        name: arrays.name[pid].clone(),
        color: vec3_at(&arrays.color, pid),
        radius: arrays.radius[pid],
        position1: vec3_at(&arrays.position1, pid),
        position2: Some(vec3_at(&arrays.position2, pid)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    #[test]
    fn index_is_identity_without_array() {
        let s = Rc::new(fixtures::peptide(2));
        let p = Picker::Atom {
            structure: s,
            array: None,
        };
        for pid in 0..6 {
            assert_eq!(p.index(pid), pid);
        }
    }

    #[test]
    fn index_uses_remap_array() {
        let s = Rc::new(fixtures::peptide(3));
        let p = Picker::Atom {
            structure: Rc::clone(&s),
            array: Some(vec![1, 4, 7]),
        };
        assert_eq!(p.index(2), 7);
        let PickedObject::Atom(atom) = p.object(1) else {
            unreachable!("expected atom");
        };
        assert_eq!(atom.name(), "CA");
        assert_eq!(atom.resno(), 2);
        assert_eq!(p.local_position(1), s.position(4));
    }

    #[test]
    fn bond_position_is_midpoint() {
        let s = Rc::new(fixtures::peptide(2));
        let p = Picker::Bond {
            structure: Rc::clone(&s),
            bonds: Rc::clone(s.bonds()),
            array: None,
        };
        let (a1, a2) = s.bonds().atoms(1);
        assert_eq!(p.local_position(1), (s.position(a1) + s.position(a2)) * 0.5);
        assert_eq!(p.picker_type(), PickerType::Bond);
    }

    #[test]
    fn position_applies_instance_then_component() {
        let shape = Rc::new(fixtures::shape());
        let p = Picker::Sphere(Rc::clone(&shape));
        let instance = Instance {
            id: 1,
            name: "mate".into(),
            matrix: Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)),
        };
        let component = Mat4::from_scale(Vec3::splat(2.0));
        // sphere at (1, 2, 3): translate to (11, 2, 3), then scale
        assert_eq!(p.position(0, Some(&instance), component), Vec3::new(22.0, 4.0, 6.0));
        assert_eq!(p.position(0, None, Mat4::IDENTITY), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn segment_primitives_use_endpoint_mean() {
        let shape = Rc::new(fixtures::shape());
        assert_eq!(Picker::Cone(Rc::clone(&shape)).local_position(0), Vec3::new(0.0, 2.0, 0.0));
        let PickedObject::Arrow(arrow) = Picker::Arrow(shape).object(0) else {
            unreachable!("expected arrow");
        };
        assert_eq!(arrow.name, "arrow");
        assert_eq!(arrow.position2, Some(Vec3::new(0.0, 0.0, 6.0)));
    }

    #[test]
    fn mesh_resolves_name_and_vertex_mean() {
        let shape = Rc::new(fixtures::shape());
        let p = Picker::Mesh { shape, mesh: 0 };
        let PickedObject::Mesh(mesh) = p.object(0) else {
            unreachable!("expected mesh");
        };
        assert_eq!((mesh.name.as_str(), mesh.serial), ("triangle", 0));
        let c = p.local_position(0);
        assert!((c - Vec3::new(2.0 / 3.0, 2.0 / 3.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn volume_reports_value_and_voxel_position() {
        let v = Rc::new(fixtures::volume());
        let p = Picker::Volume {
            volume: v,
            array: Some(vec![5, 23]),
        };
        let PickedObject::Volume(voxel) = p.object(1) else {
            unreachable!("expected voxel");
        };
        assert_eq!((voxel.index, voxel.value), (23, 23.0));
        assert_eq!(p.local_position(1), Vec3::new(6.0, 4.0, 2.0));
    }

    #[test]
    fn clash_position_between_selected_atoms() {
        let s = Rc::new(fixtures::peptide(2));
        let p = Picker::Clash {
            structure: Rc::clone(&s),
            validation: Rc::new(fixtures::validation()),
            array: None,
        };
        // 1.N is atom 0, 2.C is atom 5
        assert_eq!(p.local_position(0), (s.position(0) + s.position(5)) * 0.5);
        assert!(matches!(p.object(0), PickedObject::Clash(_)));
    }

    #[test]
    fn ignore_resolves_to_none() {
        assert!(matches!(Picker::Ignore.object(3), PickedObject::None));
        assert_eq!(Picker::Unknown.picker_type().as_str(), "unknown");
    }
}
