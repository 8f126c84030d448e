//! Per-event snapshot of a pick with typed accessors.

use std::rc::Rc;

use glam::{Mat4, Vec2, Vec3};

use super::picker::{
    ClashPick, MeshPick, PickedObject, Picker, PickerType, PrimitivePick,
    SurfacePick, VoxelPick,
};
use crate::component::ComponentId;
use crate::data::{AtomProxy, BondProxy, Instance};
use crate::input::{Modifiers, MouseSnapshot};
use crate::viewer::CanvasProjection;

/// What was under the mouse when a click or hover happened.
///
/// Everything is captured at pick time: later mouse movement or component
/// transforms do not change what the proxy reports.
#[derive(Debug, Clone)]
pub struct PickingProxy {
    pid: usize,
    picker: Rc<Picker>,
    instance: Option<Instance>,
    component: Option<ComponentId>,
    component_matrix: Mat4,
    mouse: MouseSnapshot,
    projection: CanvasProjection,
}

macro_rules! typed_accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        #[must_use]
        pub fn $name(&self) -> Option<$ty> {
            match self.object() {
                PickedObject::$variant(o) => Some(o),
                _ => None,
            }
        }
    };
}

impl PickingProxy {
    /// Snapshot a pick.
    #[must_use]
    pub fn new(
        pid: usize,
        picker: Rc<Picker>,
        instance: Option<Instance>,
        component: Option<(ComponentId, Mat4)>,
        mouse: MouseSnapshot,
        projection: CanvasProjection,
    ) -> Self {
        let (component, component_matrix) =
            component.map_or((None, Mat4::IDENTITY), |(id, m)| (Some(id), m));
        Self {
            pid,
            picker,
            instance,
            component,
            component_matrix,
            mouse,
            projection,
        }
    }

    /// Pick id local to the picked buffer.
    #[must_use]
    pub fn pid(&self) -> usize {
        self.pid
    }

    /// Picker that resolved the pick.
    #[must_use]
    pub fn picker(&self) -> &Rc<Picker> {
        &self.picker
    }

    /// Kind of the picked primitive.
    #[must_use]
    pub fn picker_type(&self) -> PickerType {
        self.picker.picker_type()
    }

    /// Instance the primitive was drawn with.
    #[must_use]
    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    /// Component owning the picked buffer.
    #[must_use]
    pub fn component(&self) -> Option<ComponentId> {
        self.component
    }

    /// Model matrix of the owning component at pick time.
    #[must_use]
    pub fn component_matrix(&self) -> Mat4 {
        self.component_matrix
    }

    /// Resolved object.
    #[must_use]
    pub fn object(&self) -> PickedObject {
        self.picker.object(self.pid)
    }

    /// World position of the picked primitive.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.picker
            .position(self.pid, self.instance.as_ref(), self.component_matrix)
    }

    /// Canvas position of the mouse, origin top-left.
    #[must_use]
    pub fn canvas_position(&self) -> Vec2 {
        self.mouse.position
    }

    /// Held modifier keys.
    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        self.mouse.modifiers
    }

    /// Shift was held.
    #[must_use]
    pub fn shift_key(&self) -> bool {
        self.mouse.modifiers.shift()
    }

    /// Control was held.
    #[must_use]
    pub fn ctrl_key(&self) -> bool {
        self.mouse.modifiers.ctrl()
    }

    /// Alt was held.
    #[must_use]
    pub fn alt_key(&self) -> bool {
        self.mouse.modifiers.alt()
    }

    /// Meta was held.
    #[must_use]
    pub fn meta_key(&self) -> bool {
        self.mouse.modifiers.meta()
    }

    typed_accessor!(
        /// Picked atom.
        atom, Atom, AtomProxy
    );
    typed_accessor!(
        /// Picked covalent bond.
        bond, Bond, BondProxy
    );
    typed_accessor!(
        /// Picked contact.
        contact, Contact, BondProxy
    );
    typed_accessor!(
        /// Picked distance measurement.
        distance, Distance, BondProxy
    );
    typed_accessor!(
        /// Picked clash.
        clash, Clash, ClashPick
    );
    typed_accessor!(
        /// Picked volume voxel.
        volume, Volume, VoxelPick
    );
    typed_accessor!(
        /// Picked slice voxel.
        slice, Slice, VoxelPick
    );
    typed_accessor!(
        /// Picked surface.
        surface, Surface, SurfacePick
    );
    typed_accessor!(
        /// Picked shape sphere.
        sphere, Sphere, PrimitivePick
    );
    typed_accessor!(
        /// Picked shape cylinder.
        cylinder, Cylinder, PrimitivePick
    );
    typed_accessor!(
        /// Picked shape cone.
        cone, Cone, PrimitivePick
    );
    typed_accessor!(
        /// Picked shape arrow.
        arrow, Arrow, PrimitivePick
    );
    typed_accessor!(
        /// Picked shape ellipsoid.
        ellipsoid, Ellipsoid, PrimitivePick
    );
    typed_accessor!(
        /// Picked shape mesh.
        mesh, Mesh, MeshPick
    );

    /// For a picked bond (covalent, contact or distance), the atom whose
    /// canvas projection lies closer to the mouse. Ties go to the first
    /// atom.
    #[must_use]
    pub fn closest_bond_atom(&self) -> Option<AtomProxy> {
        let bond = match self.object() {
            PickedObject::Bond(b)
            | PickedObject::Contact(b)
            | PickedObject::Distance(b) => b,
            _ => return None,
        };
        let (a1, a2) = (bond.atom1(), bond.atom2());
        let d1 = self.canvas_distance(a1.position());
        let d2 = self.canvas_distance(a2.position());
        Some(if d2 < d1 { a2 } else { a1 })
    }

    fn canvas_distance(&self, local: Vec3) -> f32 {
        let mut p = local;
        if let Some(instance) = &self.instance {
            p = instance.matrix.transform_point3(p);
        }
        let world = self.component_matrix.transform_point3(p);
        self.projection.project(world).distance(self.mouse.position)
    }

    /// One-line description of the picked object.
    #[must_use]
    pub fn description(&self) -> String {
        match self.object() {
            PickedObject::Atom(a) => format!("atom: {}", a.qualified_name()),
            PickedObject::Bond(b) => format!(
                "bond: {} - {}",
                b.atom1().qualified_name(),
                b.atom2().qualified_name()
            ),
            PickedObject::Contact(b) => format!(
                "contact: {} - {}",
                b.atom1().qualified_name(),
                b.atom2().qualified_name()
            ),
            PickedObject::Distance(b) => format!(
                "distance: {} - {} ({:.2})",
                b.atom1().qualified_name(),
                b.atom2().qualified_name(),
                b.atom1().distance_to(&b.atom2())
            ),
            PickedObject::Clash(c) => {
                format!("clash: {} - {}", c.clash.sele1, c.clash.sele2)
            }
            PickedObject::Volume(v) | PickedObject::Slice(v) => {
                format!("volume: {} ({:.3})", v.index, v.value)
            }
            PickedObject::Surface(s) => format!("surface: {}", s.surface.name()),
            PickedObject::Sphere(p)
            | PickedObject::Cylinder(p)
            | PickedObject::Cone(p)
            | PickedObject::Arrow(p)
            | PickedObject::Ellipsoid(p) => {
                format!("{}: {}", self.picker_type().as_str(), p.name)
            }
            PickedObject::Mesh(m) => format!("mesh: {}", m.name),
            PickedObject::None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    fn projection() -> CanvasProjection {
        // world x in -50..50 maps to canvas 0..100
        CanvasProjection {
            view_projection: Mat4::from_scale(Vec3::splat(1.0 / 50.0)),
            width: 100.0,
            height: 100.0,
        }
    }

    fn mouse_at(x: f32, y: f32) -> MouseSnapshot {
        MouseSnapshot {
            position: Vec2::new(x, y),
            modifiers: Modifiers::SHIFT,
            button: None,
        }
    }

    fn bond_proxy(mouse: MouseSnapshot) -> PickingProxy {
        let s = Rc::new(fixtures::peptide(1));
        let picker = Picker::Bond {
            structure: Rc::clone(&s),
            bonds: Rc::clone(s.bonds()),
            array: None,
        };
        // bond 0 joins N (-1, -0.5, 0) and CA (0, 0, 0)
        PickingProxy::new(0, Rc::new(picker), None, None, mouse, projection())
    }

    #[test]
    fn typed_accessors_match_picker_kind() {
        let proxy = bond_proxy(mouse_at(0.0, 0.0));
        assert!(proxy.bond().is_some());
        assert!(proxy.atom().is_none());
        assert!(proxy.volume().is_none());
        assert_eq!(proxy.picker_type(), PickerType::Bond);
        assert!(proxy.shift_key() && !proxy.ctrl_key());
        assert!(proxy.description().starts_with("bond: "));
    }

    #[test]
    fn closest_bond_atom_follows_the_mouse() {
        // N projects to (49, 50.5), CA to (50, 50)
        let near_n = bond_proxy(mouse_at(48.0, 51.0));
        assert_eq!(near_n.closest_bond_atom().unwrap().name(), "N");
        let near_ca = bond_proxy(mouse_at(51.0, 49.0));
        assert_eq!(near_ca.closest_bond_atom().unwrap().name(), "CA");
    }

    #[test]
    fn closest_bond_atom_needs_a_bond() {
        let s = Rc::new(fixtures::peptide(1));
        let picker = Picker::Atom {
            structure: s,
            array: None,
        };
        let proxy = PickingProxy::new(
            0,
            Rc::new(picker),
            None,
            None,
            mouse_at(0.0, 0.0),
            projection(),
        );
        assert!(proxy.closest_bond_atom().is_none());
        assert!(proxy.atom().is_some());
    }

    #[test]
    fn position_uses_snapshotted_component_matrix() {
        let shape = Rc::new(fixtures::shape());
        let translate = Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0));
        let proxy = PickingProxy::new(
            0,
            Rc::new(Picker::Sphere(shape)),
            None,
            Some((ComponentId::from_raw(7), translate)),
            mouse_at(0.0, 0.0),
            projection(),
        );
        assert_eq!(proxy.position(), Vec3::new(1.0, 2.0, 13.0));
        assert_eq!(proxy.component(), Some(ComponentId::from_raw(7)));
        assert_eq!(proxy.sphere().unwrap().name, "sphere");
    }
}
