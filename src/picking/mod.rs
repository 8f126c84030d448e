//! Mouse picking: per-buffer resolvers, the per-event proxy and the
//! controller that ties a viewer pick to a stage component.
//!
//! The viewer reports which buffer and which pick id lie under a canvas
//! position. The buffer's [`Picker`] turns the pick id into a typed object
//! and a position, and [`PickingControls`] wraps the result together with
//! the mouse state into a [`PickingProxy`].

mod controls;
mod picker;
mod proxy;

pub use controls::PickingControls;
pub use picker::{
    ClashPick, MeshPick, PickedObject, Picker, PickerType, PrimitivePick,
    SurfacePick, VoxelPick,
};
pub use proxy::PickingProxy;
