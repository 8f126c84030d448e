//! Input handling: platform-agnostic mouse events and the observer that
//! turns them into clicks and hovers.

/// Platform-agnostic input types.
pub mod event;
/// Click, drag and hover tracking.
pub mod mouse;

pub use event::{Modifiers, MouseButton};
pub use mouse::{Click, MouseObserver, MouseSnapshot};
