//! State shared between a stage and the components it owns.

use std::cell::{Cell, RefCell, RefMut};
use std::fmt;

use crate::options::Quality;
use crate::representation::RepresentationRegistry;
use crate::viewer::Viewer;

/// The viewer, the representation registry and the global display
/// defaults, shared by `Rc` between the stage and every component.
pub struct StageContext {
    viewer: RefCell<Box<dyn Viewer>>,
    representations: RepresentationRegistry,
    quality: Cell<Quality>,
    impostor: Cell<bool>,
    next_id: Cell<u64>,
}

impl StageContext {
    /// Context drawing into `viewer`.
    #[must_use]
    pub fn new(viewer: Box<dyn Viewer>, representations: RepresentationRegistry) -> Self {
        Self {
            viewer: RefCell::new(viewer),
            representations,
            quality: Cell::new(Quality::Medium),
            impostor: Cell::new(true),
            next_id: Cell::new(1),
        }
    }

    /// Borrow the viewer. The borrow must not outlive the call it is made
    /// for.
    pub fn viewer(&self) -> RefMut<'_, Box<dyn Viewer>> {
        self.viewer.borrow_mut()
    }

    /// Registered representation kinds.
    #[must_use]
    pub fn representations(&self) -> &RepresentationRegistry {
        &self.representations
    }

    /// Quality new representations are created with.
    #[must_use]
    pub fn quality(&self) -> Quality {
        self.quality.get()
    }

    pub(crate) fn set_quality(&self, quality: Quality) {
        self.quality.set(quality);
    }

    /// Whether new representations draw impostors.
    #[must_use]
    pub fn impostor(&self) -> bool {
        self.impostor.get()
    }

    pub(crate) fn set_impostor(&self, impostor: bool) {
        self.impostor.set(impostor);
    }

    /// Next id for a component, representation or trajectory. Ids are
    /// unique per stage and never reused.
    pub(crate) fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl fmt::Debug for StageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageContext")
            .field("representations", &self.representations.names())
            .field("quality", &self.quality.get())
            .field("impostor", &self.impostor.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::HeadlessViewer;

    #[test]
    fn ids_are_never_reused() {
        let ctx = StageContext::new(
            Box::new(HeadlessViewer::new()),
            RepresentationRegistry::new(),
        );
        let a = ctx.next_id();
        let b = ctx.next_id();
        assert_ne!(a, b);
        assert!(b > a);
    }
}
