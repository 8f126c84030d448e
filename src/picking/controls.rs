//! Turns a canvas position into a [`PickingProxy`].

use super::proxy::PickingProxy;
use crate::stage::Stage;

/// Stateless picking controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct PickingControls;

impl PickingControls {
    /// Pick at canvas position `(x, y)`.
    ///
    /// Returns `None` over the background and for primitives drawn from a
    /// buffer without a picker.
    #[must_use]
    pub fn pick(stage: &Stage, x: f32, y: f32) -> Option<PickingProxy> {
        let data = stage.context().viewer().pick(x, y)?;
        let Some(picker) = data.picker else {
            log::debug!("pick hit buffer {:?} without picker", data.buffer);
            return None;
        };
        let owner = stage.buffer_owner(data.buffer);
        let projection = stage.context().viewer().canvas_projection();
        Some(PickingProxy::new(
            data.pid,
            picker,
            data.instance,
            owner,
            stage.mouse().snapshot(),
            projection,
        ))
    }
}
