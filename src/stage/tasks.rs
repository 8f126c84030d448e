//! Outstanding-task counter with a FIFO queue of idle actions.

use std::collections::VecDeque;
use std::fmt;

use glam::Mat4;

use super::Stage;
use crate::error::StageError;
use crate::viewer::{Image, ImageParams};

/// Receives the result of a deferred `make_image`.
pub type ImageCallback = Box<dyn FnOnce(Result<Image, StageError>)>;

/// Work deferred until no task is outstanding.
pub enum IdleAction {
    /// Center the camera on every component.
    CenterView {
        /// Fit the scene into view.
        zoom: bool,
    },
    /// Restore a camera orientation.
    SetOrientation(Mat4),
    /// Render an image and hand it to the callback.
    MakeImage {
        /// Rendering options.
        params: ImageParams,
        /// Receives the image.
        callback: ImageCallback,
    },
    /// Arbitrary work on the stage.
    Custom(Box<dyn FnOnce(&mut Stage)>),
}

impl fmt::Debug for IdleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CenterView { zoom } => f.debug_struct("CenterView").field("zoom", zoom).finish(),
            Self::SetOrientation(m) => f.debug_tuple("SetOrientation").field(m).finish(),
            Self::MakeImage { params, .. } => {
                f.debug_struct("MakeImage").field("params", params).finish_non_exhaustive()
            }
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Counts outstanding asynchronous tasks and queues idle actions.
#[derive(Debug, Default)]
pub struct TaskCounter {
    count: usize,
    idle: VecDeque<IdleAction>,
}

impl TaskCounter {
    /// Idle counter with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding tasks.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether no task is outstanding.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.count == 0
    }

    /// A task started.
    pub fn increment(&mut self) {
        self.count += 1;
    }

    /// A task finished. Returns `true` when the counter reached zero.
    /// Decrementing an idle counter logs a warning and changes nothing.
    pub fn decrement(&mut self) -> bool {
        if self.count == 0 {
            log::warn!("task counter decremented below zero");
            return false;
        }
        self.count -= 1;
        self.count == 0
    }

    /// Queue an action for the next time the counter is zero.
    pub fn push_idle(&mut self, action: IdleAction) {
        self.idle.push_back(action);
    }

    /// Oldest queued action.
    pub fn pop_idle(&mut self) -> Option<IdleAction> {
        self.idle.pop_front()
    }

    /// Number of queued actions.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.idle.len()
    }

    /// Drop every queued action and reset the count.
    pub fn clear(&mut self) {
        self.count = 0;
        self.idle.clear();
    }
}
