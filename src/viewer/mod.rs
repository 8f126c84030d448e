//! The rendering backend contract.
//!
//! The stage never draws anything itself. It mirrors representation
//! buffers into a [`Viewer`], forwards global settings to it, and asks it
//! which primitive lies under a canvas position. [`HeadlessViewer`]
//! implements the contract without a GPU.

mod headless;
mod pick_map;

use std::rc::Rc;

use glam::{Mat4, Vec2, Vec3};
pub use headless::{HeadlessState, HeadlessViewer};
pub use pick_map::{PickMap, PickTarget};

use crate::buffer::{Buffer, BufferId};
use crate::data::Instance;
use crate::error::StageError;
use crate::options::CameraType;
use crate::picking::Picker;

/// Raw result of a viewer pick.
#[derive(Debug, Clone)]
pub struct PickingData {
    /// Buffer the primitive belongs to.
    pub buffer: BufferId,
    /// Pick id local to the buffer.
    pub pid: usize,
    /// Picker of the buffer; `None` when the buffer is not pickable.
    pub picker: Option<Rc<Picker>>,
    /// Instance the primitive was drawn with.
    pub instance: Option<Instance>,
}

/// World-to-canvas projection, snapshotted with each pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasProjection {
    /// Combined view and projection matrix.
    pub view_projection: Mat4,
    /// Canvas width in pixels.
    pub width: f32,
    /// Canvas height in pixels.
    pub height: f32,
}

impl CanvasProjection {
    /// Canvas position (pixels, origin top-left) of a world point.
    #[must_use]
    pub fn project(&self, world: Vec3) -> Vec2 {
        let ndc = self.view_projection.project_point3(world);
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y) * 0.5 * self.height,
        )
    }
}

/// Lighting sent with [`Viewer::set_light`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// Point light RGB color.
    pub color: [f32; 3],
    /// Point light intensity.
    pub intensity: f32,
    /// Ambient RGB color.
    pub ambient_color: [f32; 3],
    /// Ambient intensity.
    pub ambient_intensity: f32,
}

/// Camera-control speeds sent with [`Viewer::set_control_speeds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpeeds {
    /// Rotation speed.
    pub rotate: f32,
    /// Zoom speed.
    pub zoom: f32,
    /// Pan speed.
    pub pan: f32,
}

/// Screenshot request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageParams {
    /// Resolution multiplier relative to the canvas.
    pub factor: u32,
    /// Supersample the image.
    pub antialias: bool,
    /// Keep the background transparent.
    pub transparent: bool,
    /// Crop to the non-background bounding box.
    pub trim: bool,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            factor: 1,
            antialias: false,
            transparent: false,
            trim: false,
        }
    }
}

/// A rendered image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 pixels, row-major.
    pub rgba: Vec<u8>,
}

/// Rendering backend.
pub trait Viewer {
    /// Primitive under canvas position `(x, y)`, if any.
    fn pick(&mut self, x: f32, y: f32) -> Option<PickingData>;
    /// Start drawing a buffer.
    fn add(&mut self, buffer: &Buffer);
    /// Stop drawing a buffer. Unknown ids are ignored.
    fn remove(&mut self, id: BufferId);
    /// Replace the attributes, parameters and visibility of a drawn buffer.
    fn update(&mut self, buffer: &Buffer);
    /// Schedule a redraw.
    fn request_render(&mut self);
    /// Point the camera at `center`; with `zoom`, fit that extent.
    fn center_view(&mut self, center: Vec3, zoom: Option<f32>);
    /// Clip planes (percent of scene) and clip distance.
    fn set_clip(&mut self, near: f32, far: f32, dist: f32);
    /// Fog range (percent of scene).
    fn set_fog(&mut self, near: f32, far: f32);
    /// Projection type and field of view.
    fn set_camera(&mut self, camera: CameraType, fov: f32);
    /// Camera-control speeds.
    fn set_control_speeds(&mut self, speeds: ControlSpeeds);
    /// Antialiasing sample level.
    fn set_sampling(&mut self, level: i32);
    /// Background color.
    fn set_background(&mut self, color: [f32; 3]);
    /// Point and ambient light.
    fn set_light(&mut self, light: Light);
    /// Restore a camera orientation.
    fn set_orientation(&mut self, orientation: Mat4);
    /// Current camera orientation.
    fn orientation(&self) -> Mat4;
    /// Spin the scene around `axis`; `None` stops spinning.
    fn set_spin(&mut self, axis: Option<Vec3>, angle: f32);
    /// Render an image of the scene.
    fn make_image(&mut self, params: ImageParams) -> Result<Image, StageError>;
    /// Enter or leave fullscreen.
    fn set_fullscreen(&mut self, fullscreen: bool);
    /// The canvas changed size.
    fn handle_resize(&mut self, width: u32, height: u32);
    /// Current world-to-canvas projection.
    fn canvas_projection(&self) -> CanvasProjection;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_maps_ndc_corners_to_canvas() {
        let p = CanvasProjection {
            view_projection: Mat4::IDENTITY,
            width: 200.0,
            height: 100.0,
        };
        assert_eq!(p.project(Vec3::new(-1.0, 1.0, 0.0)), Vec2::ZERO);
        assert_eq!(p.project(Vec3::ZERO), Vec2::new(100.0, 50.0));
        assert_eq!(p.project(Vec3::new(1.0, -1.0, 0.0)), Vec2::new(200.0, 100.0));
    }
}
