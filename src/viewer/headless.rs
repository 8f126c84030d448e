//! A viewer without a GPU.
//!
//! Keeps a copy of every attached buffer, records the settings it is sent
//! and resolves picks through a [`PickMap`]. Instead of rasterizing, pick
//! ids are painted onto canvas pixels explicitly. Used for tests and for
//! embedding the stage where nothing is drawn.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;

use super::{
    CanvasProjection, ControlSpeeds, Image, ImageParams, Light, PickMap,
    PickTarget, PickingData, Viewer,
};
use crate::buffer::{Buffer, BufferId};
use crate::error::StageError;
use crate::options::CameraType;

/// Half the height of the default orthographic view volume, in angstroms.
const VIEW_HALF_HEIGHT: f32 = 50.0;

/// Everything a [`HeadlessViewer`] has been told, open for inspection.
#[derive(Debug)]
pub struct HeadlessState {
    /// Attached buffers by id.
    pub buffers: BTreeMap<BufferId, Buffer>,
    /// Number of `add` calls.
    pub adds: usize,
    /// Number of `remove` calls for attached buffers.
    pub removes: usize,
    /// Number of `update` calls for attached buffers.
    pub updates: usize,
    /// Number of render requests.
    pub render_requests: usize,
    /// Every `center_view` call, in order.
    pub centered: Vec<(Vec3, Option<f32>)>,
    /// Last clip settings `(near, far, dist)`.
    pub clip: (f32, f32, f32),
    /// Last fog settings `(near, far)`.
    pub fog: (f32, f32),
    /// Last camera settings.
    pub camera: (CameraType, f32),
    /// Last control speeds.
    pub control_speeds: Option<ControlSpeeds>,
    /// Last sample level.
    pub sample_level: i32,
    /// Last background color.
    pub background: [f32; 3],
    /// Last light settings.
    pub light: Option<Light>,
    /// Camera orientation.
    pub orientation: Mat4,
    /// Spin axis and angle.
    pub spin: Option<(Vec3, f32)>,
    /// Fullscreen flag.
    pub fullscreen: bool,
    /// Canvas size in pixels.
    pub size: (u32, u32),
    /// Number of images rendered.
    pub images: usize,
    /// Make `make_image` fail.
    pub fail_images: bool,
    pick_map: PickMap,
    painted: FxHashMap<(i32, i32), u32>,
}

impl Default for HeadlessState {
    fn default() -> Self {
        Self {
            buffers: BTreeMap::new(),
            adds: 0,
            removes: 0,
            updates: 0,
            render_requests: 0,
            centered: Vec::new(),
            clip: (0.0, 100.0, 10.0),
            fog: (50.0, 100.0),
            camera: (CameraType::Perspective, 40.0),
            control_speeds: None,
            sample_level: 0,
            background: [0.0; 3],
            light: None,
            orientation: Mat4::IDENTITY,
            spin: None,
            fullscreen: false,
            size: (800, 600),
            images: 0,
            fail_images: false,
            pick_map: PickMap::default(),
            painted: FxHashMap::default(),
        }
    }
}

impl HeadlessState {
    fn rebuild_pick_map(&mut self) {
        self.pick_map = PickMap::new(
            self.buffers
                .values()
                .map(|b| (b.id(), b.count(), b.instances().len())),
        );
    }

    /// Paint raw pick id `raw_id` onto the canvas pixel at `(x, y)`.
    pub fn paint(&mut self, x: f32, y: f32, raw_id: u32) {
        let _ = self.painted.insert((x as i32, y as i32), raw_id);
    }

    /// Paint a primitive of an attached buffer onto `(x, y)`. Returns
    /// `false` when the buffer, instance or pick id does not exist.
    pub fn paint_primitive(
        &mut self,
        x: f32,
        y: f32,
        buffer: BufferId,
        instance: usize,
        pid: usize,
    ) -> bool {
        match self.pick_map.raw_id(buffer, instance, pid) {
            Some(raw) => {
                self.paint(x, y, raw);
                true
            }
            None => false,
        }
    }

    /// Attached buffers that are currently visible.
    pub fn visible_buffers(&self) -> impl Iterator<Item = &Buffer> {
        self.buffers.values().filter(|b| b.visible())
    }

    /// Whether a buffer is attached.
    #[must_use]
    pub fn contains(&self, id: BufferId) -> bool {
        self.buffers.contains_key(&id)
    }
}

/// Viewer that renders nothing. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct HeadlessViewer {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessViewer {
    /// Viewer with an 800x600 canvas and nothing attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the recorded state.
    #[must_use]
    pub fn state(&self) -> Rc<RefCell<HeadlessState>> {
        Rc::clone(&self.state)
    }
}

impl Viewer for HeadlessViewer {
    fn pick(&mut self, x: f32, y: f32) -> Option<PickingData> {
        let state = self.state.borrow();
        let raw = *state.painted.get(&(x as i32, y as i32))?;
        let PickTarget::Primitive {
            buffer,
            instance,
            pid,
        } = state.pick_map.resolve(raw)
        else {
            return None;
        };
        let b = state.buffers.get(&buffer).filter(|b| b.visible())?;
        Some(PickingData {
            buffer,
            pid,
            picker: b.picker().cloned(),
            instance: b.instances().get(instance).cloned(),
        })
    }

    fn add(&mut self, buffer: &Buffer) {
        let mut state = self.state.borrow_mut();
        state.adds += 1;
        let _ = state.buffers.insert(buffer.id(), buffer.clone());
        state.rebuild_pick_map();
    }

    fn remove(&mut self, id: BufferId) {
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(&id).is_some() {
            state.removes += 1;
            state.rebuild_pick_map();
        }
    }

    fn update(&mut self, buffer: &Buffer) {
        let mut state = self.state.borrow_mut();
        if let Some(slot) = state.buffers.get_mut(&buffer.id()) {
            *slot = buffer.clone();
            state.updates += 1;
        } else {
            log::debug!("update for unattached buffer {:?}", buffer.id());
        }
    }

    fn request_render(&mut self) {
        self.state.borrow_mut().render_requests += 1;
    }

    fn center_view(&mut self, center: Vec3, zoom: Option<f32>) {
        self.state.borrow_mut().centered.push((center, zoom));
    }

    fn set_clip(&mut self, near: f32, far: f32, dist: f32) {
        self.state.borrow_mut().clip = (near, far, dist);
    }

    fn set_fog(&mut self, near: f32, far: f32) {
        self.state.borrow_mut().fog = (near, far);
    }

    fn set_camera(&mut self, camera: CameraType, fov: f32) {
        self.state.borrow_mut().camera = (camera, fov);
    }

    fn set_control_speeds(&mut self, speeds: ControlSpeeds) {
        self.state.borrow_mut().control_speeds = Some(speeds);
    }

    fn set_sampling(&mut self, level: i32) {
        self.state.borrow_mut().sample_level = level;
    }

    fn set_background(&mut self, color: [f32; 3]) {
        self.state.borrow_mut().background = color;
    }

    fn set_light(&mut self, light: Light) {
        self.state.borrow_mut().light = Some(light);
    }

    fn set_orientation(&mut self, orientation: Mat4) {
        self.state.borrow_mut().orientation = orientation;
    }

    fn orientation(&self) -> Mat4 {
        self.state.borrow().orientation
    }

    fn set_spin(&mut self, axis: Option<Vec3>, angle: f32) {
        self.state.borrow_mut().spin = axis.map(|a| (a, angle));
    }

    fn make_image(&mut self, params: ImageParams) -> Result<Image, StageError> {
        let mut state = self.state.borrow_mut();
        if state.fail_images {
            return Err(StageError::Viewer("image rendering failed".to_owned()));
        }
        state.images += 1;
        let width = state.size.0 * params.factor.max(1);
        let height = state.size.1 * params.factor.max(1);
        let [r, g, b] = state.background.map(|c| (c * 255.0).round() as u8);
        let a = if params.transparent { 0 } else { 255 };
        let rgba = [r, g, b, a].repeat((width * height) as usize);
        Ok(Image {
            width,
            height,
            rgba,
        })
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.state.borrow_mut().fullscreen = fullscreen;
    }

    fn handle_resize(&mut self, width: u32, height: u32) {
        self.state.borrow_mut().size = (width, height);
    }

    fn canvas_projection(&self) -> CanvasProjection {
        let state = self.state.borrow();
        let (w, h) = (state.size.0 as f32, state.size.1 as f32);
        let half_w = VIEW_HALF_HEIGHT * w / h.max(1.0);
        let projection = Mat4::orthographic_rh(
            -half_w,
            half_w,
            -VIEW_HALF_HEIGHT,
            VIEW_HALF_HEIGHT,
            -1000.0,
            1000.0,
        );
        CanvasProjection {
            view_projection: projection * state.orientation,
            width: w,
            height: h,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::buffer::BufferKind;
    use crate::data::fixtures;
    use crate::picking::Picker;

    #[test]
    fn painted_primitive_resolves_to_picker() {
        let mut viewer = HeadlessViewer::new();
        let s = Rc::new(fixtures::peptide(1));
        let buffer = Buffer::new(BufferKind::Sphere, vec![0.0; 9]).with_picker(
            Picker::Atom {
                structure: s,
                array: None,
            },
        );
        viewer.add(&buffer);
        let state = viewer.state();
        assert!(state.borrow_mut().paint_primitive(10.0, 20.0, buffer.id(), 0, 2));
        let hit = viewer.pick(10.0, 20.0).unwrap();
        assert_eq!((hit.buffer, hit.pid), (buffer.id(), 2));
        assert!(hit.picker.is_some());
        assert!(viewer.pick(11.0, 20.0).is_none());
    }

    #[test]
    fn hidden_and_removed_buffers_are_not_picked() {
        let mut viewer = HeadlessViewer::new();
        let mut buffer = Buffer::new(BufferKind::Point, vec![0.0; 3]);
        viewer.add(&buffer);
        let state = viewer.state();
        assert!(state.borrow_mut().paint_primitive(1.0, 1.0, buffer.id(), 0, 0));
        buffer.set_visibility(false);
        viewer.update(&buffer);
        assert!(viewer.pick(1.0, 1.0).is_none());
        viewer.remove(buffer.id());
        assert!(!state.borrow().contains(buffer.id()));
        assert_eq!(state.borrow().removes, 1);
    }

    #[test]
    fn image_uses_background_and_factor() {
        let mut viewer = HeadlessViewer::new();
        viewer.handle_resize(2, 1);
        viewer.set_background([1.0, 0.0, 0.0]);
        let image = viewer
            .make_image(ImageParams {
                factor: 2,
                ..ImageParams::default()
            })
            .unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(&image.rgba[..4], &[255, 0, 0, 255]);
        viewer.state().borrow_mut().fail_images = true;
        assert!(viewer.make_image(ImageParams::default()).is_err());
    }
}
