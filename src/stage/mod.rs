//! The stage: components, global parameters, loading and mouse wiring.
//!
//! A [`Stage`] owns an ordered list of [`Component`]s and shares a
//! [`StageContext`] (viewer, representation registry, display defaults)
//! with them. Loading is asynchronous: [`Stage::load_file`] takes the stage
//! as `&RefCell<Stage>` and only borrows it between suspension points.
//! Camera work that should see the whole scene waits in the
//! [`TaskCounter`]'s idle queue until every load has finished.

mod context;
mod defaults;
mod loader;
mod tasks;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub use context::StageContext;
use glam::{Mat4, Vec3};
pub use loader::{
    file_info, LoadFuture, LoadParams, LoadedObject, Loader, MemoryLoader, ObjectData,
};
use serde_json::{Map, Value};
pub use tasks::{IdleAction, ImageCallback, TaskCounter};
use web_time::Instant;

use crate::buffer::BufferId;
use crate::component::{
    Component, ComponentData, ComponentId, ComponentRegistry, ComponentStatus, ReprId,
    Script,
};
use crate::data::bounds;
use crate::error::StageError;
use crate::input::{Modifiers, MouseButton, MouseObserver};
use crate::options::{Quality, StageParameters, STAGE_PARAMS};
use crate::params::{merge, validate};
use crate::picking::{PickingControls, PickingProxy};
use crate::representation::{RepresentationRegistry, IMPOSTOR_TYPES, QUALITY_TYPES};
use crate::signal::Signal;
use crate::viewer::{ControlSpeeds, Image, ImageParams, Light, Viewer};

/// Events of a [`Stage`].
#[derive(Debug, Default)]
pub struct StageSignals {
    /// A component was added.
    pub component_added: Signal<ComponentId>,
    /// A component was removed and disposed.
    pub component_removed: Signal<ComponentId>,
    /// A click completed; `None` over the background.
    pub clicked: Signal<Option<PickingProxy>>,
    /// The pointer rested for the hover timeout; `None` over the
    /// background.
    pub hovered: Signal<Option<PickingProxy>>,
    /// Accepted entries of a stage parameter patch.
    pub parameters_changed: Signal<Map<String, Value>>,
    /// Fullscreen was entered or left.
    pub fullscreen_changed: Signal<bool>,
}

impl StageSignals {
    fn clear(&mut self) {
        self.component_added.clear();
        self.component_removed.clear();
        self.clicked.clear();
        self.hovered.clear();
        self.parameters_changed.clear();
        self.fullscreen_changed.clear();
    }
}

/// Owns the components and drives the viewer.
pub struct Stage {
    ctx: Rc<StageContext>,
    components: Vec<Component>,
    tasks: TaskCounter,
    parameters: StageParameters,
    mouse: MouseObserver,
    loader: Box<dyn Loader>,
    component_registry: ComponentRegistry,
    fullscreen: bool,
    /// Stage-level events.
    pub signals: StageSignals,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("components", &self.components.len())
            .field("tasks", &self.tasks)
            .field("parameters", &self.parameters)
            .field("fullscreen", &self.fullscreen)
            .finish_non_exhaustive()
    }
}

fn single(key: &str, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    let _ = map.insert(key.to_owned(), value);
    map
}

impl Stage {
    /// Stage with the built-in representation and component types and
    /// default parameters.
    #[must_use]
    pub fn new(viewer: Box<dyn Viewer>, loader: Box<dyn Loader>) -> Self {
        Self::with_registries(
            viewer,
            loader,
            RepresentationRegistry::with_defaults(),
            ComponentRegistry::with_defaults(),
            StageParameters::default(),
        )
    }

    /// Stage with explicit registries and initial parameters. Every
    /// parameter is pushed to the viewer.
    #[must_use]
    pub fn with_registries(
        viewer: Box<dyn Viewer>,
        loader: Box<dyn Loader>,
        representations: RepresentationRegistry,
        components: ComponentRegistry,
        parameters: StageParameters,
    ) -> Self {
        let ctx = Rc::new(StageContext::new(viewer, representations));
        ctx.set_quality(parameters.quality);
        ctx.set_impostor(parameters.impostor);
        let mut stage = Self {
            ctx,
            components: Vec::new(),
            tasks: TaskCounter::new(),
            mouse: MouseObserver::new(parameters.hover_timeout),
            parameters,
            loader,
            component_registry: components,
            fullscreen: false,
            signals: StageSignals::default(),
        };
        stage.push_parameters();
        stage
    }

    /// Viewer, registry and defaults shared with the components.
    #[must_use]
    pub fn context(&self) -> &Rc<StageContext> {
        &self.ctx
    }

    /// Pointer state.
    #[must_use]
    pub fn mouse(&self) -> &MouseObserver {
        &self.mouse
    }

    /// Outstanding tasks and queued idle actions.
    #[must_use]
    pub fn tasks(&self) -> &TaskCounter {
        &self.tasks
    }

    // -- Components ------------------------------------------------------

    /// Components in insertion order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Component `id`.
    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| c.id() == id)
    }

    /// Mutable access to component `id`.
    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id() == id)
    }

    /// Append a component and dispatch `component_added`.
    pub fn add_component(&mut self, component: Component) -> ComponentId {
        let id = component.id();
        self.components.push(component);
        self.signals.component_added.dispatch(&id);
        id
    }

    /// Create a component from in-memory data and append it.
    pub fn add_component_from_data(&mut self, name: &str, data: ComponentData) -> ComponentId {
        let mut component = Component::new(&self.ctx, name, data);
        component.set_status(ComponentStatus::Loaded);
        self.add_component(component)
    }

    /// Dispose and drop a component, then dispatch `component_removed`.
    /// Returns `false` when `id` is not on the stage.
    pub fn remove_component(&mut self, id: ComponentId) -> bool {
        let Some(index) = self.components.iter().position(|c| c.id() == id) else {
            return false;
        };
        let mut component = self.components.remove(index);
        component.dispose();
        self.signals.component_removed.dispatch(&id);
        self.ctx.viewer().request_render();
        true
    }

    /// Remove every component, or only those of data kind `kind`
    /// (`"structure"`, `"surface"`, ...).
    pub fn remove_all_components(&mut self, kind: Option<&str>) {
        let ids: Vec<ComponentId> = self
            .components
            .iter()
            .filter(|c| kind.is_none_or(|k| c.kind() == k))
            .map(Component::id)
            .collect();
        for id in ids {
            let _ = self.remove_component(id);
        }
    }

    /// Ids of components named `name`.
    #[must_use]
    pub fn components_by_name(&self, name: &str) -> Vec<ComponentId> {
        self.components
            .iter()
            .filter(|c| c.name() == name)
            .map(Component::id)
            .collect()
    }

    /// Representations named `name`, with the component owning them.
    #[must_use]
    pub fn representations_by_name(&self, name: &str) -> Vec<(ComponentId, ReprId)> {
        self.components
            .iter()
            .flat_map(|c| {
                c.all_representations()
                    .filter(|r| r.name() == name)
                    .map(move |r| (c.id(), r.id()))
            })
            .collect()
    }

    /// Component owning buffer `id`, with its model matrix.
    #[must_use]
    pub fn buffer_owner(&self, id: BufferId) -> Option<(ComponentId, Mat4)> {
        self.components
            .iter()
            .find(|c| c.owns_buffer(id))
            .map(|c| (c.id(), c.matrix()))
    }

    // -- Loading ---------------------------------------------------------

    /// Load `path` through the stage's loader.
    ///
    /// A placeholder component appears immediately and counts as a task.
    /// On success it is replaced by a component built from the object's
    /// type; unregistered types log a warning and yield `Ok(None)`, as does
    /// a placeholder removed while the load was in flight. On failure the
    /// placeholder keeps an error status and the error is returned.
    /// `dcd` files are refused: trajectories attach to structure
    /// components.
    pub async fn load_file(
        stage: &RefCell<Self>,
        path: &str,
        params: &LoadParams,
    ) -> Result<Option<ComponentId>, StageError> {
        let (file_name, file_ext) = file_info(path);
        let ext = params.ext.clone().unwrap_or(file_ext);
        let (placeholder, future) = {
            let mut s = stage.borrow_mut();
            let name = params.name.as_deref().unwrap_or(&file_name);
            let mut component = Component::new(&s.ctx, name, ComponentData::Placeholder);
            component.set_status(ComponentStatus::Loading);
            let id = s.add_component(component);
            s.tasks.increment();
            let future: LoadFuture = if ext == "dcd" {
                Box::pin(std::future::ready(Err(StageError::Load {
                    path: path.to_owned(),
                    reason: "ext 'dcd' must be loaded into a structure component".to_owned(),
                })))
            } else {
                s.loader.auto_load(path, params)
            };
            (id, future)
        };

        let result = future.await;

        let mut s = stage.borrow_mut();
        let outcome = s.finish_load(placeholder, path, params, result);
        s.decrement_tasks();
        outcome
    }

    fn finish_load(
        &mut self,
        placeholder: ComponentId,
        path: &str,
        params: &LoadParams,
        result: Result<LoadedObject, StageError>,
    ) -> Result<Option<ComponentId>, StageError> {
        let object = match result {
            Ok(object) => object,
            Err(e) => {
                let reason = match &e {
                    StageError::Load { reason, .. } => reason.clone(),
                    other => other.to_string(),
                };
                log::error!("loading '{path}' failed: {reason}");
                if let Some(c) = self.component_mut(placeholder) {
                    c.set_status(ComponentStatus::Error(reason));
                }
                return Err(e);
            }
        };
        if !self.remove_component(placeholder) {
            log::debug!("placeholder for '{path}' was removed, dropping the loaded object");
            return Ok(None);
        }

        let object = LoadedObject {
            name: params.name.clone().unwrap_or(object.name),
            data: object.data,
        };
        let Some(mut component) = self.component_registry.create(&self.ctx, object) else {
            return Ok(None);
        };
        component.set_status(ComponentStatus::Loaded);
        let kind = component.kind();
        let id = self.add_component(component);
        log::info!("loaded '{path}' as {kind} component");

        let _ = self.run_script(id);
        if params.default_representation {
            defaults::apply(self, id);
        }
        Ok(Some(id))
    }

    /// Run the script of component `id` against the stage. Returns `false`
    /// when `id` is not a script component.
    pub fn run_script(&mut self, id: ComponentId) -> bool {
        let Some(run) = self
            .component(id)
            .and_then(Component::script)
            .map(Script::callback)
        else {
            return false;
        };
        run(self);
        true
    }

    // -- Tasks -----------------------------------------------------------

    /// Count an outstanding task started by the embedding application.
    pub fn increment_tasks(&mut self) {
        self.tasks.increment();
    }

    /// Finish a task. When none remain, queued idle actions run in
    /// registration order.
    pub fn decrement_tasks(&mut self) {
        if self.tasks.decrement() {
            self.run_idle_actions();
        }
    }

    fn run_idle_actions(&mut self) {
        while self.tasks.is_idle() {
            let Some(action) = self.tasks.pop_idle() else {
                break;
            };
            self.run_action(action);
        }
    }

    /// Run `action` now when idle, otherwise when the last task finishes.
    pub fn defer(&mut self, action: IdleAction) {
        if self.tasks.is_idle() {
            self.run_action(action);
        } else {
            self.tasks.push_idle(action);
        }
    }

    /// Run `f` now when idle, otherwise when the last task finishes.
    pub fn on_idle(&mut self, f: impl FnOnce(&mut Self) + 'static) {
        self.defer(IdleAction::Custom(Box::new(f)));
    }

    fn run_action(&mut self, action: IdleAction) {
        match action {
            IdleAction::CenterView { zoom } => self.center_now(zoom),
            IdleAction::SetOrientation(orientation) => {
                let mut viewer = self.ctx.viewer();
                viewer.set_orientation(orientation);
                viewer.request_render();
            }
            IdleAction::MakeImage { params, callback } => {
                self.tasks.increment();
                let result = self.ctx.viewer().make_image(params);
                if let Err(e) = &result {
                    log::error!("make_image failed: {e}");
                }
                callback(result);
                self.decrement_tasks();
            }
            IdleAction::Custom(f) => f(self),
        }
    }

    // -- Camera ----------------------------------------------------------

    /// Center the camera on every visible component; with `zoom`, fit them
    /// into view. Deferred while tasks are outstanding.
    pub fn center_view(&mut self, zoom: bool) {
        self.defer(IdleAction::CenterView { zoom });
    }

    fn center_now(&self, zoom: bool) {
        let spheres: Vec<(Vec3, f32)> = self
            .components
            .iter()
            .filter(|c| c.visible())
            .filter_map(|c| c.bounding_sphere(None))
            .collect();
        let corners = spheres.iter().flat_map(|&(c, e)| {
            let h = Vec3::splat(e * 0.5);
            [c - h, c + h]
        });
        let Some((min, max)) = bounds(corners) else {
            log::debug!("center_view: nothing on the stage");
            return;
        };
        let center = (min + max) * 0.5;
        let extent = spheres
            .iter()
            .map(|&(c, e)| 2.0 * c.distance(center) + e)
            .fold(0.0_f32, f32::max);
        let mut viewer = self.ctx.viewer();
        viewer.center_view(center, zoom.then_some(extent));
        viewer.request_render();
    }

    /// Restore a camera orientation once no task is outstanding.
    pub fn set_orientation(&mut self, orientation: Mat4) {
        self.defer(IdleAction::SetOrientation(orientation));
    }

    /// Current camera orientation.
    #[must_use]
    pub fn orientation(&self) -> Mat4 {
        self.ctx.viewer().orientation()
    }

    /// Render an image once no task is outstanding. Rendering itself
    /// counts as a task.
    pub fn make_image(
        &mut self,
        params: ImageParams,
        callback: impl FnOnce(Result<Image, StageError>) + 'static,
    ) {
        self.defer(IdleAction::MakeImage {
            params,
            callback: Box::new(callback),
        });
    }

    /// Spin the scene around `axis`; `None` stops spinning.
    pub fn set_spin(&mut self, axis: Option<Vec3>, angle: f32) {
        let mut viewer = self.ctx.viewer();
        viewer.set_spin(axis, angle);
        viewer.request_render();
    }

    /// Enter or leave fullscreen and dispatch `fullscreen_changed`.
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
        self.ctx.viewer().set_fullscreen(self.fullscreen);
        self.signals.fullscreen_changed.dispatch(&self.fullscreen);
    }

    /// Whether the stage is fullscreen.
    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// The canvas changed size.
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        let mut viewer = self.ctx.viewer();
        viewer.handle_resize(width, height);
        viewer.request_render();
    }

    // -- Parameters ------------------------------------------------------

    /// Current stage parameters.
    #[must_use]
    pub fn parameters(&self) -> &StageParameters {
        &self.parameters
    }

    /// Apply a stage parameter patch.
    ///
    /// Keys are checked against [`STAGE_PARAMS`]. `impostor` and `quality`
    /// go through [`Stage::set_impostor`] and [`Stage::set_quality`];
    /// everything else is pushed to the viewer and the mouse observer.
    pub fn set_parameters(&mut self, patch: &Map<String, Value>) {
        let (accepted, _) = validate(&[STAGE_PARAMS], patch, "stage");
        if accepted.is_empty() {
            return;
        }
        let previous = self.parameters.clone();
        if let Err(e) = merge(&mut self.parameters, &accepted) {
            log::warn!("stage: {e}");
            return;
        }
        let impostor = self.parameters.impostor;
        let quality = self.parameters.quality;
        self.parameters.impostor = previous.impostor;
        self.parameters.quality = previous.quality;
        if accepted.contains_key("impostor") {
            self.set_impostor(impostor);
        }
        if accepted.contains_key("quality") {
            self.set_quality(quality);
        }
        self.push_parameters();
        self.signals.parameters_changed.dispatch(&accepted);
    }

    fn push_parameters(&mut self) {
        let p = &self.parameters;
        self.mouse.set_hover_timeout(p.hover_timeout);
        let mut viewer = self.ctx.viewer();
        viewer.set_clip(p.clip_near, p.clip_far, p.clip_dist);
        viewer.set_fog(p.fog_near, p.fog_far);
        viewer.set_camera(p.camera_type, p.camera_fov);
        viewer.set_control_speeds(ControlSpeeds {
            rotate: p.rotate_speed,
            zoom: p.zoom_speed,
            pan: p.pan_speed,
        });
        viewer.set_sampling(p.sample_level);
        viewer.set_background(p.background_color);
        viewer.set_light(Light {
            color: p.light_color,
            intensity: p.light_intensity,
            ambient_color: p.ambient_color,
            ambient_intensity: p.ambient_intensity,
        });
        viewer.request_render();
    }

    /// Change the geometry detail level.
    ///
    /// Quality-only kinds rebuild. Impostor-capable kinds rebuild when
    /// their own `disable_impostor` is set; otherwise only their stored
    /// quality changes. Other kinds are untouched.
    pub fn set_quality(&mut self, quality: Quality) {
        self.parameters.quality = quality;
        self.ctx.set_quality(quality);
        let patch = single(
            "quality",
            serde_json::to_value(quality).unwrap_or(Value::Null),
        );
        for c in &mut self.components {
            c.for_each_representation_mut(|r| {
                let kind = r.type_name();
                if QUALITY_TYPES.contains(&kind) {
                    r.set_parameters(&patch);
                } else if IMPOSTOR_TYPES.contains(&kind) {
                    if r.impostor_disabled() {
                        r.set_parameters(&patch);
                    } else {
                        r.set_quality_in_place(quality);
                    }
                }
            });
        }
    }

    /// Switch impostor rendering. Impostor-capable kinds rebuild with
    /// `disable_impostor = !impostor`; nothing else is touched.
    pub fn set_impostor(&mut self, impostor: bool) {
        self.parameters.impostor = impostor;
        self.ctx.set_impostor(impostor);
        let patch = single("disable_impostor", Value::Bool(!impostor));
        for c in &mut self.components {
            c.for_each_representation_mut(|r| {
                if IMPOSTOR_TYPES.contains(&r.type_name()) {
                    r.set_parameters(&patch);
                }
            });
        }
    }

    // -- Picking and mouse -----------------------------------------------

    /// What is under canvas position `(x, y)`.
    #[must_use]
    pub fn pick(&self, x: f32, y: f32) -> Option<PickingProxy> {
        PickingControls::pick(self, x, y)
    }

    /// Pointer moved.
    pub fn handle_mouse_move(&mut self, x: f32, y: f32, now: Instant) {
        self.mouse.handle_move(x, y, now);
    }

    /// Button pressed.
    pub fn handle_mouse_down(&mut self, button: MouseButton) {
        self.mouse.handle_down(button);
    }

    /// Button released. A click (no drag) picks and dispatches `clicked`.
    pub fn handle_mouse_up(&mut self, button: MouseButton) {
        if let Some(click) = self.mouse.handle_up(button) {
            let proxy = self.pick(click.position.x, click.position.y);
            self.signals.clicked.dispatch(&proxy);
        }
    }

    /// Pointer left the canvas.
    pub fn handle_mouse_leave(&mut self) {
        self.mouse.handle_leave();
    }

    /// Held modifier keys changed.
    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.mouse.set_modifiers(modifiers);
    }

    /// Advance time: fire a due hover and step playing trajectories.
    pub fn tick(&mut self, now: Instant) {
        if self.mouse.hover_due(now) {
            let position = self.mouse.position();
            let proxy = self.pick(position.x, position.y);
            self.signals.hovered.dispatch(&proxy);
        }
        for c in &mut self.components {
            let _ = c.tick(now);
        }
    }

    /// Remove every component, drop queued idle actions and all listeners.
    pub fn dispose(&mut self) {
        self.remove_all_components(None);
        self.tasks.clear();
        self.signals.clear();
    }
}
