//! Components: one loaded data object and everything drawn from it.
//!
//! A [`Component`] owns its data (structure, surface, volume, shape or
//! script), a model matrix, the [`RepresentationComponent`]s built from the
//! data and, for structures, attached [`TrajectoryComponent`]s. Each
//! representation component has exactly one owner; disposing the owner
//! disposes it.

mod registry;
mod representation;
mod trajectory;

use std::fmt;
use std::rc::Rc;

use glam::{Mat4, Quat, Vec3};
pub use registry::{ComponentFactory, ComponentRegistry};
pub use representation::{RepresentationComponent, RepresentationSignals};
use serde_json::{Map, Value};
pub use trajectory::{TrajectoryComponent, TrajectoryPlayer, TrajectorySignals};
use web_time::Instant;

use crate::buffer::BufferId;
use crate::data::{
    bounds, vec3_at, Selection, Shape, Structure, StructureView, Surface, Trajectory,
    Validation, Volume,
};
use crate::params::What;
use crate::representation::{RepresentationSource, StructureSource};
use crate::signal::Signal;
use crate::stage::{Stage, StageContext};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw id.
            #[must_use]
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Raw id value.
            #[must_use]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

id_type!(
    /// Stage-unique component id.
    ComponentId
);
id_type!(
    /// Stage-unique representation id.
    ReprId
);
id_type!(
    /// Stage-unique trajectory attachment id.
    TrajectoryId
);

/// Load state of a component.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ComponentStatus {
    /// Nothing requested yet.
    #[default]
    Unloaded,
    /// A load is in flight.
    Loading,
    /// Data is available.
    Loaded,
    /// The load failed. Final.
    Error(String),
}

/// A callback run against the stage, loaded from a script file.
#[derive(Clone)]
pub struct Script {
    name: String,
    run: Rc<dyn Fn(&mut Stage)>,
}

impl Script {
    /// Named script.
    #[must_use]
    pub fn new(name: &str, run: impl Fn(&mut Stage) + 'static) -> Self {
        Self {
            name: name.to_owned(),
            run: Rc::new(run),
        }
    }

    /// Script name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn callback(&self) -> Rc<dyn Fn(&mut Stage)> {
        Rc::clone(&self.run)
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Structure data of a component.
#[derive(Debug, Clone)]
pub struct StructureData {
    /// Current coordinates and topology.
    pub structure: Rc<Structure>,
    /// Atoms the component exposes to its representations.
    pub selection: Selection,
    /// Attached validation report.
    pub validation: Option<Rc<Validation>>,
}

/// The data object a component wraps.
#[derive(Debug, Clone)]
pub enum ComponentData {
    /// Stand-in while a load is in flight, and after disposal.
    Placeholder,
    /// A molecular structure.
    Structure(StructureData),
    /// A triangulated surface.
    Surface(Rc<Surface>),
    /// A volumetric grid.
    Volume(Rc<Volume>),
    /// Shape primitives.
    Shape(Rc<Shape>),
    /// A script run on load.
    Script(Script),
}

impl ComponentData {
    /// Structure data over every atom of `structure`.
    #[must_use]
    pub fn structure(structure: Rc<Structure>) -> Self {
        Self::Structure(StructureData {
            structure,
            selection: Selection::all(),
            validation: None,
        })
    }

    /// Kind name, used by `Stage::remove_all_components`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Placeholder => "placeholder",
            Self::Structure(_) => "structure",
            Self::Surface(_) => "surface",
            Self::Volume(_) => "volume",
            Self::Shape(_) => "shape",
            Self::Script(_) => "script",
        }
    }

    fn source(&self) -> Option<RepresentationSource> {
        Some(match self {
            Self::Structure(d) => RepresentationSource::Structure(StructureSource {
                view: StructureView::new(Rc::clone(&d.structure), &d.selection),
                validation: d.validation.clone(),
                trajectory: None,
            }),
            Self::Surface(s) => RepresentationSource::Surface(Rc::clone(s)),
            Self::Volume(v) => RepresentationSource::Volume(Rc::clone(v)),
            Self::Shape(s) => RepresentationSource::Shape(Rc::clone(s)),
            Self::Placeholder | Self::Script(_) => return None,
        })
    }

    /// Local center and extent (bounding-box diagonal) of the data, or of
    /// the atoms matching `sele` for structures.
    fn extent(&self, sele: Option<&str>) -> Option<(Vec3, f32)> {
        match self {
            Self::Structure(d) => {
                let selection = sele.map_or_else(|| d.selection.clone(), Selection::new);
                d.structure.selection_extent(&selection)
            }
            Self::Surface(s) => bounds((0..s.vertex_count()).map(|i| vec3_at(s.position(), i)))
                .map(|(min, max)| ((min + max) * 0.5, (max - min).length())),
            Self::Volume(v) => {
                let (x, y, z) = v.dimensions();
                if v.voxel_count() == 0 {
                    return None;
                }
                let a = v.grid_position(0, 0, 0);
                let b = v.grid_position(x - 1, y - 1, z - 1);
                Some(((a + b) * 0.5, (b - a).length()))
            }
            Self::Shape(s) => Some((s.center(), 0.0)),
            Self::Placeholder | Self::Script(_) => None,
        }
    }
}

/// Events of a [`Component`].
#[derive(Debug, Default)]
pub struct ComponentSignals {
    /// A representation was added.
    pub representation_added: Signal<ReprId>,
    /// A representation was removed.
    pub representation_removed: Signal<ReprId>,
    /// Visibility flag changed.
    pub visibility_changed: Signal<bool>,
    /// Load status changed.
    pub status_changed: Signal<ComponentStatus>,
    /// Name changed.
    pub name_changed: Signal<String>,
    /// Model matrix changed.
    pub matrix_changed: Signal<Mat4>,
    /// A trajectory was attached.
    pub trajectory_added: Signal<TrajectoryId>,
    /// A trajectory was detached.
    pub trajectory_removed: Signal<TrajectoryId>,
    /// The component was disposed.
    pub disposed: Signal<()>,
}

impl ComponentSignals {
    fn clear(&mut self) {
        self.representation_added.clear();
        self.representation_removed.clear();
        self.visibility_changed.clear();
        self.status_changed.clear();
        self.name_changed.clear();
        self.matrix_changed.clear();
        self.trajectory_added.clear();
        self.trajectory_removed.clear();
        self.disposed.clear();
    }
}

/// One data object on the stage.
#[derive(Debug)]
pub struct Component {
    id: ComponentId,
    ctx: Rc<StageContext>,
    name: String,
    tags: Vec<String>,
    status: ComponentStatus,
    data: ComponentData,
    visible: bool,
    position: Vec3,
    rotation: Quat,
    scale: f32,
    reprs: Vec<RepresentationComponent>,
    trajectories: Vec<TrajectoryComponent>,
    disposed: bool,
    /// Lifecycle events.
    pub signals: ComponentSignals,
}

impl Component {
    /// Component over `data`, visible, with an identity matrix.
    #[must_use]
    pub fn new(ctx: &Rc<StageContext>, name: &str, data: ComponentData) -> Self {
        Self {
            id: ComponentId(ctx.next_id()),
            ctx: Rc::clone(ctx),
            name: name.to_owned(),
            tags: Vec::new(),
            status: ComponentStatus::Unloaded,
            data,
            visible: true,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            reprs: Vec::new(),
            trajectories: Vec::new(),
            disposed: false,
            signals: ComponentSignals::default(),
        }
    }

    /// Stage-unique id.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename and dispatch `name_changed`.
    pub fn set_name(&mut self, name: &str) {
        name.clone_into(&mut self.name);
        self.signals.name_changed.dispatch(&self.name);
    }

    /// Free-form tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Add a tag unless already present.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_owned());
        }
    }

    /// Load state.
    #[must_use]
    pub fn status(&self) -> &ComponentStatus {
        &self.status
    }

    /// Change the load state. An error status is final.
    pub fn set_status(&mut self, status: ComponentStatus) {
        if let ComponentStatus::Error(reason) = &self.status {
            log::warn!(
                "component '{}' stays in error state ({reason}), ignoring {status:?}",
                self.name
            );
            return;
        }
        self.status = status;
        self.signals.status_changed.dispatch(&self.status);
    }

    /// The wrapped data.
    #[must_use]
    pub fn data(&self) -> &ComponentData {
        &self.data
    }

    /// Kind name of the wrapped data.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.data.kind()
    }

    /// Current structure, for structure components.
    #[must_use]
    pub fn structure(&self) -> Option<&Rc<Structure>> {
        match &self.data {
            ComponentData::Structure(d) => Some(&d.structure),
            _ => None,
        }
    }

    /// The script, for script components.
    #[must_use]
    pub fn script(&self) -> Option<&Script> {
        match &self.data {
            ComponentData::Script(s) => Some(s),
            _ => None,
        }
    }

    /// Own visibility flag.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Whether [`Component::dispose`] has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Model matrix: scale, then rotation, then translation.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, self.position)
    }

    /// Translate the component.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.matrix_updated();
    }

    /// Rotate the component.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.matrix_updated();
    }

    /// Uniformly scale the component.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.matrix_updated();
    }

    fn matrix_updated(&mut self) {
        let matrix = self.matrix();
        for r in &mut self.reprs {
            r.set_matrix(matrix);
        }
        for t in &mut self.trajectories {
            t.set_matrix(matrix);
        }
        self.signals.matrix_changed.dispatch(&matrix);
        self.ctx.viewer().request_render();
    }

    /// Build a representation of kind `type_name` and attach it.
    ///
    /// Stage quality and impostor settings apply unless `params` sets
    /// `quality` or `disable_impostor`. Unknown kinds, and kinds that
    /// cannot display this component's data, log a warning and return
    /// `None`.
    pub fn add_representation(
        &mut self,
        type_name: &str,
        params: &Map<String, Value>,
    ) -> Option<ReprId> {
        if self.disposed {
            return None;
        }
        let Some(source) = self.data.source() else {
            log::warn!(
                "component '{}' has no data to represent as '{type_name}'",
                self.name
            );
            return None;
        };
        let repr = RepresentationComponent::create(
            &self.ctx,
            type_name,
            params,
            source,
            self.visible,
            self.matrix(),
        )?;
        let id = repr.id();
        self.reprs.push(repr);
        self.signals.representation_added.dispatch(&id);
        Some(id)
    }

    /// Dispose and drop a representation. Returns `false` when `id` is not
    /// owned by this component.
    pub fn remove_representation(&mut self, id: ReprId) -> bool {
        let Some(index) = self.reprs.iter().position(|r| r.id() == id) else {
            return false;
        };
        let mut repr = self.reprs.remove(index);
        repr.dispose();
        self.signals.representation_removed.dispatch(&id);
        true
    }

    /// Representations owned directly by this component.
    #[must_use]
    pub fn representations(&self) -> &[RepresentationComponent] {
        &self.reprs
    }

    /// Owned representation `id`, including those of trajectories.
    #[must_use]
    pub fn representation(&self, id: ReprId) -> Option<&RepresentationComponent> {
        self.all_representations().find(|r| r.id() == id)
    }

    /// Mutable access to representation `id`, including those of
    /// trajectories.
    pub fn representation_mut(&mut self, id: ReprId) -> Option<&mut RepresentationComponent> {
        if let Some(index) = self.reprs.iter().position(|r| r.id() == id) {
            return self.reprs.get_mut(index);
        }
        self.trajectories
            .iter_mut()
            .flat_map(|t| t.representations_mut().iter_mut())
            .find(|r| r.id() == id)
    }

    /// Every representation, own ones first, then those of each
    /// trajectory.
    pub fn all_representations(&self) -> impl Iterator<Item = &RepresentationComponent> {
        self.reprs
            .iter()
            .chain(self.trajectories.iter().flat_map(|t| t.representations().iter()))
    }

    /// Run `f` on every representation, including those of trajectories.
    pub fn for_each_representation_mut(&mut self, mut f: impl FnMut(&mut RepresentationComponent)) {
        for r in &mut self.reprs {
            f(r);
        }
        for t in &mut self.trajectories {
            for r in t.representations_mut() {
                f(r);
            }
        }
    }

    /// Rewrite attribute groups of every own representation in place.
    pub fn update_representations(&mut self, what: What) {
        for r in &mut self.reprs {
            r.update(what);
        }
    }

    /// Set the visibility flag and propagate it to every representation
    /// and trajectory.
    pub fn set_visibility(&mut self, visible: bool) {
        self.visible = visible;
        for r in &mut self.reprs {
            r.set_parent_visibility(visible);
        }
        for t in &mut self.trajectories {
            t.set_parent_visibility(visible);
        }
        self.signals.visibility_changed.dispatch(&visible);
    }

    /// Whether `id` belongs to any representation of this component.
    #[must_use]
    pub fn owns_buffer(&self, id: BufferId) -> bool {
        self.reprs.iter().any(|r| r.owns_buffer(id))
            || self.trajectories.iter().any(|t| t.owns_buffer(id))
    }

    /// Restrict a structure component to the atoms matching `sele`,
    /// rebuild every representation and re-target trajectories. Returns
    /// `false` for other component kinds.
    pub fn set_selection(&mut self, sele: &str) -> bool {
        let ComponentData::Structure(d) = &mut self.data else {
            return false;
        };
        d.selection = Selection::new(sele);
        let view = StructureView::new(Rc::clone(&d.structure), &d.selection);
        self.refresh_sources(None);
        for t in &mut self.trajectories {
            t.set_view(view.clone());
        }
        true
    }

    /// Attach or detach a validation report and rebuild. Returns `false`
    /// for non-structure components.
    pub fn set_validation(&mut self, validation: Option<Rc<Validation>>) -> bool {
        let ComponentData::Structure(d) = &mut self.data else {
            return false;
        };
        d.validation = validation;
        self.refresh_sources(None);
        true
    }

    fn refresh_sources(&mut self, what: Option<What>) {
        let Some(source) = self.data.source() else {
            return;
        };
        for r in &mut self.reprs {
            r.set_source(source.clone(), what);
        }
    }

    /// Attach a trajectory. Its frames must match the structure's atom
    /// count; other component kinds refuse with a warning.
    pub fn add_trajectory(&mut self, trajectory: Rc<Trajectory>) -> Option<TrajectoryId> {
        let ComponentData::Structure(d) = &self.data else {
            log::warn!("trajectories attach to structure components, not '{}'", self.kind());
            return None;
        };
        let atoms = d.structure.atom_count();
        if let Some(frame) = trajectory.frame(0).filter(|f| f.len() != atoms) {
            log::warn!(
                "trajectory '{}' has {} coordinates per frame, structure has {atoms} atoms",
                trajectory.name(),
                frame.len()
            );
            return None;
        }
        let view = StructureView::new(Rc::clone(&d.structure), &d.selection);
        let t = TrajectoryComponent::new(&self.ctx, trajectory, view, self.visible, self.matrix());
        let id = t.id();
        self.trajectories.push(t);
        self.signals.trajectory_added.dispatch(&id);
        Some(id)
    }

    /// Dispose and detach a trajectory. Returns `false` when absent.
    pub fn remove_trajectory(&mut self, id: TrajectoryId) -> bool {
        let Some(index) = self.trajectories.iter().position(|t| t.id() == id) else {
            return false;
        };
        let mut t = self.trajectories.remove(index);
        t.dispose();
        self.signals.trajectory_removed.dispatch(&id);
        true
    }

    /// Attached trajectories.
    #[must_use]
    pub fn trajectories(&self) -> &[TrajectoryComponent] {
        &self.trajectories
    }

    /// Mutable access to trajectory `id`.
    pub fn trajectory_mut(&mut self, id: TrajectoryId) -> Option<&mut TrajectoryComponent> {
        self.trajectories.iter_mut().find(|t| t.id() == id)
    }

    /// Replace the structure's coordinates with `frame` of trajectory `id`
    /// and update every representation's positions in place.
    pub fn set_frame(&mut self, id: TrajectoryId, frame: usize) -> bool {
        let Some(index) = self.trajectories.iter().position(|t| t.id() == id) else {
            return false;
        };
        let trajectory = Rc::clone(self.trajectories[index].trajectory());
        let Some(positions) = trajectory.frame(frame) else {
            log::warn!("trajectory '{}' has no frame {frame}", trajectory.name());
            return false;
        };
        let ComponentData::Structure(d) = &mut self.data else {
            return false;
        };
        let Some(moved) = d.structure.with_positions(positions) else {
            log::warn!("frame {frame} does not match the structure's atom count");
            return false;
        };
        d.structure = Rc::new(moved);
        self.refresh_sources(Some(What::POSITION));
        self.trajectories[index].frame_applied(frame);
        self.ctx.viewer().request_render();
        true
    }

    /// Advance every playing trajectory. Returns whether a frame changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due: Vec<(TrajectoryId, usize)> = self
            .trajectories
            .iter_mut()
            .filter_map(|t| t.player_mut().tick(now).map(|f| (t.id(), f)))
            .collect();
        let mut changed = false;
        for (id, frame) in due {
            changed |= self.set_frame(id, frame);
        }
        changed
    }

    /// World-space center and extent of the data, or of the atoms matching
    /// `sele`.
    #[must_use]
    pub fn bounding_sphere(&self, sele: Option<&str>) -> Option<(Vec3, f32)> {
        let (center, extent) = self.data.extent(sele)?;
        Some((self.matrix().transform_point3(center), extent * self.scale))
    }

    /// Point the camera at the component, or at the atoms matching `sele`.
    /// With `zoom`, fit them into view.
    pub fn center_view(&self, sele: Option<&str>, zoom: bool) {
        let Some((center, extent)) = self.bounding_sphere(sele) else {
            log::debug!("component '{}' has nothing to center on", self.name);
            return;
        };
        let mut viewer = self.ctx.viewer();
        viewer.center_view(center, zoom.then_some(extent));
        viewer.request_render();
    }

    /// Dispose trajectories, then every representation, release the data
    /// and dispatch `disposed`. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for mut t in std::mem::take(&mut self.trajectories) {
            t.dispose();
        }
        for mut r in std::mem::take(&mut self.reprs) {
            r.dispose();
        }
        self.data = ComponentData::Placeholder;
        self.signals.disposed.dispatch(&());
        self.signals.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::data::fixtures;
    use crate::representation::RepresentationRegistry;
    use crate::viewer::{HeadlessState, HeadlessViewer};

    fn setup() -> (Rc<StageContext>, Rc<RefCell<HeadlessState>>) {
        let viewer = HeadlessViewer::new();
        let state = viewer.state();
        let ctx = Rc::new(StageContext::new(
            Box::new(viewer),
            RepresentationRegistry::with_defaults(),
        ));
        (ctx, state)
    }

    fn peptide(ctx: &Rc<StageContext>, residues: i32) -> Component {
        Component::new(
            ctx,
            "peptide",
            ComponentData::structure(Rc::new(fixtures::peptide(residues))),
        )
    }

    fn counter() -> (Rc<Cell<usize>>, impl FnMut(&()) + 'static) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, move |()| h.set(h.get() + 1))
    }

    #[test]
    fn add_and_remove_dispatch() {
        let (ctx, _) = setup();
        let mut c = peptide(&ctx, 4);
        let added = Rc::new(RefCell::new(Vec::new()));
        let a = Rc::clone(&added);
        let _ = c.signals.representation_added.add(move |id| a.borrow_mut().push(*id));

        let id = c.add_representation("cartoon", &Map::new()).unwrap();
        assert_eq!(*added.borrow(), vec![id]);
        assert!(c.remove_representation(id));
        assert!(!c.remove_representation(id));
        assert!(c.representations().is_empty());
    }

    #[test]
    fn removal_is_the_only_way_out() {
        let (ctx, state) = setup();
        let mut c = peptide(&ctx, 4);
        let id = c.add_representation("licorice", &Map::new()).unwrap();
        let (disposals, listener) = counter();
        let _ = c.representation_mut(id).unwrap().signals.disposed.add(listener);
        let removed = Rc::new(RefCell::new(Vec::new()));
        let r = Rc::clone(&removed);
        let _ = c.signals.representation_removed.add(move |id| r.borrow_mut().push(*id));
        assert!(!state.borrow().buffers.is_empty());

        assert!(c.remove_representation(id));
        assert_eq!(disposals.get(), 1);
        assert_eq!(*removed.borrow(), vec![id]);
        assert!(c.representation(id).is_none());
        assert!(c.representation_mut(id).is_none());
        assert_eq!(c.all_representations().count(), 0);
        assert!(state.borrow().buffers.is_empty());
    }

    #[test]
    fn unknown_type_is_a_no_op() {
        let (ctx, state) = setup();
        let mut c = peptide(&ctx, 4);
        let (hits, mut listener) = counter();
        let _ = c.signals.representation_added.add(move |_| listener(&()));
        assert!(c.add_representation("rocket", &Map::new()).is_none());
        assert_eq!(hits.get(), 0);
        assert!(state.borrow().buffers.is_empty());
    }

    #[test]
    fn visibility_propagates_to_trajectory_paths() {
        let (ctx, state) = setup();
        let mut c = peptide(&ctx, 4);
        let traj = Rc::new(fixtures::trajectory(&fixtures::peptide(4), 3));
        let t = c.add_trajectory(traj).unwrap();
        let _ = c.add_representation("licorice", &Map::new()).unwrap();
        let path = c
            .trajectory_mut(t)
            .unwrap()
            .add_representation("trajectory", &Map::new())
            .unwrap();

        c.set_visibility(false);
        assert!(state.borrow().visible_buffers().next().is_none());
        assert!(c.representation(path).unwrap().visible());
        assert!(!c.representation(path).unwrap().effective_visibility());

        c.set_visibility(true);
        assert!(state.borrow().buffers.values().all(|b| b.visible()));
    }

    #[test]
    fn dispose_reaches_every_owned_object_once() {
        let (ctx, state) = setup();
        let mut c = peptide(&ctx, 10);
        let mut counts = Vec::new();
        for kind in ["cartoon", "spacefill", "licorice"] {
            let id = c.add_representation(kind, &Map::new()).unwrap();
            let (hits, listener) = counter();
            let _ = c.representation_mut(id).unwrap().signals.disposed.add(listener);
            counts.push(hits);
        }
        let traj = Rc::new(fixtures::trajectory(&fixtures::peptide(10), 2));
        let t = c.add_trajectory(traj).unwrap();
        let (traj_hits, listener) = counter();
        let _ = c.trajectory_mut(t).unwrap().signals.disposed.add(listener);

        c.dispose();
        c.dispose();

        assert!(counts.iter().all(|h| h.get() == 1));
        assert_eq!(traj_hits.get(), 1);
        assert!(state.borrow().buffers.is_empty());
        assert!(!c.remove_trajectory(t));
        assert_eq!(c.kind(), "placeholder");
        assert!(c.add_representation("cartoon", &Map::new()).is_none());
    }

    #[test]
    fn frame_updates_positions_in_place() {
        let (ctx, _) = setup();
        let mut c = peptide(&ctx, 3);
        let traj = Rc::new(fixtures::trajectory(&fixtures::peptide(3), 3));
        let t = c.add_trajectory(traj).unwrap();
        let r = c.add_representation("spacefill", &Map::new()).unwrap();
        let before = c.structure().unwrap().position(0);

        let frames = Rc::new(RefCell::new(Vec::new()));
        let f = Rc::clone(&frames);
        let signals = &mut c.trajectory_mut(t).unwrap().signals;
        let _ = signals.frame_changed.add(move |n| f.borrow_mut().push(*n));

        assert!(c.set_frame(t, 2));
        assert!(!c.set_frame(t, 9));
        let repr = c.representation(r).unwrap();
        assert_eq!(repr.build_count(), 1);
        assert_eq!(repr.update_count(), 1);
        let z = repr.buffers()[0].attribute("position").unwrap()[2];
        assert_eq!(z, before.z + 2.0);
        assert_eq!(*frames.borrow(), vec![2]);
        assert_eq!(c.trajectories()[0].frame(), Some(2));
    }

    #[test]
    fn mismatched_trajectory_is_refused() {
        let (ctx, _) = setup();
        let mut c = peptide(&ctx, 3);
        let traj = Rc::new(fixtures::trajectory(&fixtures::peptide(5), 2));
        assert!(c.add_trajectory(traj).is_none());

        let mut s = Component::new(&ctx, "s", ComponentData::Surface(Rc::new(fixtures::surface())));
        let traj = Rc::new(fixtures::trajectory(&fixtures::peptide(3), 2));
        assert!(s.add_trajectory(traj).is_none());
    }

    #[test]
    fn selection_change_rebuilds() {
        let (ctx, _) = setup();
        let mut c = peptide(&ctx, 4);
        let r = c.add_representation("spacefill", &Map::new()).unwrap();
        let before = c.representation(r).unwrap().buffers()[0].count();
        assert!(c.set_selection("1 or 2"));
        let repr = c.representation(r).unwrap();
        assert_eq!(repr.build_count(), 2);
        assert_eq!(repr.buffers()[0].count(), before / 2);
    }

    #[test]
    fn error_status_is_final() {
        let (ctx, _) = setup();
        let mut c = Component::new(&ctx, "p", ComponentData::Placeholder);
        c.set_status(ComponentStatus::Loading);
        c.set_status(ComponentStatus::Error("404".into()));
        c.set_status(ComponentStatus::Loaded);
        assert_eq!(c.status(), &ComponentStatus::Error("404".into()));
    }

    #[test]
    fn matrix_reaches_buffers() {
        let (ctx, state) = setup();
        let mut c = peptide(&ctx, 2);
        let _ = c.add_representation("spacefill", &Map::new());
        c.set_position(Vec3::new(1.0, 2.0, 3.0));
        let expected = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert!(state.borrow().buffers.values().all(|b| b.matrix() == expected));
    }

    #[test]
    fn center_view_uses_world_coordinates() {
        let (ctx, state) = setup();
        let mut c = peptide(&ctx, 3);
        c.set_position(Vec3::X * 10.0);
        let (center, _) = c.structure().unwrap().selection_extent(&Selection::all()).unwrap();
        c.center_view(None, true);
        let (got, zoom) = state.borrow().centered[0];
        assert_eq!(got, center + Vec3::X * 10.0);
        assert!(zoom.is_some());
    }

    #[test]
    fn tags_are_unique() {
        let (ctx, _) = setup();
        let mut c = peptide(&ctx, 1);
        c.add_tag("ligand");
        c.add_tag("ligand");
        assert_eq!(c.tags(), ["ligand".to_owned()]);
    }
}
