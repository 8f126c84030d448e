//! A representation attached to a component: parameters, buffers and
//! visibility.

use std::rc::Rc;

use glam::Mat4;
use serde_json::{Map, Value};

use super::ReprId;
use crate::buffer::{Buffer, BufferId};
use crate::options::Quality;
use crate::params::{validate, What};
use crate::representation::{Representation, RepresentationSource, DISPLAY_PARAMS};
use crate::signal::Signal;
use crate::stage::StageContext;

/// Events of a [`RepresentationComponent`].
#[derive(Debug, Default)]
pub struct RepresentationSignals {
    /// Accepted entries of a parameter patch.
    pub parameters_changed: Signal<Map<String, Value>>,
    /// Own visibility flag changed.
    pub visibility_changed: Signal<bool>,
    /// The representation was disposed.
    pub disposed: Signal<()>,
}

/// Owns one [`Representation`] and the buffers built from it.
///
/// Every buffer it holds is attached to the viewer until the next rebuild
/// or until its owner removes it.
#[derive(Debug)]
pub struct RepresentationComponent {
    id: ReprId,
    ctx: Rc<StageContext>,
    name: String,
    repr: Box<dyn Representation>,
    source: RepresentationSource,
    buffers: Vec<Buffer>,
    visible: bool,
    parent_visible: bool,
    matrix: Mat4,
    builds: u64,
    updates: u64,
    disposed: bool,
    /// Parameter, visibility and disposal events.
    pub signals: RepresentationSignals,
}

impl RepresentationComponent {
    /// Look up `type_name` in the stage's registry and build it from
    /// `source`.
    ///
    /// `params` may carry `name` and `visible` besides the kind's own
    /// parameters. Stage quality and impostor defaults fill in `quality`
    /// and `disable_impostor` when absent. Returns `None` (with a warning)
    /// for unknown kinds and kinds that cannot display `source`.
    pub(crate) fn create(
        ctx: &Rc<StageContext>,
        type_name: &str,
        params: &Map<String, Value>,
        source: RepresentationSource,
        parent_visible: bool,
        matrix: Mat4,
    ) -> Option<Self> {
        let Some(mut repr) = ctx.representations().create(type_name) else {
            log::warn!("unknown representation type '{type_name}'");
            return None;
        };
        if !repr.supports(&source) {
            log::warn!("representation '{type_name}' cannot display this data");
            return None;
        }

        let mut patch = params.clone();
        let name = patch
            .remove("name")
            .as_ref()
            .and_then(Value::as_str)
            .map_or_else(|| type_name.to_owned(), str::to_owned);
        let visible = patch
            .remove("visible")
            .as_ref()
            .and_then(Value::as_bool)
            .unwrap_or(true);
        if !patch.contains_key("quality") {
            let quality = serde_json::to_value(ctx.quality()).unwrap_or(Value::Null);
            let _ = patch.insert("quality".to_owned(), quality);
        }
        if !patch.contains_key("disable_impostor") {
            let _ = patch.insert(
                "disable_impostor".to_owned(),
                Value::Bool(!ctx.impostor()),
            );
        }
        let (accepted, _) = validate(
            &[repr.param_specs(), DISPLAY_PARAMS],
            &patch,
            type_name,
        );
        if let Err(e) = repr.merge_parameters(&accepted) {
            log::warn!("{type_name}: {e}");
        }

        let mut component = Self {
            id: ReprId(ctx.next_id()),
            ctx: Rc::clone(ctx),
            name,
            repr,
            source,
            buffers: Vec::new(),
            visible,
            parent_visible,
            matrix,
            builds: 0,
            updates: 0,
            disposed: false,
            signals: RepresentationSignals::default(),
        };
        component.build();
        Some(component)
    }

    /// Stage-unique id.
    #[must_use]
    pub fn id(&self) -> ReprId {
        self.id
    }

    /// Display name; defaults to the kind name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename.
    pub fn set_name(&mut self, name: &str) {
        name.clone_into(&mut self.name);
    }

    /// Registered kind name, e.g. `"cartoon"`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.repr.type_name()
    }

    /// The wrapped representation.
    #[must_use]
    pub fn representation(&self) -> &dyn Representation {
        self.repr.as_ref()
    }

    /// Current parameters as a JSON object.
    #[must_use]
    pub fn parameters(&self) -> Map<String, Value> {
        self.repr.parameters()
    }

    /// Buffers currently attached to the viewer.
    #[must_use]
    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    /// Own visibility flag.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Visibility of the owning component or trajectory.
    #[must_use]
    pub fn parent_visible(&self) -> bool {
        self.parent_visible
    }

    /// Whether the buffers are drawn: own flag and parent flag.
    #[must_use]
    pub fn effective_visibility(&self) -> bool {
        self.visible && self.parent_visible
    }

    /// Number of times the buffers were created from scratch.
    #[must_use]
    pub fn build_count(&self) -> u64 {
        self.builds
    }

    /// Number of in-place attribute updates.
    #[must_use]
    pub fn update_count(&self) -> u64 {
        self.updates
    }

    /// Whether the owner has removed and disposed this representation.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Apply a parameter patch.
    ///
    /// Unknown keys and values of the wrong kind are logged and skipped;
    /// numbers are clamped to their declared range. A rebuild-class key
    /// recreates every buffer. Otherwise update-class keys rewrite
    /// attributes in place, buffer-class keys change material parameters
    /// and visibility-class keys recompute visibility.
    pub fn set_parameters(&mut self, patch: &Map<String, Value>) {
        if self.disposed {
            return;
        }
        let owner = self.repr.type_name();
        let (accepted, changes) =
            validate(&[self.repr.param_specs(), DISPLAY_PARAMS], patch, owner);
        if accepted.is_empty() {
            return;
        }
        if let Err(e) = self.repr.merge_parameters(&accepted) {
            log::warn!("{owner}: {e}");
            return;
        }

        if changes.rebuild {
            self.rebuild();
        } else {
            if !changes.update.is_empty() {
                self.update(changes.update);
            }
            if changes.buffer {
                self.apply_buffer_params();
            }
            if changes.visibility {
                self.update_visibility();
            }
        }
        self.signals.parameters_changed.dispatch(&accepted);
        self.ctx.viewer().request_render();
    }

    /// Recreate every buffer from the current source and parameters.
    pub fn rebuild(&mut self) {
        if self.disposed {
            return;
        }
        self.detach();
        self.build();
    }

    /// Rewrite the attribute groups in `what` without changing any
    /// attribute length. Falls back to a rebuild when the representation
    /// cannot update in place.
    pub fn update(&mut self, what: What) {
        if self.disposed || what.is_empty() {
            return;
        }
        match self.repr.update(&self.source, what, &mut self.buffers) {
            Ok(()) => {
                self.updates += 1;
                let mut viewer = self.ctx.viewer();
                for b in &self.buffers {
                    viewer.update(b);
                }
            }
            Err(e) => {
                log::warn!("{}: in-place update failed ({e}), rebuilding", self.name);
                self.rebuild();
            }
        }
    }

    /// Set the own visibility flag.
    pub fn set_visibility(&mut self, visible: bool) {
        self.visible = visible;
        self.update_visibility();
        self.signals.visibility_changed.dispatch(&visible);
    }

    pub(crate) fn set_parent_visibility(&mut self, visible: bool) {
        self.parent_visible = visible;
        self.update_visibility();
    }

    /// Push the effective visibility of each buffer to the viewer.
    pub fn update_visibility(&mut self) {
        let visible = self.effective_visibility();
        let mut viewer = self.ctx.viewer();
        for b in &mut self.buffers {
            b.set_visibility(visible && self.repr.buffer_visible(b));
            viewer.update(b);
        }
        viewer.request_render();
    }

    pub(crate) fn set_matrix(&mut self, matrix: Mat4) {
        self.matrix = matrix;
        let mut viewer = self.ctx.viewer();
        for b in &mut self.buffers {
            b.set_matrix(matrix);
            viewer.update(b);
        }
    }

    /// Replace the data the buffers are built from. With `what`, only those
    /// attribute groups are rewritten; otherwise everything is rebuilt.
    pub(crate) fn set_source(&mut self, source: RepresentationSource, what: Option<What>) {
        self.source = source;
        match what {
            Some(what) => self.update(what),
            None => self.rebuild(),
        }
    }

    /// Change the stored quality without touching the buffers. Used for
    /// impostor geometry, whose detail does not depend on tessellation.
    pub(crate) fn set_quality_in_place(&mut self, quality: Quality) {
        self.repr.display_mut().quality = quality;
    }

    pub(crate) fn impostor_disabled(&self) -> bool {
        self.repr.display().disable_impostor
    }

    /// Whether `id` is one of this representation's buffers.
    #[must_use]
    pub fn owns_buffer(&self, id: BufferId) -> bool {
        self.buffers.iter().any(|b| b.id() == id)
    }

    /// Detach every buffer from the viewer, dispatch `disposed` and drop
    /// all listeners. Later calls do nothing. Only the owning component or
    /// trajectory calls this, right after taking it out of its list.
    pub(crate) fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.detach();
        self.disposed = true;
        self.signals.disposed.dispatch(&());
        self.signals.parameters_changed.clear();
        self.signals.visibility_changed.clear();
        self.signals.disposed.clear();
    }

    fn build(&mut self) {
        self.buffers = self.repr.create(&self.source);
        self.builds += 1;
        let visible = self.effective_visibility();
        let mut viewer = self.ctx.viewer();
        for b in &mut self.buffers {
            self.repr.apply_buffer_params(b);
            b.set_matrix(self.matrix);
            b.set_visibility(visible && self.repr.buffer_visible(b));
            viewer.add(b);
        }
        viewer.request_render();
    }

    fn detach(&mut self) {
        let mut viewer = self.ctx.viewer();
        for b in self.buffers.drain(..) {
            viewer.remove(b.id());
        }
    }

    fn apply_buffer_params(&mut self) {
        let mut viewer = self.ctx.viewer();
        for b in &mut self.buffers {
            self.repr.apply_buffer_params(b);
            viewer.update(b);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::buffer::BufferKind;
    use crate::data::{fixtures, Selection, StructureView};
    use crate::representation::{RepresentationRegistry, StructureSource};
    use crate::viewer::{HeadlessState, HeadlessViewer};

    fn setup() -> (Rc<StageContext>, Rc<std::cell::RefCell<HeadlessState>>) {
        let viewer = HeadlessViewer::new();
        let state = viewer.state();
        let ctx = Rc::new(StageContext::new(
            Box::new(viewer),
            RepresentationRegistry::with_defaults(),
        ));
        (ctx, state)
    }

    fn source(residues: i32) -> RepresentationSource {
        RepresentationSource::Structure(StructureSource::new(StructureView::new(
            Rc::new(fixtures::peptide(residues)),
            &Selection::all(),
        )))
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn create(ctx: &Rc<StageContext>, kind: &str, p: Value) -> RepresentationComponent {
        RepresentationComponent::create(ctx, kind, &params(p), source(5), true, Mat4::IDENTITY)
            .unwrap()
    }

    #[test]
    fn build_attaches_buffers() {
        let (ctx, state) = setup();
        let r = create(&ctx, "ball+stick", json!({}));
        assert_eq!(r.build_count(), 1);
        assert_eq!(r.buffers().len(), 2);
        assert!(r.buffers().iter().all(|b| state.borrow().contains(b.id())));
    }

    #[test]
    fn stage_defaults_fill_missing_quality() {
        let (ctx, _) = setup();
        ctx.set_quality(Quality::Low);
        ctx.set_impostor(false);
        let r = create(&ctx, "spacefill", json!({}));
        assert_eq!(r.parameters()["quality"], json!("low"));
        assert_eq!(r.parameters()["disable_impostor"], json!(true));

        let r = create(&ctx, "spacefill", json!({ "quality": "high" }));
        assert_eq!(r.parameters()["quality"], json!("high"));
    }

    #[test]
    fn name_and_visible_are_not_kind_parameters() {
        let (ctx, _) = setup();
        let r = create(&ctx, "licorice", json!({ "name": "sticks", "visible": false }));
        assert_eq!(r.name(), "sticks");
        assert!(!r.visible());
        assert!(r.buffers().iter().all(|b| !b.visible()));
    }

    #[test]
    fn update_class_keeps_buffers_and_lengths() {
        let (ctx, state) = setup();
        let mut r = create(&ctx, "spacefill", json!({}));
        let ids: Vec<_> = r.buffers().iter().map(Buffer::id).collect();
        let lengths: Vec<_> = r.buffers().iter().map(Buffer::attribute_lengths).collect();

        r.set_parameters(&params(json!({ "scale": 2.0, "color_scheme": "uniform" })));

        assert_eq!(r.build_count(), 1);
        assert_eq!(r.update_count(), 1);
        assert_eq!(r.buffers().iter().map(Buffer::id).collect::<Vec<_>>(), ids);
        assert_eq!(
            r.buffers().iter().map(Buffer::attribute_lengths).collect::<Vec<_>>(),
            lengths
        );
        let state = state.borrow();
        assert_eq!(
            state.buffers[&ids[0]].attribute("radius"),
            r.buffers()[0].attribute("radius")
        );
    }

    #[test]
    fn rebuild_class_replaces_buffers() {
        let (ctx, state) = setup();
        let mut r = create(&ctx, "cartoon", json!({}));
        let old = r.buffers()[0].id();
        r.set_parameters(&params(json!({ "sele": "1 or 2 or 3" })));
        assert_eq!(r.build_count(), 2);
        assert!(!state.borrow().contains(old));
        assert!(r.buffers().iter().all(|b| state.borrow().contains(b.id())));
    }

    #[test]
    fn buffer_class_touches_material_only() {
        let (ctx, state) = setup();
        let mut r = create(&ctx, "spacefill", json!({}));
        r.set_parameters(&params(json!({ "opacity": 0.25 })));
        assert_eq!(r.build_count(), 1);
        assert_eq!(r.update_count(), 0);
        let id = r.buffers()[0].id();
        assert_eq!(state.borrow().buffers[&id].params().opacity, 0.25);
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let (ctx, _) = setup();
        let mut r = create(&ctx, "spacefill", json!({}));
        let changed = Rc::new(std::cell::Cell::new(0));
        let c = Rc::clone(&changed);
        let _ = r.signals.parameters_changed.add(move |_| c.set(c.get() + 1));
        r.set_parameters(&params(json!({ "bogus": 1 })));
        assert_eq!(changed.get(), 0);
        r.set_parameters(&params(json!({ "bogus": 1, "opacity": 3.0 })));
        assert_eq!(changed.get(), 1);
        assert_eq!(r.parameters()["opacity"], json!(1.0));
    }

    #[test]
    fn effective_visibility_survives_rebuild() {
        let (ctx, _) = setup();
        let mut r = create(&ctx, "ball+stick", json!({}));
        r.set_parent_visibility(false);
        assert!(r.visible());
        assert!(r.buffers().iter().all(|b| !b.visible()));
        r.rebuild();
        assert!(r.buffers().iter().all(|b| !b.visible()));
        r.set_parent_visibility(true);
        r.set_visibility(false);
        assert!(!r.effective_visibility());
        r.set_visibility(true);
        assert!(r.buffers().iter().all(Buffer::visible));
    }

    #[test]
    fn visibility_class_hides_labels_only() {
        let (ctx, _) = setup();
        let mut r = create(&ctx, "distance", json!({ "atom_pair": [["1.CA", "4.CA"]] }));
        r.set_parameters(&params(json!({ "label_visible": false })));
        assert_eq!(r.build_count(), 1);
        for b in r.buffers() {
            assert_eq!(b.visible(), b.kind() != BufferKind::Text);
        }
    }

    #[test]
    fn dispose_detaches_once() {
        let (ctx, state) = setup();
        let mut r = create(&ctx, "ball+stick", json!({}));
        let hits = Rc::new(std::cell::Cell::new(0));
        let h = Rc::clone(&hits);
        let _ = r.signals.disposed.add(move |()| h.set(h.get() + 1));
        r.dispose();
        r.dispose();
        assert_eq!(hits.get(), 1);
        assert!(state.borrow().buffers.is_empty());
        assert!(r.buffers().is_empty());
    }

    #[test]
    fn unknown_or_unsupported_kinds_are_refused() {
        let (ctx, _) = setup();
        let none = RepresentationComponent::create(
            &ctx,
            "rocket",
            &Map::new(),
            source(2),
            true,
            Mat4::IDENTITY,
        );
        assert!(none.is_none());
        let none = RepresentationComponent::create(
            &ctx,
            "surface",
            &Map::new(),
            source(2),
            true,
            Mat4::IDENTITY,
        );
        assert!(none.is_none());
    }
}
