//! Trajectories attached to structure components, and their playback.

use std::rc::Rc;

use glam::Mat4;
use serde_json::{Map, Value};
use web_time::{Duration, Instant};

use super::representation::RepresentationComponent;
use super::{ReprId, TrajectoryId};
use crate::buffer::BufferId;
use crate::data::{StructureView, Trajectory};
use crate::representation::{RepresentationSource, StructureSource};
use crate::signal::Signal;
use crate::stage::StageContext;

/// Frame sequencer. Advances at a fixed rate while playing.
#[derive(Debug, Clone)]
pub struct TrajectoryPlayer {
    frame_count: usize,
    current_frame: usize,
    last_advance: Option<Instant>,
    frame_duration: Duration,
    playing: bool,
    looping: bool,
}

impl TrajectoryPlayer {
    /// Paused player over `frame_count` frames at 30 fps, looping.
    #[must_use]
    pub fn new(frame_count: usize) -> Self {
        Self {
            frame_count,
            current_frame: 0,
            last_advance: None,
            frame_duration: Duration::from_secs_f64(1.0 / 30.0),
            playing: false,
            looping: true,
        }
    }

    /// Advance time. Returns the new frame index if a step occurred.
    ///
    /// The first tick after starting playback only arms the timer.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        if !self.playing || self.frame_count == 0 {
            return None;
        }
        let Some(last) = self.last_advance else {
            self.last_advance = Some(now);
            return None;
        };
        if now.saturating_duration_since(last) < self.frame_duration {
            return None;
        }
        self.last_advance = Some(now);

        let next = self.current_frame + 1;
        if next >= self.frame_count {
            if self.looping {
                self.current_frame = 0;
            } else {
                self.playing = false;
                return None;
            }
        } else {
            self.current_frame = next;
        }
        Some(self.current_frame)
    }

    /// Start advancing.
    pub fn play(&mut self) {
        self.playing = true;
        self.last_advance = None;
    }

    /// Stop advancing.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Toggle between playing and paused states.
    pub fn toggle_playback(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Set playback speed in frames per second (clamped to >= 0.1).
    pub fn set_fps(&mut self, fps: f32) {
        self.frame_duration = Duration::from_secs_f64(1.0 / f64::from(fps.max(0.1)));
    }

    /// Enable or disable looping at the end of the trajectory.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Jump to `frame` without waiting for the timer.
    pub(crate) fn seek(&mut self, frame: usize) {
        self.current_frame = frame.min(self.frame_count.saturating_sub(1));
    }

    /// Index of the current frame.
    #[must_use]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Total number of frames.
    #[must_use]
    pub fn total_frames(&self) -> usize {
        self.frame_count
    }

    /// Whether the player is currently advancing frames.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Events of a [`TrajectoryComponent`].
#[derive(Debug, Default)]
pub struct TrajectorySignals {
    /// A frame was applied to the owning structure.
    pub frame_changed: Signal<usize>,
    /// A path representation was added.
    pub representation_added: Signal<ReprId>,
    /// A path representation was removed.
    pub representation_removed: Signal<ReprId>,
    /// The attachment was disposed.
    pub disposed: Signal<()>,
}

/// A trajectory attached to a structure component.
///
/// Owns a player and the representations drawn from the trajectory itself
/// (atom paths). Frames are applied by the owning component, which swaps
/// in the new coordinates and updates its own representations.
#[derive(Debug)]
pub struct TrajectoryComponent {
    id: TrajectoryId,
    ctx: Rc<StageContext>,
    name: String,
    trajectory: Rc<Trajectory>,
    view: StructureView,
    frame: Option<usize>,
    player: TrajectoryPlayer,
    reprs: Vec<RepresentationComponent>,
    parent_visible: bool,
    matrix: Mat4,
    disposed: bool,
    /// Frame, representation and disposal events.
    pub signals: TrajectorySignals,
}

impl TrajectoryComponent {
    pub(crate) fn new(
        ctx: &Rc<StageContext>,
        trajectory: Rc<Trajectory>,
        view: StructureView,
        parent_visible: bool,
        matrix: Mat4,
    ) -> Self {
        Self {
            id: TrajectoryId(ctx.next_id()),
            ctx: Rc::clone(ctx),
            name: trajectory.name().to_owned(),
            player: TrajectoryPlayer::new(trajectory.frame_count()),
            trajectory,
            view,
            frame: None,
            reprs: Vec::new(),
            parent_visible,
            matrix,
            disposed: false,
            signals: TrajectorySignals::default(),
        }
    }

    /// Stage-unique id.
    #[must_use]
    pub fn id(&self) -> TrajectoryId {
        self.id
    }

    /// Display name; defaults to the trajectory's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attached frames.
    #[must_use]
    pub fn trajectory(&self) -> &Rc<Trajectory> {
        &self.trajectory
    }

    /// Number of frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.trajectory.frame_count()
    }

    /// Last applied frame; `None` until a frame is set.
    #[must_use]
    pub fn frame(&self) -> Option<usize> {
        self.frame
    }

    /// Playback state.
    #[must_use]
    pub fn player(&self) -> &TrajectoryPlayer {
        &self.player
    }

    /// Mutable playback state.
    pub fn player_mut(&mut self) -> &mut TrajectoryPlayer {
        &mut self.player
    }

    /// Whether [`TrajectoryComponent::dispose`] has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn source(&self) -> RepresentationSource {
        RepresentationSource::Structure(StructureSource {
            view: self.view.clone(),
            validation: None,
            trajectory: Some(Rc::clone(&self.trajectory)),
        })
    }

    /// Add a representation of the trajectory, usually `"trajectory"`.
    /// Unknown kinds log a warning and return `None`.
    pub fn add_representation(
        &mut self,
        type_name: &str,
        params: &Map<String, Value>,
    ) -> Option<ReprId> {
        if self.disposed {
            return None;
        }
        let repr = RepresentationComponent::create(
            &self.ctx,
            type_name,
            params,
            self.source(),
            self.parent_visible,
            self.matrix,
        )?;
        let id = repr.id();
        self.reprs.push(repr);
        self.signals.representation_added.dispatch(&id);
        Some(id)
    }

    /// Dispose and drop a representation. Returns `false` when `id` is not
    /// owned by this trajectory.
    pub fn remove_representation(&mut self, id: ReprId) -> bool {
        let Some(index) = self.reprs.iter().position(|r| r.id() == id) else {
            return false;
        };
        let mut repr = self.reprs.remove(index);
        repr.dispose();
        self.signals.representation_removed.dispatch(&id);
        true
    }

    /// Path representations, in creation order.
    #[must_use]
    pub fn representations(&self) -> &[RepresentationComponent] {
        &self.reprs
    }

    pub(crate) fn representations_mut(&mut self) -> &mut [RepresentationComponent] {
        &mut self.reprs
    }

    pub(crate) fn owns_buffer(&self, id: BufferId) -> bool {
        self.reprs.iter().any(|r| r.owns_buffer(id))
    }

    pub(crate) fn set_parent_visibility(&mut self, visible: bool) {
        self.parent_visible = visible;
        for r in &mut self.reprs {
            r.set_parent_visibility(visible);
        }
    }

    pub(crate) fn set_matrix(&mut self, matrix: Mat4) {
        self.matrix = matrix;
        for r in &mut self.reprs {
            r.set_matrix(matrix);
        }
    }

    /// Point at a new set of atoms and rebuild the path representations.
    pub(crate) fn set_view(&mut self, view: StructureView) {
        self.view = view;
        let source = self.source();
        for r in &mut self.reprs {
            r.set_source(source.clone(), None);
        }
    }

    pub(crate) fn frame_applied(&mut self, frame: usize) {
        self.frame = Some(frame);
        self.player.seek(frame);
        self.signals.frame_changed.dispatch(&frame);
    }

    /// Dispose every representation, dispatch `disposed` and drop all
    /// listeners. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for mut r in std::mem::take(&mut self.reprs) {
            r.dispose();
        }
        self.player.pause();
        self.disposed = true;
        self.signals.disposed.dispatch(&());
        self.signals.frame_changed.clear();
        self.signals.representation_added.clear();
        self.signals.representation_removed.clear();
        self.signals.disposed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn first_tick_arms_the_timer() {
        let mut p = TrajectoryPlayer::new(3);
        let t0 = Instant::now();
        assert_eq!(p.tick(t0), None);
        p.play();
        assert_eq!(p.tick(t0), None);
        assert_eq!(p.tick(t0 + ms(10)), None);
        assert_eq!(p.tick(t0 + ms(40)), Some(1));
    }

    #[test]
    fn looping_wraps_to_the_first_frame() {
        let mut p = TrajectoryPlayer::new(2);
        p.set_fps(10.0);
        p.play();
        let t0 = Instant::now();
        let _ = p.tick(t0);
        assert_eq!(p.tick(t0 + ms(100)), Some(1));
        assert_eq!(p.tick(t0 + ms(200)), Some(0));
        assert!(p.is_playing());
    }

    #[test]
    fn without_looping_playback_stops_at_the_end() {
        let mut p = TrajectoryPlayer::new(2);
        p.set_fps(10.0);
        p.set_looping(false);
        p.play();
        let t0 = Instant::now();
        let _ = p.tick(t0);
        assert_eq!(p.tick(t0 + ms(100)), Some(1));
        assert_eq!(p.tick(t0 + ms(200)), None);
        assert!(!p.is_playing());
        assert_eq!(p.current_frame(), 1);
    }

    #[test]
    fn toggle_and_seek() {
        let mut p = TrajectoryPlayer::new(4);
        p.toggle_playback();
        assert!(p.is_playing());
        p.toggle_playback();
        assert!(!p.is_playing());
        p.seek(10);
        assert_eq!(p.current_frame(), 3);
        assert_eq!(p.total_frames(), 4);
    }

    #[test]
    fn empty_trajectory_never_advances() {
        let mut p = TrajectoryPlayer::new(0);
        p.play();
        let t0 = Instant::now();
        let _ = p.tick(t0);
        assert_eq!(p.tick(t0 + ms(1000)), None);
    }
}
