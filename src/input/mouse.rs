use glam::Vec2;
use web_time::{Duration, Instant};

use super::event::{Modifiers, MouseButton};

/// Pointer travel, in pixels, after which a press counts as a drag.
const DRAG_THRESHOLD: f32 = 3.0;

/// A completed click: press and release of one button without dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    /// Canvas position of the release.
    pub position: Vec2,
    /// Button that was clicked.
    pub button: MouseButton,
    /// Modifiers held at release.
    pub modifiers: Modifiers,
}

/// Mouse state captured with a pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseSnapshot {
    /// Canvas position, origin top-left.
    pub position: Vec2,
    /// Held modifier keys.
    pub modifiers: Modifiers,
    /// Button currently pressed, if any.
    pub button: Option<MouseButton>,
}

/// Tracks pointer position, click versus drag and hover resting time.
#[derive(Debug, Clone)]
pub struct MouseObserver {
    position: Vec2,
    pressed: Option<(MouseButton, Vec2)>,
    dragging: bool,
    modifiers: Modifiers,
    hover_timeout: i64,
    last_move: Instant,
    hover_fired: bool,
    inside: bool,
}

impl MouseObserver {
    /// Observer with the given hover timeout in milliseconds; -1 disables
    /// hovering.
    #[must_use]
    pub fn new(hover_timeout: i64) -> Self {
        Self {
            position: Vec2::ZERO,
            pressed: None,
            dragging: false,
            modifiers: Modifiers::NONE,
            hover_timeout,
            last_move: Instant::now(),
            hover_fired: true,
            inside: false,
        }
    }

    /// Current canvas position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Held modifier keys.
    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Whether the pressed button has moved far enough to be a drag.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Hover timeout in milliseconds; -1 when hovering is disabled.
    #[must_use]
    pub fn hover_timeout(&self) -> i64 {
        self.hover_timeout
    }

    /// Change the hover timeout.
    pub fn set_hover_timeout(&mut self, timeout: i64) {
        self.hover_timeout = timeout;
    }

    /// Replace the held modifier set.
    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    /// Snapshot for a pick.
    #[must_use]
    pub fn snapshot(&self) -> MouseSnapshot {
        MouseSnapshot {
            position: self.position,
            modifiers: self.modifiers,
            button: self.pressed.map(|(b, _)| b),
        }
    }

    /// Pointer moved to `(x, y)`; restarts the hover timer.
    pub fn handle_move(&mut self, x: f32, y: f32, now: Instant) {
        self.position = Vec2::new(x, y);
        self.inside = true;
        self.last_move = now;
        self.hover_fired = false;
        if let Some((_, start)) = self.pressed {
            if start.distance(self.position) > DRAG_THRESHOLD {
                self.dragging = true;
            }
        }
    }

    /// Button pressed at the current position.
    pub fn handle_down(&mut self, button: MouseButton) {
        self.pressed = Some((button, self.position));
        self.dragging = false;
    }

    /// Button released. Returns the click, unless the press was a drag or
    /// belonged to another button.
    pub fn handle_up(&mut self, button: MouseButton) -> Option<Click> {
        let pressed = self.pressed.take();
        let dragged = std::mem::replace(&mut self.dragging, false);
        match pressed {
            Some((b, _)) if b == button && !dragged => Some(Click {
                position: self.position,
                button,
                modifiers: self.modifiers,
            }),
            _ => None,
        }
    }

    /// Pointer left the canvas; no hover fires until it moves again.
    pub fn handle_leave(&mut self) {
        self.inside = false;
        self.pressed = None;
        self.dragging = false;
    }

    /// Whether the pointer has rested for the hover timeout. Returns `true`
    /// once per resting period.
    pub fn hover_due(&mut self, now: Instant) -> bool {
        if self.hover_timeout < 0
            || self.hover_fired
            || !self.inside
            || self.pressed.is_some()
        {
            return false;
        }
        let timeout = Duration::from_millis(self.hover_timeout.unsigned_abs());
        if now.saturating_duration_since(self.last_move) >= timeout {
            self.hover_fired = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn press_and_release_in_place_is_a_click() {
        let mut m = MouseObserver::new(500);
        let t = Instant::now();
        m.handle_move(10.0, 10.0, t);
        m.set_modifiers(Modifiers::SHIFT.with(Modifiers::CTRL));
        m.handle_down(MouseButton::Left);
        m.handle_move(11.0, 11.0, t);
        let click = m.handle_up(MouseButton::Left).unwrap();
        assert_eq!(click.position, Vec2::new(11.0, 11.0));
        assert!(click.modifiers.shift() && click.modifiers.ctrl());
        assert!(!click.modifiers.alt());
    }

    #[test]
    fn drag_is_not_a_click() {
        let mut m = MouseObserver::new(500);
        let t = Instant::now();
        m.handle_move(0.0, 0.0, t);
        m.handle_down(MouseButton::Left);
        m.handle_move(20.0, 0.0, t);
        assert!(m.is_dragging());
        assert!(m.handle_up(MouseButton::Left).is_none());
        assert!(!m.is_dragging());
    }

    #[test]
    fn release_of_other_button_is_not_a_click() {
        let mut m = MouseObserver::new(500);
        m.handle_down(MouseButton::Right);
        assert!(m.handle_up(MouseButton::Left).is_none());
    }

    #[test]
    fn hover_fires_once_after_timeout() {
        let mut m = MouseObserver::new(500);
        let t = Instant::now();
        m.handle_move(5.0, 5.0, t);
        assert!(!m.hover_due(t + ms(499)));
        assert!(m.hover_due(t + ms(500)));
        assert!(!m.hover_due(t + ms(900)));
        m.handle_move(6.0, 5.0, t + ms(1000));
        assert!(m.hover_due(t + ms(1500)));
    }

    #[test]
    fn negative_timeout_disables_hover() {
        let mut m = MouseObserver::new(-1);
        let t = Instant::now();
        m.handle_move(5.0, 5.0, t);
        assert!(!m.hover_due(t + ms(10_000)));
    }

    #[test]
    fn no_hover_before_first_move_or_after_leave() {
        let mut m = MouseObserver::new(0);
        let t = Instant::now();
        assert!(!m.hover_due(t));
        m.handle_move(1.0, 1.0, t);
        m.handle_leave();
        assert!(!m.hover_due(t + ms(10)));
    }
}
