//! Click and long-press recognition
//!
//! A press inside the node starts a pointer grab: while held, the owner must
//! route every pointer event of the surface to [`ClickAction::handle_event`],
//! not just the ones hitting the node. Only the release matching the press
//! (button, device and sequence) ends the click.

use std::time::{Duration, Instant};

use bitflags::bitflags;
use tracing::debug;

use crate::layout::Rect;
use crate::style::{self, Stylable, StyleError, StyleValue};

pub const DEFAULT_LONG_PRESS_DURATION: Duration = Duration::from_millis(500);
pub const DEFAULT_DRAG_THRESHOLD: f32 = 8.0;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Press,
    Release,
    Motion,
    Enter,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub x: f32,
    pub y: f32,
    pub button: u8,
    pub device: u32,
    /// Touch sequence, `None` for plain pointers
    pub sequence: Option<u32>,
    pub modifiers: Modifiers,
    pub time: Instant,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, x: f32, y: f32, time: Instant) -> Self {
        Self {
            kind,
            x,
            y,
            button: 1,
            device: 0,
            sequence: None,
            modifiers: Modifiers::empty(),
            time,
        }
    }

    pub fn with_button(mut self, button: u8) -> Self {
        self.button = button;
        self
    }

    pub fn with_device(mut self, device: u32) -> Self {
        self.device = device;
        self
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Whether the event was consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Stop,
    Propagate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongPressPhase {
    /// Asked on press whether long presses are wanted
    Query,
    Activate,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickEvent {
    Clicked {
        button: u8,
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },
    LongPress(LongPressPhase),
}

/// What the press started with; a release must match all of it
#[derive(Debug, Clone, Copy)]
struct Hold {
    button: u8,
    device: u32,
    sequence: Option<u32>,
    press_x: f32,
    press_y: f32,
    modifiers: Modifiers,
    long_press_deadline: Option<Instant>,
}

impl Hold {
    fn matches(&self, event: &PointerEvent) -> bool {
        self.button == event.button && self.device == event.device && self.sequence == event.sequence
    }
}

type LongPressQuery = Box<dyn FnMut(LongPressPhase) -> bool>;

pub struct ClickAction {
    bounds: Rect,
    long_press_duration: Duration,
    drag_threshold: f32,
    long_press: Option<LongPressQuery>,
    hold: Option<Hold>,
    pressed: bool,
    last_coords: (f32, f32),
}

impl std::fmt::Debug for ClickAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickAction")
            .field("bounds", &self.bounds)
            .field("held", &self.hold.is_some())
            .field("pressed", &self.pressed)
            .finish()
    }
}

impl ClickAction {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            long_press_duration: DEFAULT_LONG_PRESS_DURATION,
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
            long_press: None,
            hold: None,
            pressed: false,
            last_coords: (0.0, 0.0),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    pub fn long_press_duration(&self) -> Duration {
        self.long_press_duration
    }

    pub fn set_long_press_duration(&mut self, duration: Duration) {
        self.long_press_duration = duration;
    }

    pub fn drag_threshold(&self) -> f32 {
        self.drag_threshold
    }

    pub fn set_drag_threshold(&mut self, threshold: f32) {
        self.drag_threshold = threshold.max(0.0);
    }

    /// Install the long-press handler
    ///
    /// It is called with [`LongPressPhase::Query`] on every press; returning
    /// `true` arms the long-press timer. `Activate` and `Cancel` are
    /// reported to it as well.
    pub fn set_long_press_handler<F: FnMut(LongPressPhase) -> bool + 'static>(&mut self, handler: F) {
        self.long_press = Some(Box::new(handler));
    }

    /// Pressed and not yet released or cancelled
    pub fn is_held(&self) -> bool {
        self.hold.is_some()
    }

    /// Held with the pointer currently inside the node
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// All pointer events must be routed here while this is set
    pub fn has_grab(&self) -> bool {
        self.hold.is_some()
    }

    pub fn button(&self) -> Option<u8> {
        self.hold.map(|h| h.button)
    }

    pub fn modifiers(&self) -> Modifiers {
        self.hold.map(|h| h.modifiers).unwrap_or_default()
    }

    pub fn coords(&self) -> (f32, f32) {
        self.last_coords
    }

    pub fn long_press_pending(&self) -> bool {
        self.hold.is_some_and(|h| h.long_press_deadline.is_some())
    }

    fn notify_long_press(&mut self, phase: LongPressPhase) -> bool {
        match self.long_press.as_mut() {
            Some(handler) => handler(phase),
            None => false,
        }
    }

    pub fn handle_event(&mut self, event: &PointerEvent) -> (Propagation, Option<ClickEvent>) {
        match event.kind {
            PointerEventKind::Press => self.on_press(event),
            PointerEventKind::Motion => self.on_motion(event),
            PointerEventKind::Release => self.on_release(event),
            PointerEventKind::Enter | PointerEventKind::Leave => {
                if self.hold.is_some() {
                    self.pressed = event.kind == PointerEventKind::Enter;
                }
                (Propagation::Propagate, None)
            }
        }
    }

    fn on_press(&mut self, event: &PointerEvent) -> (Propagation, Option<ClickEvent>) {
        if self.hold.is_some() || !self.bounds.contains(event.x, event.y) {
            return (Propagation::Propagate, None);
        }

        let long_press_deadline = self
            .notify_long_press(LongPressPhase::Query)
            .then(|| event.time + self.long_press_duration);

        debug!(
            "Click press button {} device {} at {},{}",
            event.button, event.device, event.x, event.y
        );
        self.hold = Some(Hold {
            button: event.button,
            device: event.device,
            sequence: event.sequence,
            press_x: event.x,
            press_y: event.y,
            modifiers: event.modifiers,
            long_press_deadline,
        });
        self.pressed = true;
        self.last_coords = (event.x, event.y);
        (Propagation::Stop, None)
    }

    fn on_motion(&mut self, event: &PointerEvent) -> (Propagation, Option<ClickEvent>) {
        let Some(hold) = self.hold.as_mut() else {
            return (Propagation::Propagate, None);
        };
        if hold.sequence.is_some() && hold.sequence != event.sequence {
            return (Propagation::Propagate, None);
        }

        self.pressed = self.bounds.contains(event.x, event.y);
        self.last_coords = (event.x, event.y);

        let moved = (event.x - hold.press_x).abs() > self.drag_threshold
            || (event.y - hold.press_y).abs() > self.drag_threshold;
        if moved && hold.long_press_deadline.take().is_some() {
            self.notify_long_press(LongPressPhase::Cancel);
            return (Propagation::Stop, Some(ClickEvent::LongPress(LongPressPhase::Cancel)));
        }
        (Propagation::Stop, None)
    }

    fn on_release(&mut self, event: &PointerEvent) -> (Propagation, Option<ClickEvent>) {
        let Some(hold) = self.hold else {
            return (Propagation::Propagate, None);
        };
        if !hold.matches(event) {
            return (Propagation::Propagate, None);
        }

        self.reset();
        self.last_coords = (event.x, event.y);
        if !self.bounds.contains(event.x, event.y) {
            return (Propagation::Stop, None);
        }

        (
            Propagation::Stop,
            Some(ClickEvent::Clicked {
                button: hold.button,
                x: event.x,
                y: event.y,
                modifiers: hold.modifiers,
            }),
        )
    }

    /// Drive the long-press timer
    pub fn tick(&mut self, now: Instant) -> Option<ClickEvent> {
        let deadline = self.hold?.long_press_deadline?;
        if now < deadline {
            return None;
        }

        debug!("Long press activated");
        self.reset();
        self.notify_long_press(LongPressPhase::Activate);
        Some(ClickEvent::LongPress(LongPressPhase::Activate))
    }

    /// Time left until the long press fires
    pub fn time_to_long_press(&self, now: Instant) -> Option<Duration> {
        let deadline = self.hold?.long_press_deadline?;
        Some(deadline.saturating_duration_since(now))
    }

    /// Cancel a click in progress, dropping the grab
    pub fn release(&mut self) -> Option<ClickEvent> {
        let hold = self.hold?;
        self.reset();
        if hold.long_press_deadline.is_some() {
            self.notify_long_press(LongPressPhase::Cancel);
            return Some(ClickEvent::LongPress(LongPressPhase::Cancel));
        }
        None
    }

    fn reset(&mut self) {
        self.hold = None;
        self.pressed = false;
    }
}

impl Stylable for ClickAction {
    fn style_properties(&self) -> &'static [&'static str] {
        &["long-press-duration", "drag-threshold"]
    }

    fn set_style_property(&mut self, name: &str, value: &StyleValue) -> Result<(), StyleError> {
        match name {
            "long-press-duration" => {
                self.set_long_press_duration(Duration::from_millis(u64::from(value.as_u32(name)?)))
            }
            "drag-threshold" => self.set_drag_threshold(value.as_length(name)?),
            _ => return Err(style::unknown(name)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn action() -> ClickAction {
        ClickAction::new(Rect::new(0.0, 0.0, 100.0, 100.0))
    }

    fn ev(kind: PointerEventKind, x: f32, y: f32, t: Instant) -> PointerEvent {
        PointerEvent::new(kind, x, y, t)
    }

    #[test]
    fn test_press_release_inside_clicks() {
        let t = Instant::now();
        let mut click = action();
        assert_eq!(click.handle_event(&ev(PointerEventKind::Press, 10.0, 10.0, t)), (Propagation::Stop, None));
        assert!(click.is_held() && click.is_pressed() && click.has_grab());

        let (prop, out) = click.handle_event(&ev(PointerEventKind::Release, 20.0, 20.0, t));
        assert_eq!(prop, Propagation::Stop);
        assert!(matches!(out, Some(ClickEvent::Clicked { button: 1, .. })));
        assert!(!click.is_held() && !click.has_grab());
    }

    #[test]
    fn test_press_outside_propagates() {
        let t = Instant::now();
        let mut click = action();
        let (prop, _) = click.handle_event(&ev(PointerEventKind::Press, 150.0, 10.0, t));
        assert_eq!(prop, Propagation::Propagate);
        assert!(!click.is_held());
    }

    #[test]
    fn test_release_requires_matching_press() {
        let t = Instant::now();
        let press = ev(PointerEventKind::Press, 10.0, 10.0, t)
            .with_button(1)
            .with_device(2)
            .with_sequence(7);
        let release = ev(PointerEventKind::Release, 10.0, 10.0, t)
            .with_button(1)
            .with_device(2)
            .with_sequence(7);

        let mismatches = [
            release.with_button(3),
            release.with_device(4),
            release.with_sequence(8),
        ];
        for mismatch in mismatches {
            let mut click = action();
            click.handle_event(&press);
            assert_eq!(click.handle_event(&mismatch), (Propagation::Propagate, None));
            assert!(click.is_held());
            // The original release still completes it
            assert!(matches!(click.handle_event(&release).1, Some(ClickEvent::Clicked { .. })));
        }
    }

    #[test]
    fn test_release_outside_does_not_click() {
        let t = Instant::now();
        let mut click = action();
        click.handle_event(&ev(PointerEventKind::Press, 10.0, 10.0, t));
        click.handle_event(&ev(PointerEventKind::Leave, 150.0, 10.0, t));
        assert!(!click.is_pressed());
        let (prop, out) = click.handle_event(&ev(PointerEventKind::Release, 150.0, 10.0, t));
        assert_eq!((prop, out), (Propagation::Stop, None));
        assert!(!click.is_held());
    }

    #[test]
    fn test_release_while_idle_propagates() {
        let mut click = action();
        let out = click.handle_event(&ev(PointerEventKind::Release, 10.0, 10.0, Instant::now()));
        assert_eq!(out, (Propagation::Propagate, None));
    }

    #[test]
    fn test_long_press_fires_and_resets() {
        let t = Instant::now();
        let phases = Rc::new(RefCell::new(Vec::new()));
        let seen = phases.clone();
        let mut click = action();
        click.set_long_press_handler(move |phase| {
            seen.borrow_mut().push(phase);
            true
        });

        click.handle_event(&ev(PointerEventKind::Press, 10.0, 10.0, t));
        assert!(click.long_press_pending());
        assert_eq!(click.tick(t + Duration::from_millis(100)), None);
        assert_eq!(
            click.tick(t + Duration::from_millis(500)),
            Some(ClickEvent::LongPress(LongPressPhase::Activate))
        );
        assert!(!click.is_held());

        // A late release after activation is not a click
        let out = click.handle_event(&ev(PointerEventKind::Release, 10.0, 10.0, t));
        assert_eq!(out, (Propagation::Propagate, None));
        assert_eq!(*phases.borrow(), vec![LongPressPhase::Query, LongPressPhase::Activate]);
    }

    #[test]
    fn test_long_press_needs_approval() {
        let t = Instant::now();
        let mut click = action();
        click.set_long_press_handler(|_| false);
        click.handle_event(&ev(PointerEventKind::Press, 10.0, 10.0, t));
        assert!(!click.long_press_pending());
        assert_eq!(click.tick(t + Duration::from_secs(5)), None);
        assert!(click.is_held());
    }

    #[test]
    fn test_drag_cancels_long_press_only() {
        let t = Instant::now();
        let mut click = action();
        click.set_long_press_handler(|_| true);
        click.handle_event(&ev(PointerEventKind::Press, 10.0, 10.0, t));

        let (_, out) = click.handle_event(&ev(PointerEventKind::Motion, 14.0, 10.0, t));
        assert_eq!(out, None);
        let (_, out) = click.handle_event(&ev(PointerEventKind::Motion, 30.0, 10.0, t));
        assert_eq!(out, Some(ClickEvent::LongPress(LongPressPhase::Cancel)));
        assert!(!click.long_press_pending());
        assert_eq!(click.tick(t + Duration::from_secs(1)), None);

        let (_, out) = click.handle_event(&ev(PointerEventKind::Release, 30.0, 10.0, t));
        assert!(matches!(out, Some(ClickEvent::Clicked { x, .. }) if x == 30.0));
    }

    #[test]
    fn test_explicit_release_cancels_atomically() {
        let t = Instant::now();
        let mut click = action();
        click.set_long_press_handler(|_| true);
        click.handle_event(&ev(PointerEventKind::Press, 10.0, 10.0, t));

        assert_eq!(click.release(), Some(ClickEvent::LongPress(LongPressPhase::Cancel)));
        assert!(!click.is_held() && !click.is_pressed() && !click.has_grab());
        assert_eq!(click.tick(t + Duration::from_secs(1)), None);
        let out = click.handle_event(&ev(PointerEventKind::Release, 10.0, 10.0, t));
        assert_eq!(out, (Propagation::Propagate, None));
    }

    #[test]
    fn test_modifiers_and_style() {
        let t = Instant::now();
        let mut click = action();
        assert_eq!(click.apply_style(&[("long-press-duration", "250"), ("drag-threshold", "3px")]), 2);
        assert_eq!(click.long_press_duration(), Duration::from_millis(250));

        click.handle_event(&ev(PointerEventKind::Press, 1.0, 1.0, t).with_modifiers(Modifiers::CONTROL));
        assert_eq!(click.modifiers(), Modifiers::CONTROL);
        assert_eq!(click.button(), Some(1));
    }
}
