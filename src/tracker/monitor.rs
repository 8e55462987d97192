//! Monitors and window-to-monitor membership
//!
//! Membership is never stored by the backend. A window belongs to the
//! monitor containing its geometric midpoint, after clamping the midpoint
//! to the screen. Windows whose midpoint falls into a gap between monitors
//! belong to no monitor.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::shared::Geometry;

/// Snapshot of a monitor as reported by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorInfo {
    pub index: usize,
    pub geometry: Geometry,
    pub primary: bool,
    pub name: String,
}

/// A tracked monitor, identified by its index
pub struct Monitor {
    index: usize,
    name: String,
    geometry: Cell<Geometry>,
    primary: Cell<bool>,
}

pub type MonitorHandle = Rc<Monitor>;

impl Monitor {
    pub(crate) fn new(info: MonitorInfo) -> MonitorHandle {
        Rc::new(Self {
            index: info.index,
            name: info.name,
            geometry: Cell::new(info.geometry),
            primary: Cell::new(info.primary),
        })
    }

    pub fn number(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry.get()
    }

    pub fn is_primary(&self) -> bool {
        self.primary.get()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.geometry().contains(x, y)
    }

    pub(crate) fn set_geometry(&self, geometry: Geometry) -> bool {
        let changed = self.geometry.get() != geometry;
        self.geometry.set(geometry);
        changed
    }

    pub(crate) fn set_primary(&self, primary: bool) {
        self.primary.set(primary);
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("geometry", &self.geometry.get())
            .field("primary", &self.primary.get())
            .finish()
    }
}

/// Midpoint of `window` clamped into `[0, screen_w) × [0, screen_h)`
pub fn clamped_midpoint(window: &Geometry, screen: (u32, u32)) -> (i32, i32) {
    let (mx, my) = window.midpoint();
    let max_x = (screen.0 as i32 - 1).max(0);
    let max_y = (screen.1 as i32 - 1).max(0);
    (mx.clamp(0, max_x), my.clamp(0, max_y))
}

/// Whether the clamped midpoint of `window` lies on `monitor`
pub fn is_window_on_monitor(window: &Geometry, monitor: &Geometry, screen: (u32, u32)) -> bool {
    let (x, y) = clamped_midpoint(window, screen);
    monitor.contains(x, y)
}

/// First monitor containing the clamped midpoint of `window`
pub fn monitor_index_for_window(
    window: &Geometry,
    monitors: &[Geometry],
    screen: (u32, u32),
) -> Option<usize> {
    monitors
        .iter()
        .position(|m| is_window_on_monitor(window, m, screen))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: (u32, u32) = (3200, 1080);

    fn dual() -> Vec<Geometry> {
        vec![
            Geometry::new(0, 0, 1920, 1080),
            Geometry::new(1920, 0, 1280, 1024),
        ]
    }

    #[test]
    fn test_straddling_window_goes_to_midpoint_monitor() {
        let monitors = dual();
        // Mostly on the right monitor by area, midpoint still on the left one
        let w = Geometry::new(1000, 100, 1800, 400);
        assert_eq!(w.midpoint(), (1900, 300));
        assert_eq!(monitor_index_for_window(&w, &monitors, SCREEN), Some(0));

        let w = Geometry::new(1200, 100, 1800, 400);
        assert_eq!(monitor_index_for_window(&w, &monitors, SCREEN), Some(1));
    }

    #[test]
    fn test_exactly_one_monitor_matches() {
        let monitors = dual();
        for x in (-500..3700).step_by(97) {
            for y in (-300..1400).step_by(89) {
                let w = Geometry::new(x, y, 300, 200);
                let hits = monitors
                    .iter()
                    .filter(|m| is_window_on_monitor(&w, m, SCREEN))
                    .count();
                let found = monitor_index_for_window(&w, &monitors, SCREEN);
                // The right monitor is 1024 tall, so a clamped midpoint below it is in a gap
                let (cx, cy) = clamped_midpoint(&w, SCREEN);
                if cx >= 1920 && cy >= 1024 {
                    assert_eq!(hits, 0);
                    assert_eq!(found, None);
                } else {
                    assert_eq!(hits, 1);
                    assert!(found.is_some_and(|i| is_window_on_monitor(&w, &monitors[i], SCREEN)));
                }
            }
        }
    }

    #[test]
    fn test_offscreen_window_is_clamped() {
        let monitors = dual();
        let w = Geometry::new(-2000, -2000, 100, 100);
        assert_eq!(clamped_midpoint(&w, SCREEN), (0, 0));
        assert_eq!(monitor_index_for_window(&w, &monitors, SCREEN), Some(0));

        let w = Geometry::new(5000, 10, 100, 100);
        assert_eq!(monitor_index_for_window(&w, &monitors, SCREEN), Some(1));
    }

    #[test]
    fn test_no_monitors_means_no_membership() {
        let w = Geometry::new(0, 0, 10, 10);
        assert_eq!(monitor_index_for_window(&w, &[], SCREEN), None);
    }
}
