//! Stage window policy
//!
//! The stage is the dashboard's own top-level window. The window manager is
//! free to change its state or steal activation; these functions decide how
//! the backend answers. They are pure so the decisions are testable without
//! an X server.

use crate::shared::Geometry;
use crate::tracker::{MonitorInfo, WindowId, WindowState};

/// States the stage must always carry
pub const REQUIRED_STAGE_STATE: WindowState = WindowState::SKIP_PAGER
    .union(WindowState::SKIP_TASKLIST)
    .union(WindowState::ABOVE)
    .union(WindowState::PINNED);

/// Required flags the window manager has cleared
pub fn missing_stage_state(current: WindowState) -> WindowState {
    REQUIRED_STAGE_STATE.difference(current)
}

/// Flags to re-assert after `window`'s properties were re-read
///
/// PINNED follows `_NET_WM_DESKTOP` as well as `_NET_WM_STATE`, so this
/// looks at the refreshed state whichever property changed.
pub fn stage_state_to_heal(window: WindowId, stage: Option<WindowId>, refreshed: WindowState) -> WindowState {
    if stage != Some(window) {
        return WindowState::empty();
    }
    missing_stage_state(refreshed)
}

/// Whether the stage has to be re-activated after the active window moved
pub fn should_reselect_stage(active: Option<WindowId>, stage: WindowId, stage_visible: bool) -> bool {
    stage_visible && active != Some(stage)
}

/// Where the stage goes after the monitor layout changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagePlacement {
    /// `_NET_WM_FULLSCREEN_MONITORS` indices for each edge
    FullscreenMonitors {
        top: u32,
        bottom: u32,
        left: u32,
        right: u32,
    },
    /// Degraded mode: cover the primary monitor only
    Primary(Geometry),
}

/// Span all monitors when the WM supports it, else fall back to the primary monitor
pub fn stage_placement(
    monitors: &[MonitorInfo],
    screen: (u32, u32),
    supports_fullscreen_monitors: bool,
) -> StagePlacement {
    let fallback = Geometry::new(0, 0, screen.0, screen.1);
    if monitors.is_empty() {
        return StagePlacement::Primary(fallback);
    }

    if supports_fullscreen_monitors {
        let edge = |pick: fn(&Geometry) -> i32, prefer_less: bool| -> u32 {
            let mut best = &monitors[0];
            for monitor in &monitors[1..] {
                let (a, b) = (pick(&monitor.geometry), pick(&best.geometry));
                if (prefer_less && a < b) || (!prefer_less && a > b) {
                    best = monitor;
                }
            }
            best.index as u32
        };
        return StagePlacement::FullscreenMonitors {
            top: edge(|g| g.y, true),
            bottom: edge(|g| g.bottom(), false),
            left: edge(|g| g.x, true),
            right: edge(|g| g.right(), false),
        };
    }

    let primary = monitors
        .iter()
        .find(|m| m.primary)
        .unwrap_or(&monitors[0]);
    StagePlacement::Primary(primary.geometry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(index: usize, geometry: Geometry, primary: bool) -> MonitorInfo {
        MonitorInfo {
            index,
            geometry,
            primary,
            name: format!("OUT-{index}"),
        }
    }

    #[test]
    fn test_cleared_flags_are_reasserted() {
        let state = WindowState::SKIP_PAGER | WindowState::ABOVE | WindowState::MINIMIZED;
        assert_eq!(
            missing_stage_state(state),
            WindowState::SKIP_TASKLIST | WindowState::PINNED
        );
        assert!(missing_stage_state(REQUIRED_STAGE_STATE | WindowState::URGENT).is_empty());
    }

    #[test]
    fn test_desktop_move_unpins_stage() {
        let stage = WindowId(9);
        // Moved to a single desktop: state atoms intact, PINNED gone
        let refreshed = REQUIRED_STAGE_STATE.difference(WindowState::PINNED);
        assert_eq!(
            stage_state_to_heal(stage, Some(stage), refreshed),
            WindowState::PINNED
        );
        assert!(stage_state_to_heal(stage, Some(stage), REQUIRED_STAGE_STATE).is_empty());
        assert!(stage_state_to_heal(WindowId(3), Some(stage), WindowState::empty()).is_empty());
        assert!(stage_state_to_heal(stage, None, WindowState::empty()).is_empty());
    }

    #[test]
    fn test_reselect_only_while_visible() {
        let stage = WindowId(9);
        assert!(should_reselect_stage(Some(WindowId(3)), stage, true));
        assert!(should_reselect_stage(None, stage, true));
        assert!(!should_reselect_stage(Some(stage), stage, true));
        assert!(!should_reselect_stage(Some(WindowId(3)), stage, false));
    }

    #[test]
    fn test_spans_all_monitors_when_supported() {
        // Right-hand monitor sits lower and is taller
        let monitors = vec![
            monitor(0, Geometry::new(0, 100, 1920, 1080), true),
            monitor(1, Geometry::new(1920, 0, 1280, 1400), false),
        ];
        assert_eq!(
            stage_placement(&monitors, (3200, 1400), true),
            StagePlacement::FullscreenMonitors {
                top: 1,
                bottom: 1,
                left: 0,
                right: 1
            }
        );
    }

    #[test]
    fn test_falls_back_to_primary_monitor() {
        let monitors = vec![
            monitor(0, Geometry::new(0, 0, 1280, 1024), false),
            monitor(1, Geometry::new(1280, 0, 1920, 1080), true),
        ];
        assert_eq!(
            stage_placement(&monitors, (3200, 1080), false),
            StagePlacement::Primary(Geometry::new(1280, 0, 1920, 1080))
        );
        assert_eq!(
            stage_placement(&[], (800, 600), true),
            StagePlacement::Primary(Geometry::new(0, 0, 800, 600))
        );
    }
}
