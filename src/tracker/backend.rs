//! Windowing backend capability interface
//!
//! A backend adapts one windowing system to the tracker. Every query and
//! request has a default implementation that logs the missing capability
//! and returns a neutral value, so a backend only implements what its
//! windowing system supports and callers treat "no data" as a normal state.

use tracing::warn;

use super::monitor::MonitorInfo;
use super::window::{WindowId, WindowInfo};
use super::workspace::WorkspaceInfo;
use crate::shared::{Geometry, IconImage};

/// Native surface of the dashboard itself (the X11 window for X11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Live content of a window, as exposed by the backend
///
/// `resource` names the backend object holding the pixels (an X11 pixmap
/// for the X11 backend). It may differ after each resize, so views fetch a
/// fresh surface instead of caching one and hand the old one back through
/// [`WindowTrackerBackend::release_window_surface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSurface {
    pub window: WindowId,
    pub resource: u64,
    pub width: u32,
    pub height: u32,
}

/// Change observed by a backend, in observation order
#[derive(Debug, Clone, PartialEq)]
pub enum BackendChange {
    WindowOpened(WindowInfo),
    WindowClosed(WindowId),
    /// Full snapshot of a window after any of its properties changed
    WindowChanged(WindowInfo),
    WindowIconChanged(WindowId),
    /// Window ids bottom to top
    StackingChanged(Vec<WindowId>),
    ActiveWindowChanged(Option<WindowId>),
    WorkspacesChanged(Vec<WorkspaceInfo>),
    ActiveWorkspaceChanged(Option<usize>),
    MonitorsChanged(Vec<MonitorInfo>),
    ScreenSizeChanged { width: u32, height: u32 },
}

/// Log that `backend` lacks `capability`
pub fn missing_capability(backend: &str, capability: &str) {
    warn!(
        backend,
        capability, "Window tracker backend '{}' does not implement '{}'", backend, capability
    );
}

/// Capability set a windowing backend provides to the tracker
pub trait WindowTrackerBackend {
    /// Backend name, e.g. "x11"
    fn name(&self) -> &str;

    /// Drain changes observed since the last call
    fn dispatch(&mut self) -> Vec<BackendChange> {
        Vec::new()
    }

    /// False once the connection to the windowing system is gone for good
    fn is_connected(&self) -> bool {
        true
    }

    fn windows(&self) -> Vec<WindowInfo> {
        missing_capability(self.name(), "windows");
        Vec::new()
    }

    /// Window ids bottom to top
    fn windows_stacked(&self) -> Vec<WindowId> {
        missing_capability(self.name(), "windows_stacked");
        Vec::new()
    }

    fn active_window(&self) -> Option<WindowId> {
        missing_capability(self.name(), "active_window");
        None
    }

    fn workspaces(&self) -> Vec<WorkspaceInfo> {
        missing_capability(self.name(), "workspaces");
        Vec::new()
    }

    fn active_workspace(&self) -> Option<usize> {
        missing_capability(self.name(), "active_workspace");
        None
    }

    fn monitors(&self) -> Vec<MonitorInfo> {
        missing_capability(self.name(), "monitors");
        Vec::new()
    }

    fn screen_size(&self) -> (u32, u32) {
        missing_capability(self.name(), "screen_size");
        (0, 0)
    }

    fn window_geometry(&self, _window: WindowId) -> Option<Geometry> {
        missing_capability(self.name(), "window_geometry");
        None
    }

    fn set_window_geometry(&self, _window: WindowId, _geometry: Geometry) {
        missing_capability(self.name(), "set_window_geometry");
    }

    fn activate_window(&self, _window: WindowId) {
        missing_capability(self.name(), "activate_window");
    }

    fn close_window(&self, _window: WindowId) {
        missing_capability(self.name(), "close_window");
    }

    fn activate_workspace(&self, _index: usize) {
        missing_capability(self.name(), "activate_workspace");
    }

    fn window_icon(&self, _window: WindowId) -> Option<IconImage> {
        missing_capability(self.name(), "window_icon");
        None
    }

    fn window_surface(&self, _window: WindowId) -> Option<WindowSurface> {
        missing_capability(self.name(), "window_surface");
        None
    }

    /// Backends without per-surface resources have nothing to release
    fn release_window_surface(&self, _surface: &WindowSurface) {}

    fn window_for_surface(&self, _surface: SurfaceId) -> Option<WindowId> {
        missing_capability(self.name(), "window_for_surface");
        None
    }

    fn surface_for_window(&self, _window: WindowId) -> Option<SurfaceId> {
        missing_capability(self.name(), "surface_for_window");
        None
    }

    /// Present `window` as the dashboard's shell surface
    fn show_stage(&self, _window: WindowId) {
        missing_capability(self.name(), "show_stage");
    }

    fn hide_stage(&self, _window: WindowId) {
        missing_capability(self.name(), "hide_stage");
    }
}
