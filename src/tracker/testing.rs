//! Scriptable in-memory backend for tests

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use super::backend::{BackendChange, SurfaceId, WindowSurface, WindowTrackerBackend};
use super::monitor::MonitorInfo;
use super::window::{WindowId, WindowInfo};
use super::workspace::WorkspaceInfo;
use crate::shared::{Geometry, IconImage};

#[derive(Default)]
pub(crate) struct FakeState {
    pub windows: Vec<WindowInfo>,
    pub stacking: Vec<WindowId>,
    pub active_window: Option<WindowId>,
    pub workspaces: Vec<WorkspaceInfo>,
    pub active_workspace: Option<usize>,
    pub monitors: Vec<MonitorInfo>,
    pub screen: (u32, u32),
    pub icons: HashMap<WindowId, IconImage>,
    pub pending: VecDeque<BackendChange>,
    pub next_resource: u64,
    pub released: Vec<WindowSurface>,
    pub requests: Vec<String>,
    pub disconnected: bool,
}

pub(crate) struct FakeBackend {
    state: Rc<RefCell<FakeState>>,
}

/// Test-side handle for scripting the fake backend
#[derive(Clone)]
pub(crate) struct FakeControl {
    state: Rc<RefCell<FakeState>>,
}

pub(crate) fn window_info(id: u64, name: &str, geometry: Geometry) -> WindowInfo {
    WindowInfo {
        id: WindowId(id),
        name: name.to_string(),
        geometry,
        workspace: Some(0),
        ..Default::default()
    }
}

impl FakeBackend {
    /// Two workspaces, a 1920x1080 primary monitor and a 1280x1024 one to its right
    pub(crate) fn new() -> (FakeBackend, FakeControl) {
        let state = FakeState {
            workspaces: vec![
                WorkspaceInfo::new(0, "Workspace 1"),
                WorkspaceInfo::new(1, "Workspace 2"),
            ],
            active_workspace: Some(0),
            monitors: vec![
                MonitorInfo {
                    index: 0,
                    geometry: Geometry::new(0, 0, 1920, 1080),
                    primary: true,
                    name: "DP-1".into(),
                },
                MonitorInfo {
                    index: 1,
                    geometry: Geometry::new(1920, 0, 1280, 1024),
                    primary: false,
                    name: "HDMI-1".into(),
                },
            ],
            screen: (3200, 1080),
            next_resource: 100,
            ..Default::default()
        };
        let state = Rc::new(RefCell::new(state));
        (
            FakeBackend {
                state: state.clone(),
            },
            FakeControl { state },
        )
    }
}

impl FakeControl {
    /// Add a window present before the tracker starts
    pub(crate) fn add_window(&self, info: WindowInfo) {
        let mut s = self.state.borrow_mut();
        s.stacking.push(info.id);
        s.windows.push(info);
    }

    /// Open a window and queue the change
    pub(crate) fn open_window(&self, info: WindowInfo) {
        self.add_window(info.clone());
        self.push(BackendChange::WindowOpened(info));
    }

    pub(crate) fn close_window_id(&self, id: u64) {
        let id = WindowId(id);
        {
            let mut s = self.state.borrow_mut();
            s.windows.retain(|w| w.id != id);
            s.stacking.retain(|w| *w != id);
            if s.active_window == Some(id) {
                s.active_window = None;
            }
        }
        self.push(BackendChange::WindowClosed(id));
    }

    pub(crate) fn update_window<F: FnOnce(&mut WindowInfo)>(&self, id: u64, f: F) {
        let info = {
            let mut s = self.state.borrow_mut();
            let Some(info) = s.windows.iter_mut().find(|w| w.id == WindowId(id)) else {
                return;
            };
            f(info);
            info.clone()
        };
        self.push(BackendChange::WindowChanged(info));
    }

    pub(crate) fn set_icon(&self, id: u64, icon: IconImage) {
        self.state.borrow_mut().icons.insert(WindowId(id), icon);
        self.push(BackendChange::WindowIconChanged(WindowId(id)));
    }

    pub(crate) fn set_active_window(&self, id: Option<u64>) {
        self.state.borrow_mut().active_window = id.map(WindowId);
    }

    pub(crate) fn monitors(&self) -> Vec<MonitorInfo> {
        self.state.borrow().monitors.clone()
    }

    pub(crate) fn push(&self, change: BackendChange) {
        self.state.borrow_mut().pending.push_back(change);
    }

    /// Drop the connection; queued changes are never delivered
    pub(crate) fn disconnect(&self) {
        let mut s = self.state.borrow_mut();
        s.disconnected = true;
        s.pending.clear();
    }

    pub(crate) fn released(&self) -> Vec<WindowSurface> {
        self.state.borrow().released.clone()
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.state.borrow().requests.clone()
    }
}

impl WindowTrackerBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn dispatch(&mut self) -> Vec<BackendChange> {
        self.state.borrow_mut().pending.drain(..).collect()
    }

    fn is_connected(&self) -> bool {
        !self.state.borrow().disconnected
    }

    fn windows(&self) -> Vec<WindowInfo> {
        self.state.borrow().windows.clone()
    }

    fn windows_stacked(&self) -> Vec<WindowId> {
        self.state.borrow().stacking.clone()
    }

    fn active_window(&self) -> Option<WindowId> {
        self.state.borrow().active_window
    }

    fn workspaces(&self) -> Vec<WorkspaceInfo> {
        self.state.borrow().workspaces.clone()
    }

    fn active_workspace(&self) -> Option<usize> {
        self.state.borrow().active_workspace
    }

    fn monitors(&self) -> Vec<MonitorInfo> {
        self.state.borrow().monitors.clone()
    }

    fn screen_size(&self) -> (u32, u32) {
        self.state.borrow().screen
    }

    fn window_geometry(&self, window: WindowId) -> Option<Geometry> {
        self.state
            .borrow()
            .windows
            .iter()
            .find(|w| w.id == window)
            .map(|w| w.geometry)
    }

    fn set_window_geometry(&self, window: WindowId, geometry: Geometry) {
        self.state.borrow_mut().requests.push(format!(
            "geometry {} {},{} {}x{}",
            window.0, geometry.x, geometry.y, geometry.width, geometry.height
        ));
    }

    fn activate_window(&self, window: WindowId) {
        self.state
            .borrow_mut()
            .requests
            .push(format!("activate {}", window.0));
    }

    fn close_window(&self, window: WindowId) {
        self.state
            .borrow_mut()
            .requests
            .push(format!("close {}", window.0));
    }

    fn window_icon(&self, window: WindowId) -> Option<IconImage> {
        self.state.borrow().icons.get(&window).cloned()
    }

    /// Hands out a new resource on every call, like a pixmap per resize
    fn window_surface(&self, window: WindowId) -> Option<WindowSurface> {
        let mut s = self.state.borrow_mut();
        let geometry = s.windows.iter().find(|w| w.id == window)?.geometry;
        s.next_resource += 1;
        Some(WindowSurface {
            window,
            resource: s.next_resource,
            width: geometry.width,
            height: geometry.height,
        })
    }

    fn release_window_surface(&self, surface: &WindowSurface) {
        self.state.borrow_mut().released.push(surface.clone());
    }

    fn window_for_surface(&self, surface: SurfaceId) -> Option<WindowId> {
        let id = WindowId(surface.0);
        self.state
            .borrow()
            .windows
            .iter()
            .any(|w| w.id == id)
            .then_some(id)
    }
}
