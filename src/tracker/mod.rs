//! Window tracker
//!
//! Single source of truth for windows, workspaces and monitors. The tracker
//! owns the active backend, caches what it reports and republishes every
//! backend change as a [`TrackerEvent`]. Events are delivered synchronously
//! in the order the backend observed the changes.
//!
//! The tracker is created once by the application and shared as
//! `Rc<WindowTracker>`; components receive it explicitly.

pub mod backend;
pub mod event;
pub mod monitor;
pub mod window;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::shared::{Geometry, IconImage};
use crate::signal::{Signal, Subscription};

pub use backend::{BackendChange, SurfaceId, WindowSurface, WindowTrackerBackend};
pub use event::{EventKind, TrackerEvent};
pub use monitor::{Monitor, MonitorHandle, MonitorInfo};
pub use window::{
    WeakWindowHandle, Window, WindowActions, WindowHandle, WindowId, WindowInfo, WindowState,
};
pub use workspace::{Workspace, WorkspaceHandle, WorkspaceInfo};

/// Tracker query errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("workspace index {index} out of range (count: {count})")]
    WorkspaceIndex { index: usize, count: usize },

    #[error("monitor index {index} out of range (count: {count})")]
    MonitorIndex { index: usize, count: usize },

    #[error("unknown window {0}")]
    UnknownWindow(WindowId),
}

#[derive(Default)]
struct TrackerState {
    /// Windows in the order they were opened
    windows: Vec<WindowHandle>,
    /// Window ids bottom to top
    stacking: Vec<WindowId>,
    active_window: Option<WeakWindowHandle>,
    workspaces: Vec<WorkspaceHandle>,
    active_workspace: Option<Weak<Workspace>>,
    monitors: Vec<MonitorHandle>,
    primary_monitor: Option<Weak<Monitor>>,
    screen_size: (u32, u32),
}

impl TrackerState {
    fn window(&self, id: WindowId) -> Option<WindowHandle> {
        self.windows.iter().find(|w| w.id() == id).cloned()
    }

    fn workspace(&self, index: Option<usize>) -> Option<WorkspaceHandle> {
        index.and_then(|i| self.workspaces.get(i).cloned())
    }

    fn monitor(&self, index: Option<usize>) -> Option<MonitorHandle> {
        index.and_then(|i| self.monitors.get(i).cloned())
    }

    fn monitor_index_for(&self, geometry: &Geometry) -> Option<usize> {
        let monitors: Vec<Geometry> = self.monitors.iter().map(|m| m.geometry()).collect();
        monitor::monitor_index_for_window(geometry, &monitors, self.screen_size)
    }

    /// Re-derive the monitor of `window`, queueing an event if it moved
    fn update_window_monitor(&self, window: &WindowHandle, events: &mut Vec<TrackerEvent>) {
        let new = self.monitor_index_for(&window.geometry());
        let old = window.monitor_index();
        if new != old {
            window.set_monitor_index(new);
            events.push(TrackerEvent::WindowMonitorChanged {
                window: window.clone(),
                old: self.monitor(old),
            });
        }
    }

    fn update_all_window_monitors(&self, events: &mut Vec<TrackerEvent>) {
        for window in &self.windows {
            self.update_window_monitor(window, events);
        }
    }
}

fn upgrade<T>(weak: &Option<Weak<T>>) -> Option<Rc<T>> {
    weak.as_ref().and_then(Weak::upgrade)
}

fn same<T>(a: &Option<Rc<T>>, b: &Option<Rc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Process-wide window, workspace and monitor state
pub struct WindowTracker {
    backend: RefCell<Box<dyn WindowTrackerBackend>>,
    backend_name: String,
    state: RefCell<TrackerState>,
    signal: Signal<TrackerEvent>,
}

impl WindowTracker {
    /// Create the tracker and load the backend's current state
    pub fn new(backend: Box<dyn WindowTrackerBackend>) -> Rc<Self> {
        let backend_name = backend.name().to_string();
        info!("Initializing window tracker with backend '{}'", backend_name);

        let tracker = Rc::new(Self {
            backend: RefCell::new(backend),
            backend_name,
            state: RefCell::new(TrackerState::default()),
            signal: Signal::new(),
        });
        tracker.refresh();
        tracker
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Receive every tracker event
    #[must_use = "dropping the subscription disconnects the handler"]
    pub fn connect_all<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&TrackerEvent) + 'static,
    {
        self.signal.connect(handler)
    }

    /// Receive events of one kind
    #[must_use = "dropping the subscription disconnects the handler"]
    pub fn connect<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&TrackerEvent) + 'static,
    {
        self.signal.connect(move |event| {
            if event.kind() == kind {
                handler(event);
            }
        })
    }

    /// Receive events of one kind about one window
    #[must_use = "dropping the subscription disconnects the handler"]
    pub fn connect_window<F>(&self, window: &Window, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&TrackerEvent) + 'static,
    {
        let id = window.id();
        self.signal.connect(move |event| {
            if event.kind() == kind && event.window().is_some_and(|w| w.id() == id) {
                handler(event);
            }
        })
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.signal.handler_count()
    }

    // ------------------------------------------------------------------
    // Change processing
    // ------------------------------------------------------------------

    /// Apply all changes the backend observed since the last call
    pub fn dispatch(&self) -> usize {
        let changes = self.backend.borrow_mut().dispatch();
        let count = changes.len();
        for change in changes {
            self.apply(change);
        }
        count
    }

    /// Whether the backend can still deliver changes
    pub fn is_backend_connected(&self) -> bool {
        self.backend.borrow().is_connected()
    }

    /// Resynchronise with full snapshots from the backend
    pub fn refresh(&self) {
        let (screen, monitors, workspaces, windows, stacking, active_ws, active_window) = {
            let backend = self.backend.borrow();
            (
                backend.screen_size(),
                backend.monitors(),
                backend.workspaces(),
                backend.windows(),
                backend.windows_stacked(),
                backend.active_workspace(),
                backend.active_window(),
            )
        };

        self.apply(BackendChange::ScreenSizeChanged {
            width: screen.0,
            height: screen.1,
        });
        self.apply(BackendChange::MonitorsChanged(monitors));
        self.apply(BackendChange::WorkspacesChanged(workspaces));

        let gone: Vec<WindowId> = self
            .state
            .borrow()
            .windows
            .iter()
            .map(|w| w.id())
            .filter(|id| !windows.iter().any(|info| info.id == *id))
            .collect();
        for id in gone {
            self.apply(BackendChange::WindowClosed(id));
        }
        for info in windows {
            let known = self.state.borrow().window(info.id).is_some();
            if known {
                self.apply(BackendChange::WindowChanged(info));
            } else {
                self.apply(BackendChange::WindowOpened(info));
            }
        }

        self.apply(BackendChange::StackingChanged(stacking));
        self.apply(BackendChange::ActiveWorkspaceChanged(active_ws));
        self.apply(BackendChange::ActiveWindowChanged(active_window));
    }

    /// Apply one backend change and emit the resulting events
    pub fn apply(&self, change: BackendChange) {
        let events = {
            let mut state = self.state.borrow_mut();
            let mut events = Vec::new();
            match change {
                BackendChange::WindowOpened(info) => Self::window_opened(&mut state, info, &mut events),
                BackendChange::WindowClosed(id) => Self::window_closed(&mut state, id, &mut events),
                BackendChange::WindowChanged(info) => Self::window_changed(&state, info, &mut events),
                BackendChange::WindowIconChanged(id) => match state.window(id) {
                    Some(window) => events.push(TrackerEvent::WindowIconChanged(window)),
                    None => debug!("Icon change for unknown window {}", id),
                },
                BackendChange::StackingChanged(ids) => {
                    if state.stacking != ids {
                        state.stacking = ids;
                        events.push(TrackerEvent::WindowStackingChanged);
                    }
                }
                BackendChange::ActiveWindowChanged(id) => {
                    let old = upgrade(&state.active_window);
                    let new = id.and_then(|id| state.window(id));
                    if !same(&old, &new) {
                        state.active_window = new.as_ref().map(Rc::downgrade);
                        events.push(TrackerEvent::ActiveWindowChanged { old, new });
                    }
                }
                BackendChange::WorkspacesChanged(list) => Self::workspaces_changed(&mut state, list, &mut events),
                BackendChange::ActiveWorkspaceChanged(index) => {
                    let old = upgrade(&state.active_workspace);
                    let new = state.workspace(index);
                    if !same(&old, &new) {
                        state.active_workspace = new.as_ref().map(Rc::downgrade);
                        events.push(TrackerEvent::ActiveWorkspaceChanged { old, new });
                    }
                }
                BackendChange::MonitorsChanged(list) => Self::monitors_changed(&mut state, list, &mut events),
                BackendChange::ScreenSizeChanged { width, height } => {
                    if state.screen_size != (width, height) {
                        state.screen_size = (width, height);
                        events.push(TrackerEvent::ScreenSizeChanged { width, height });
                        state.update_all_window_monitors(&mut events);
                    }
                }
            }
            events
        };

        for event in &events {
            self.signal.emit(event);
        }
    }

    fn window_opened(state: &mut TrackerState, info: WindowInfo, events: &mut Vec<TrackerEvent>) {
        if state.window(info.id).is_some() {
            debug!("Window {} reported opened twice, treating as update", info.id);
            Self::window_changed(state, info, events);
            return;
        }

        debug!("Window opened: {} '{}'", info.id, info.name);
        let window = Window::new(info);
        window.set_monitor_index(state.monitor_index_for(&window.geometry()));
        if !state.stacking.contains(&window.id()) {
            state.stacking.push(window.id());
        }
        state.windows.push(window.clone());
        events.push(TrackerEvent::WindowOpened(window));
    }

    fn window_closed(state: &mut TrackerState, id: WindowId, events: &mut Vec<TrackerEvent>) {
        let Some(pos) = state.windows.iter().position(|w| w.id() == id) else {
            debug!("Close for unknown window {}", id);
            return;
        };

        debug!("Window closed: {}", id);
        let window = state.windows.remove(pos);
        state.stacking.retain(|w| *w != id);
        window.mark_closed();

        if upgrade(&state.active_window).is_some_and(|w| Rc::ptr_eq(&w, &window)) {
            state.active_window = None;
            events.push(TrackerEvent::ActiveWindowChanged {
                old: Some(window.clone()),
                new: None,
            });
        }
        events.push(TrackerEvent::WindowClosed(window));
    }

    fn window_changed(state: &TrackerState, info: WindowInfo, events: &mut Vec<TrackerEvent>) {
        let Some(window) = state.window(info.id) else {
            debug!("Change for unknown window {}", info.id);
            return;
        };

        let old_workspace = window.workspace_index();
        let old = window.replace_info(info);
        let new = window.info();

        if old.name != new.name {
            events.push(TrackerEvent::WindowNameChanged(window.clone()));
        }
        if old.state != new.state {
            events.push(TrackerEvent::WindowStateChanged {
                window: window.clone(),
                old: old.state,
            });
        }
        if old.actions != new.actions {
            events.push(TrackerEvent::WindowActionsChanged {
                window: window.clone(),
                old: old.actions,
            });
        }
        if old_workspace != window.workspace_index() {
            events.push(TrackerEvent::WindowWorkspaceChanged {
                window: window.clone(),
                old: state.workspace(old_workspace),
            });
        }
        if old.geometry != new.geometry {
            events.push(TrackerEvent::WindowGeometryChanged {
                window: window.clone(),
                old: old.geometry,
            });
            state.update_window_monitor(&window, events);
        }
    }

    fn workspaces_changed(
        state: &mut TrackerState,
        list: Vec<WorkspaceInfo>,
        events: &mut Vec<TrackerEvent>,
    ) {
        for info in &list {
            match state.workspaces.get(info.index) {
                Some(ws) => {
                    if ws.set_name(&info.name) {
                        events.push(TrackerEvent::WorkspaceNameChanged(ws.clone()));
                    }
                }
                None => {
                    let ws = Workspace::new(info.clone());
                    state.workspaces.push(ws.clone());
                    events.push(TrackerEvent::WorkspaceAdded(ws));
                }
            }
        }

        // Windows on removed workspaces move to the last remaining one
        if let Some(last) = list.len().checked_sub(1) {
            for window in &state.windows {
                let Some(old) = window.workspace_index().filter(|ws| *ws > last) else {
                    continue;
                };
                window.set_workspace_index(Some(last));
                events.push(TrackerEvent::WindowWorkspaceChanged {
                    window: window.clone(),
                    old: state.workspace(Some(old)),
                });
            }
        }

        while state.workspaces.len() > list.len() {
            let Some(ws) = state.workspaces.pop() else {
                break;
            };
            if upgrade(&state.active_workspace).is_some_and(|a| Rc::ptr_eq(&a, &ws)) {
                state.active_workspace = None;
                events.push(TrackerEvent::ActiveWorkspaceChanged {
                    old: Some(ws.clone()),
                    new: None,
                });
            }
            events.push(TrackerEvent::WorkspaceRemoved(ws));
        }
    }

    fn monitors_changed(
        state: &mut TrackerState,
        list: Vec<MonitorInfo>,
        events: &mut Vec<TrackerEvent>,
    ) {
        for info in &list {
            match state.monitors.get(info.index) {
                Some(m) => {
                    m.set_primary(info.primary);
                    if m.set_geometry(info.geometry) {
                        events.push(TrackerEvent::MonitorGeometryChanged(m.clone()));
                    }
                }
                None => {
                    let m = Monitor::new(info.clone());
                    state.monitors.push(m.clone());
                    events.push(TrackerEvent::MonitorAdded(m));
                }
            }
        }

        while state.monitors.len() > list.len() {
            let Some(m) = state.monitors.pop() else {
                break;
            };
            events.push(TrackerEvent::MonitorRemoved(m));
        }

        let old = upgrade(&state.primary_monitor);
        let new = state
            .monitors
            .iter()
            .find(|m| m.is_primary())
            .or_else(|| state.monitors.first())
            .cloned();
        if !same(&old, &new) {
            state.primary_monitor = new.as_ref().map(Rc::downgrade);
            events.push(TrackerEvent::PrimaryMonitorChanged { old, new });
        }

        state.update_all_window_monitors(events);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Windows in the order they were opened
    pub fn windows(&self) -> Vec<WindowHandle> {
        self.state.borrow().windows.clone()
    }

    /// Windows bottom to top
    pub fn windows_stacked(&self) -> Vec<WindowHandle> {
        let state = self.state.borrow();
        let mut stacked: Vec<WindowHandle> =
            state.stacking.iter().filter_map(|id| state.window(*id)).collect();
        for window in &state.windows {
            if !state.stacking.contains(&window.id()) {
                stacked.push(window.clone());
            }
        }
        stacked
    }

    pub fn window_by_id(&self, id: WindowId) -> Option<WindowHandle> {
        self.state.borrow().window(id)
    }

    pub fn active_window(&self) -> Option<WindowHandle> {
        upgrade(&self.state.borrow().active_window)
    }

    /// The dashboard's own shell surface, if the backend reports it
    pub fn stage_window(&self) -> Option<WindowHandle> {
        self.state.borrow().windows.iter().find(|w| w.is_stage()).cloned()
    }

    pub fn workspaces(&self) -> Vec<WorkspaceHandle> {
        self.state.borrow().workspaces.clone()
    }

    pub fn workspace_count(&self) -> usize {
        self.state.borrow().workspaces.len()
    }

    pub fn active_workspace(&self) -> Option<WorkspaceHandle> {
        upgrade(&self.state.borrow().active_workspace)
    }

    pub fn workspace_by_number(&self, index: usize) -> Result<WorkspaceHandle, TrackerError> {
        let state = self.state.borrow();
        state.workspaces.get(index).cloned().ok_or_else(|| {
            let err = TrackerError::WorkspaceIndex {
                index,
                count: state.workspaces.len(),
            };
            warn!("{}", err);
            err
        })
    }

    /// Workspace of `window`, `None` for pinned windows
    pub fn window_workspace(&self, window: &Window) -> Option<WorkspaceHandle> {
        self.state.borrow().workspace(window.workspace_index())
    }

    pub fn windows_on_workspace(&self, workspace: &Workspace) -> Vec<WindowHandle> {
        self.state
            .borrow()
            .windows
            .iter()
            .filter(|w| w.is_on_workspace(workspace.number()))
            .cloned()
            .collect()
    }

    pub fn is_workspace_active(&self, workspace: &Workspace) -> bool {
        self.active_workspace()
            .is_some_and(|a| a.number() == workspace.number())
    }

    pub fn monitors(&self) -> Vec<MonitorHandle> {
        self.state.borrow().monitors.clone()
    }

    pub fn primary_monitor(&self) -> Option<MonitorHandle> {
        upgrade(&self.state.borrow().primary_monitor)
    }

    pub fn monitor_by_number(&self, index: usize) -> Result<MonitorHandle, TrackerError> {
        let state = self.state.borrow();
        state.monitors.get(index).cloned().ok_or_else(|| {
            let err = TrackerError::MonitorIndex {
                index,
                count: state.monitors.len(),
            };
            warn!("{}", err);
            err
        })
    }

    pub fn monitor_by_position(&self, x: i32, y: i32) -> Option<MonitorHandle> {
        self.state
            .borrow()
            .monitors
            .iter()
            .find(|m| m.contains(x, y))
            .cloned()
    }

    pub fn screen_size(&self) -> (u32, u32) {
        self.state.borrow().screen_size
    }

    pub fn is_window_on_monitor(&self, window: &Window, monitor: &Monitor) -> bool {
        monitor::is_window_on_monitor(
            &window.geometry(),
            &monitor.geometry(),
            self.state.borrow().screen_size,
        )
    }

    /// First monitor holding the window's clamped midpoint
    pub fn monitor_for_window(&self, window: &Window) -> Option<MonitorHandle> {
        self.monitors()
            .into_iter()
            .find(|m| self.is_window_on_monitor(window, m))
    }

    // ------------------------------------------------------------------
    // Requests forwarded to the backend
    // ------------------------------------------------------------------

    pub fn activate_window(&self, window: &Window) {
        self.backend.borrow().activate_window(window.id());
    }

    pub fn close_window(&self, window: &Window) {
        self.backend.borrow().close_window(window.id());
    }

    pub fn set_window_geometry(&self, window: &Window, geometry: Geometry) {
        self.backend.borrow().set_window_geometry(window.id(), geometry);
    }

    pub fn move_window(&self, window: &Window, x: i32, y: i32) {
        let g = window.geometry();
        self.set_window_geometry(window, Geometry::new(x, y, g.width, g.height));
    }

    pub fn resize_window(&self, window: &Window, width: u32, height: u32) {
        let g = window.geometry();
        self.set_window_geometry(window, Geometry::new(g.x, g.y, width, height));
    }

    /// Geometry straight from the backend, bypassing the cache
    pub fn query_window_geometry(&self, window: &Window) -> Option<Geometry> {
        self.backend.borrow().window_geometry(window.id())
    }

    pub fn activate_workspace(&self, workspace: &Workspace) {
        self.backend.borrow().activate_workspace(workspace.number());
    }

    pub fn window_icon(&self, window: &Window) -> Option<IconImage> {
        self.backend.borrow().window_icon(window.id())
    }

    pub fn window_surface(&self, window: &Window) -> Option<WindowSurface> {
        self.backend.borrow().window_surface(window.id())
    }

    pub fn release_window_surface(&self, surface: &WindowSurface) {
        self.backend.borrow().release_window_surface(surface);
    }

    pub fn window_for_surface(&self, surface: SurfaceId) -> Option<WindowHandle> {
        let id = self.backend.borrow().window_for_surface(surface)?;
        self.window_by_id(id)
    }

    pub fn surface_for_window(&self, window: &Window) -> Option<SurfaceId> {
        self.backend.borrow().surface_for_window(window.id())
    }

    pub fn show_stage(&self, window: &Window) {
        self.backend.borrow().show_stage(window.id());
    }

    pub fn hide_stage(&self, window: &Window) {
        self.backend.borrow().hide_stage(window.id());
    }
}
