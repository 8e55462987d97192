//! Tracked windows
//!
//! A [`Window`] is owned by the tracker and shared as [`WindowHandle`].
//! Everything else should hold a [`WeakWindowHandle`] and drop it once the
//! window's `closed` event arrived.

use bitflags::bitflags;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::shared::Geometry;

/// Backend-native window identifier (the X11 window id for the X11 backend)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

bitflags! {
    /// Window state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WindowState: u32 {
        const HIDDEN        = 1 << 0;
        const MINIMIZED     = 1 << 1;
        const MAXIMIZED     = 1 << 2;
        const FULLSCREEN    = 1 << 3;
        const SKIP_PAGER    = 1 << 4;
        const SKIP_TASKLIST = 1 << 5;
        const PINNED        = 1 << 6;
        const URGENT        = 1 << 7;
        const ABOVE         = 1 << 8;
        const SHADED        = 1 << 9;
    }
}

bitflags! {
    /// Actions the window manager allows on a window
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WindowActions: u32 {
        const CLOSE    = 1 << 0;
        const MINIMIZE = 1 << 1;
        const MAXIMIZE = 1 << 2;
        const MOVE     = 1 << 3;
        const RESIZE   = 1 << 4;
        const CHANGE_WORKSPACE = 1 << 5;
    }
}

/// Snapshot of a window as reported by a backend
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowInfo {
    pub id: WindowId,
    pub name: String,
    pub class: Option<String>,
    pub state: WindowState,
    pub actions: WindowActions,
    pub geometry: Geometry,
    /// Workspace index, `None` when the window is on all workspaces
    pub workspace: Option<usize>,
    pub pid: Option<u32>,
    /// The dashboard's own shell surface
    pub is_stage: bool,
}

impl Default for WindowId {
    fn default() -> Self {
        WindowId(0)
    }
}

/// A tracked window
pub struct Window {
    id: WindowId,
    info: RefCell<WindowInfo>,
    monitor: Cell<Option<usize>>,
    closed: Cell<bool>,
}

/// Owning reference; only the tracker keeps these
pub type WindowHandle = Rc<Window>;

/// Non-owning reference for views and other observers
pub type WeakWindowHandle = Weak<Window>;

impl Window {
    pub(crate) fn new(info: WindowInfo) -> WindowHandle {
        Rc::new(Self {
            id: info.id,
            info: RefCell::new(info),
            monitor: Cell::new(None),
            closed: Cell::new(false),
        })
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn name(&self) -> String {
        self.info.borrow().name.clone()
    }

    pub fn class(&self) -> Option<String> {
        self.info.borrow().class.clone()
    }

    pub fn state(&self) -> WindowState {
        self.info.borrow().state
    }

    pub fn actions(&self) -> WindowActions {
        self.info.borrow().actions
    }

    pub fn geometry(&self) -> Geometry {
        self.info.borrow().geometry
    }

    /// Workspace index, `None` means pinned to all workspaces
    pub fn workspace_index(&self) -> Option<usize> {
        let info = self.info.borrow();
        if info.state.contains(WindowState::PINNED) {
            None
        } else {
            info.workspace
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.info.borrow().pid
    }

    pub fn is_stage(&self) -> bool {
        self.info.borrow().is_stage
    }

    pub fn is_pinned(&self) -> bool {
        self.workspace_index().is_none()
    }

    pub fn is_minimized(&self) -> bool {
        self.state().contains(WindowState::MINIMIZED)
    }

    /// Visible in pagers and task lists, regardless of mapping state
    pub fn is_visible_in_pager(&self) -> bool {
        !self
            .state()
            .intersects(WindowState::SKIP_PAGER | WindowState::SKIP_TASKLIST)
    }

    pub fn is_on_workspace(&self, index: usize) -> bool {
        match self.workspace_index() {
            None => true,
            Some(ws) => ws == index,
        }
    }

    /// Set once the backend reported the window gone
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Monitor index last derived by the tracker
    pub fn monitor_index(&self) -> Option<usize> {
        self.monitor.get()
    }

    pub(crate) fn info(&self) -> WindowInfo {
        self.info.borrow().clone()
    }

    pub(crate) fn replace_info(&self, info: WindowInfo) -> WindowInfo {
        std::mem::replace(&mut *self.info.borrow_mut(), info)
    }

    pub(crate) fn set_workspace_index(&self, workspace: Option<usize>) {
        self.info.borrow_mut().workspace = workspace;
    }

    pub(crate) fn set_monitor_index(&self, monitor: Option<usize>) {
        self.monitor.set(monitor);
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.set(true);
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.info.borrow();
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("name", &info.name)
            .field("state", &info.state)
            .field("geometry", &info.geometry)
            .field("workspace", &info.workspace)
            .finish()
    }
}
