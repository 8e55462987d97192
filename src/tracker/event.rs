//! Typed tracker notifications

use super::monitor::MonitorHandle;
use super::window::{WindowActions, WindowHandle, WindowState};
use super::workspace::WorkspaceHandle;
use crate::shared::Geometry;

/// Notification emitted by the [`WindowTracker`](super::WindowTracker)
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    WindowOpened(WindowHandle),
    WindowClosed(WindowHandle),
    WindowGeometryChanged {
        window: WindowHandle,
        old: Geometry,
    },
    /// Carries the previous state; callers diff against `window.state()`
    WindowStateChanged {
        window: WindowHandle,
        old: WindowState,
    },
    WindowActionsChanged {
        window: WindowHandle,
        old: WindowActions,
    },
    WindowIconChanged(WindowHandle),
    WindowNameChanged(WindowHandle),
    WindowWorkspaceChanged {
        window: WindowHandle,
        old: Option<WorkspaceHandle>,
    },
    WindowMonitorChanged {
        window: WindowHandle,
        old: Option<MonitorHandle>,
    },
    WindowStackingChanged,
    ActiveWindowChanged {
        old: Option<WindowHandle>,
        new: Option<WindowHandle>,
    },
    ActiveWorkspaceChanged {
        old: Option<WorkspaceHandle>,
        new: Option<WorkspaceHandle>,
    },
    WorkspaceAdded(WorkspaceHandle),
    WorkspaceRemoved(WorkspaceHandle),
    WorkspaceNameChanged(WorkspaceHandle),
    MonitorAdded(MonitorHandle),
    MonitorRemoved(MonitorHandle),
    MonitorGeometryChanged(MonitorHandle),
    PrimaryMonitorChanged {
        old: Option<MonitorHandle>,
        new: Option<MonitorHandle>,
    },
    ScreenSizeChanged {
        width: u32,
        height: u32,
    },
}

/// Discriminant of [`TrackerEvent`], used to filter subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    WindowOpened,
    WindowClosed,
    WindowGeometryChanged,
    WindowStateChanged,
    WindowActionsChanged,
    WindowIconChanged,
    WindowNameChanged,
    WindowWorkspaceChanged,
    WindowMonitorChanged,
    WindowStackingChanged,
    ActiveWindowChanged,
    ActiveWorkspaceChanged,
    WorkspaceAdded,
    WorkspaceRemoved,
    WorkspaceNameChanged,
    MonitorAdded,
    MonitorRemoved,
    MonitorGeometryChanged,
    PrimaryMonitorChanged,
    ScreenSizeChanged,
}

impl TrackerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TrackerEvent::WindowOpened(_) => EventKind::WindowOpened,
            TrackerEvent::WindowClosed(_) => EventKind::WindowClosed,
            TrackerEvent::WindowGeometryChanged { .. } => EventKind::WindowGeometryChanged,
            TrackerEvent::WindowStateChanged { .. } => EventKind::WindowStateChanged,
            TrackerEvent::WindowActionsChanged { .. } => EventKind::WindowActionsChanged,
            TrackerEvent::WindowIconChanged(_) => EventKind::WindowIconChanged,
            TrackerEvent::WindowNameChanged(_) => EventKind::WindowNameChanged,
            TrackerEvent::WindowWorkspaceChanged { .. } => EventKind::WindowWorkspaceChanged,
            TrackerEvent::WindowMonitorChanged { .. } => EventKind::WindowMonitorChanged,
            TrackerEvent::WindowStackingChanged => EventKind::WindowStackingChanged,
            TrackerEvent::ActiveWindowChanged { .. } => EventKind::ActiveWindowChanged,
            TrackerEvent::ActiveWorkspaceChanged { .. } => EventKind::ActiveWorkspaceChanged,
            TrackerEvent::WorkspaceAdded(_) => EventKind::WorkspaceAdded,
            TrackerEvent::WorkspaceRemoved(_) => EventKind::WorkspaceRemoved,
            TrackerEvent::WorkspaceNameChanged(_) => EventKind::WorkspaceNameChanged,
            TrackerEvent::MonitorAdded(_) => EventKind::MonitorAdded,
            TrackerEvent::MonitorRemoved(_) => EventKind::MonitorRemoved,
            TrackerEvent::MonitorGeometryChanged(_) => EventKind::MonitorGeometryChanged,
            TrackerEvent::PrimaryMonitorChanged { .. } => EventKind::PrimaryMonitorChanged,
            TrackerEvent::ScreenSizeChanged { .. } => EventKind::ScreenSizeChanged,
        }
    }

    /// The window a window-level event is about
    pub fn window(&self) -> Option<&WindowHandle> {
        match self {
            TrackerEvent::WindowOpened(w)
            | TrackerEvent::WindowClosed(w)
            | TrackerEvent::WindowIconChanged(w)
            | TrackerEvent::WindowNameChanged(w) => Some(w),
            TrackerEvent::WindowGeometryChanged { window, .. }
            | TrackerEvent::WindowStateChanged { window, .. }
            | TrackerEvent::WindowActionsChanged { window, .. }
            | TrackerEvent::WindowWorkspaceChanged { window, .. }
            | TrackerEvent::WindowMonitorChanged { window, .. } => Some(window),
            _ => None,
        }
    }
}
