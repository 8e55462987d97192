//! EWMH atoms and property mapping
//!
//! Interns the atoms the X11 backend reads and writes, and maps the
//! `_NET_WM_STATE` / `_NET_WM_ALLOWED_ACTIONS` atom lists onto the
//! tracker's state and action flags.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, ConnectionExt as _};

use crate::tracker::{WindowActions, WindowState};

/// `_NET_WM_DESKTOP` value of windows on all desktops
pub const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;

/// `WM_HINTS` urgency flag
pub const WM_HINTS_URGENCY: u32 = 1 << 8;

/// Holds all interned atoms
#[derive(Debug, Clone)]
pub struct Atoms {
    pub net_supported: Atom,
    pub net_client_list: Atom,
    pub net_client_list_stacking: Atom,
    pub net_number_of_desktops: Atom,
    pub net_current_desktop: Atom,
    pub net_desktop_names: Atom,
    pub net_active_window: Atom,
    pub net_close_window: Atom,
    pub net_moveresize_window: Atom,
    pub net_wm_name: Atom,
    pub net_wm_desktop: Atom,
    pub net_wm_pid: Atom,
    pub net_wm_icon: Atom,
    pub net_wm_fullscreen_monitors: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_hidden: Atom,
    pub net_wm_state_maximized_vert: Atom,
    pub net_wm_state_maximized_horz: Atom,
    pub net_wm_state_fullscreen: Atom,
    pub net_wm_state_skip_pager: Atom,
    pub net_wm_state_skip_taskbar: Atom,
    pub net_wm_state_sticky: Atom,
    pub net_wm_state_above: Atom,
    pub net_wm_state_shaded: Atom,
    pub net_wm_state_demands_attention: Atom,
    pub net_wm_allowed_actions: Atom,
    pub net_wm_action_close: Atom,
    pub net_wm_action_minimize: Atom,
    pub net_wm_action_maximize_horz: Atom,
    pub net_wm_action_maximize_vert: Atom,
    pub net_wm_action_move: Atom,
    pub net_wm_action_resize: Atom,
    pub net_wm_action_change_desktop: Atom,
    pub wm_name: Atom,
    pub wm_class: Atom,
    pub wm_hints: Atom,
    pub utf8_string: Atom,
}

impl Atoms {
    /// Intern all required atoms
    pub fn new<C: Connection>(conn: &C) -> Result<Self> {
        let intern = |name: &str| -> Result<Atom> {
            Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
        };

        Ok(Self {
            net_supported: intern("_NET_SUPPORTED")?,
            net_client_list: intern("_NET_CLIENT_LIST")?,
            net_client_list_stacking: intern("_NET_CLIENT_LIST_STACKING")?,
            net_number_of_desktops: intern("_NET_NUMBER_OF_DESKTOPS")?,
            net_current_desktop: intern("_NET_CURRENT_DESKTOP")?,
            net_desktop_names: intern("_NET_DESKTOP_NAMES")?,
            net_active_window: intern("_NET_ACTIVE_WINDOW")?,
            net_close_window: intern("_NET_CLOSE_WINDOW")?,
            net_moveresize_window: intern("_NET_MOVERESIZE_WINDOW")?,
            net_wm_name: intern("_NET_WM_NAME")?,
            net_wm_desktop: intern("_NET_WM_DESKTOP")?,
            net_wm_pid: intern("_NET_WM_PID")?,
            net_wm_icon: intern("_NET_WM_ICON")?,
            net_wm_fullscreen_monitors: intern("_NET_WM_FULLSCREEN_MONITORS")?,
            net_wm_state: intern("_NET_WM_STATE")?,
            net_wm_state_hidden: intern("_NET_WM_STATE_HIDDEN")?,
            net_wm_state_maximized_vert: intern("_NET_WM_STATE_MAXIMIZED_VERT")?,
            net_wm_state_maximized_horz: intern("_NET_WM_STATE_MAXIMIZED_HORZ")?,
            net_wm_state_fullscreen: intern("_NET_WM_STATE_FULLSCREEN")?,
            net_wm_state_skip_pager: intern("_NET_WM_STATE_SKIP_PAGER")?,
            net_wm_state_skip_taskbar: intern("_NET_WM_STATE_SKIP_TASKBAR")?,
            net_wm_state_sticky: intern("_NET_WM_STATE_STICKY")?,
            net_wm_state_above: intern("_NET_WM_STATE_ABOVE")?,
            net_wm_state_shaded: intern("_NET_WM_STATE_SHADED")?,
            net_wm_state_demands_attention: intern("_NET_WM_STATE_DEMANDS_ATTENTION")?,
            net_wm_allowed_actions: intern("_NET_WM_ALLOWED_ACTIONS")?,
            net_wm_action_close: intern("_NET_WM_ACTION_CLOSE")?,
            net_wm_action_minimize: intern("_NET_WM_ACTION_MINIMIZE")?,
            net_wm_action_maximize_horz: intern("_NET_WM_ACTION_MAXIMIZE_HORZ")?,
            net_wm_action_maximize_vert: intern("_NET_WM_ACTION_MAXIMIZE_VERT")?,
            net_wm_action_move: intern("_NET_WM_ACTION_MOVE")?,
            net_wm_action_resize: intern("_NET_WM_ACTION_RESIZE")?,
            net_wm_action_change_desktop: intern("_NET_WM_ACTION_CHANGE_DESKTOP")?,
            wm_name: intern("WM_NAME")?,
            wm_class: intern("WM_CLASS")?,
            wm_hints: intern("WM_HINTS")?,
            utf8_string: intern("UTF8_STRING")?,
        })
    }

    /// `_NET_WM_STATE` atoms and the flag each one sets
    ///
    /// Maximized needs both directions and is handled by [`state_from_atoms`].
    pub fn state_table(&self) -> [(Atom, WindowState); 8] {
        [
            (self.net_wm_state_hidden, WindowState::MINIMIZED),
            (self.net_wm_state_fullscreen, WindowState::FULLSCREEN),
            (self.net_wm_state_skip_pager, WindowState::SKIP_PAGER),
            (self.net_wm_state_skip_taskbar, WindowState::SKIP_TASKLIST),
            (self.net_wm_state_sticky, WindowState::PINNED),
            (self.net_wm_state_above, WindowState::ABOVE),
            (self.net_wm_state_shaded, WindowState::SHADED),
            (self.net_wm_state_demands_attention, WindowState::URGENT),
        ]
    }

    pub fn action_table(&self) -> [(Atom, WindowActions); 7] {
        [
            (self.net_wm_action_close, WindowActions::CLOSE),
            (self.net_wm_action_minimize, WindowActions::MINIMIZE),
            (self.net_wm_action_maximize_horz, WindowActions::MAXIMIZE),
            (self.net_wm_action_maximize_vert, WindowActions::MAXIMIZE),
            (self.net_wm_action_move, WindowActions::MOVE),
            (self.net_wm_action_resize, WindowActions::RESIZE),
            (self.net_wm_action_change_desktop, WindowActions::CHANGE_WORKSPACE),
        ]
    }

    /// Atom for a single state flag, used when asking the WM to set it
    pub fn state_atom(&self, flag: WindowState) -> Option<Atom> {
        self.state_table()
            .into_iter()
            .find(|(_, f)| *f == flag)
            .map(|(atom, _)| atom)
    }
}

/// Window state from `_NET_WM_STATE`, `_NET_WM_DESKTOP` and the urgency hint
pub fn state_from_atoms(
    table: &[(Atom, WindowState)],
    maximized: (Atom, Atom),
    atoms: &[Atom],
    desktop: Option<u32>,
    urgent_hint: bool,
) -> WindowState {
    let mut state = table
        .iter()
        .filter(|(atom, _)| atoms.contains(atom))
        .fold(WindowState::empty(), |acc, (_, flag)| acc | *flag);

    if atoms.contains(&maximized.0) && atoms.contains(&maximized.1) {
        state |= WindowState::MAXIMIZED;
    }
    if desktop == Some(ALL_DESKTOPS) {
        state |= WindowState::PINNED;
    }
    if urgent_hint {
        state |= WindowState::URGENT;
    }
    state
}

pub fn actions_from_atoms(table: &[(Atom, WindowActions)], atoms: &[Atom]) -> WindowActions {
    table
        .iter()
        .filter(|(atom, _)| atoms.contains(atom))
        .fold(WindowActions::empty(), |acc, (_, flag)| acc | *flag)
}

/// NUL-separated `_NET_DESKTOP_NAMES`, padded with generated names up to `count`
pub fn desktop_names(raw: &[u8], count: usize) -> Vec<String> {
    let mut names: Vec<String> = raw
        .split(|b| *b == 0)
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .take(count)
        .collect();
    // A trailing NUL leaves an empty last entry
    for (i, name) in names.iter_mut().enumerate() {
        if name.is_empty() {
            *name = format!("Workspace {}", i + 1);
        }
    }
    while names.len() < count {
        names.push(format!("Workspace {}", names.len() + 1));
    }
    names
}

/// Class part of `WM_CLASS` (instance NUL class NUL)
pub fn wm_class(raw: &[u8]) -> Option<String> {
    let mut parts = raw.split(|b| *b == 0).filter(|s| !s.is_empty());
    let instance = parts.next();
    parts
        .next()
        .or(instance)
        .map(|s| String::from_utf8_lossy(s).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: [(Atom, WindowState); 3] = [
        (10, WindowState::MINIMIZED),
        (11, WindowState::SKIP_PAGER),
        (12, WindowState::PINNED),
    ];

    #[test]
    fn test_state_mapping() {
        let state = state_from_atoms(&TABLE, (20, 21), &[10, 20, 99], Some(0), false);
        assert_eq!(state, WindowState::MINIMIZED);

        let state = state_from_atoms(&TABLE, (20, 21), &[11, 20, 21], Some(ALL_DESKTOPS), true);
        assert_eq!(
            state,
            WindowState::SKIP_PAGER | WindowState::MAXIMIZED | WindowState::PINNED | WindowState::URGENT
        );
    }

    #[test]
    fn test_action_mapping() {
        let table = [(1, WindowActions::CLOSE), (2, WindowActions::MAXIMIZE), (3, WindowActions::MAXIMIZE)];
        assert_eq!(actions_from_atoms(&table, &[3, 7]), WindowActions::MAXIMIZE);
        assert_eq!(actions_from_atoms(&table, &[]), WindowActions::empty());
    }

    #[test]
    fn test_desktop_names() {
        assert_eq!(desktop_names(b"Web\0Mail\0", 3), vec!["Web", "Mail", "Workspace 3"]);
        assert_eq!(desktop_names(b"A\0\0C", 3), vec!["A", "Workspace 2", "C"]);
        assert_eq!(desktop_names(b"", 1), vec!["Workspace 1"]);
        assert_eq!(desktop_names(b"A\0B\0C\0", 2), vec!["A", "B"]);
    }

    #[test]
    fn test_wm_class() {
        assert_eq!(wm_class(b"xterm\0XTerm\0").as_deref(), Some("XTerm"));
        assert_eq!(wm_class(b"solo\0").as_deref(), Some("solo"));
        assert_eq!(wm_class(b""), None);
    }
}
