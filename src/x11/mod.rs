//! X11 window tracker backend
//!
//! Reads window, workspace and monitor state from EWMH properties and
//! RandR, forwards requests to the window manager as EWMH client messages
//! and exposes live window contents through Composite pixmaps.
//!
//! The backend caches the last client list, stacking order and active
//! window so root property changes can be translated into precise
//! [`BackendChange`]s. It also owns the stage window and keeps it in the
//! state the dashboard needs, whatever the window manager does to it.

pub mod atoms;
pub mod icons;
pub mod stage;
pub mod stream;

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::composite::{self, ConnectionExt as _};
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ChangeWindowAttributesAux, ClientMessageEvent, ConfigureWindowAux,
    ConnectionExt as _, CreateWindowAux, EventMask, PropMode, Window as XWindow, WindowClass,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::shared::{Geometry, IconImage};
use crate::tracker::{
    BackendChange, MonitorInfo, SurfaceId, WindowId, WindowInfo, WindowState,
    WindowSurface, WindowTrackerBackend, WorkspaceInfo,
};

pub use atoms::Atoms;
pub use stage::{StagePlacement, REQUIRED_STAGE_STATE};
use stage::{should_reselect_stage, stage_placement, stage_state_to_heal};
pub use stream::X11EventStream;

/// Source indication for EWMH requests: pager
const SOURCE_PAGER: u32 = 2;

const NET_WM_STATE_ADD: u32 = 1;

/// `_NET_MOVERESIZE_WINDOW`: x, y, width and height present
const MOVERESIZE_ALL: u32 = (1 << 8) | (1 << 9) | (1 << 10) | (1 << 11);

fn xid(window: WindowId) -> XWindow {
    window.0 as XWindow
}

fn window_id(window: XWindow) -> WindowId {
    WindowId(window as u64)
}

struct StageWindow {
    window: XWindow,
    visible: Cell<bool>,
}

/// EWMH/RandR/Composite backend
pub struct X11Backend {
    conn: Arc<RustConnection>,
    screen_num: usize,
    root: XWindow,
    atoms: Atoms,
    has_randr: bool,
    has_composite: bool,
    /// `_NET_SUPPORTED` of the running window manager
    supported: Vec<Atom>,
    stage: Option<StageWindow>,
    /// `_NET_CLIENT_LIST` as last seen
    clients: Vec<XWindow>,
    stacking: Vec<XWindow>,
    active: Option<XWindow>,
    infos: HashMap<XWindow, WindowInfo>,
    monitors: Vec<MonitorInfo>,
    screen: (u32, u32),
    /// Set when reading events failed, the connection is unusable after that
    connection_lost: bool,
}

impl X11Backend {
    /// Connect to `display` (or `$DISPLAY`) and load the current state
    pub fn connect(display: Option<&str>) -> Result<Self> {
        let (conn, screen_num) =
            RustConnection::connect(display).context("Failed to connect to X server")?;
        let conn = Arc::new(conn);
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let size = (screen.width_in_pixels as u32, screen.height_in_pixels as u32);
        info!("Connected to X server, root {:#x}, screen {}x{}", root, size.0, size.1);

        let atoms = Atoms::new(conn.as_ref()).context("Failed to intern atoms")?;
        let has_randr = Self::init_randr(&conn, root).unwrap_or_else(|e| {
            warn!("RandR unavailable, using a single screen-sized monitor: {:#}", e);
            false
        });
        let has_composite = Self::init_composite(&conn, root).unwrap_or_else(|e| {
            warn!("Composite unavailable, live previews disabled: {:#}", e);
            false
        });

        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new()
                .event_mask(EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY),
        )?
        .check()
        .context("Failed to select root window events")?;

        let mut backend = Self {
            conn,
            screen_num,
            root,
            atoms,
            has_randr,
            has_composite,
            supported: Vec::new(),
            stage: None,
            clients: Vec::new(),
            stacking: Vec::new(),
            active: None,
            infos: HashMap::new(),
            monitors: Vec::new(),
            screen: size,
            connection_lost: false,
        };
        backend.supported = backend.read_root_atoms(backend.atoms.net_supported);
        backend.monitors = backend.read_monitors();
        backend.clients = backend.read_root_windows(backend.atoms.net_client_list);
        backend.stacking = backend.read_root_windows(backend.atoms.net_client_list_stacking);
        backend.active = backend.read_active();
        for window in backend.clients.clone() {
            backend.track(window);
        }
        info!(
            "X11 backend ready: {} windows, {} monitors",
            backend.infos.len(),
            backend.monitors.len()
        );
        Ok(backend)
    }

    fn init_randr(conn: &RustConnection, root: XWindow) -> Result<bool> {
        if !conn.query_extension(b"RANDR")?.reply()?.present {
            return Ok(false);
        }
        let version = conn.randr_query_version(1, 5)?.reply()?;
        if (version.major_version, version.minor_version) < (1, 5) {
            warn!(
                "RandR {}.{} lacks monitor support",
                version.major_version, version.minor_version
            );
            return Ok(false);
        }
        conn.randr_select_input(
            root,
            randr::NotifyMask::SCREEN_CHANGE | randr::NotifyMask::CRTC_CHANGE | randr::NotifyMask::OUTPUT_CHANGE,
        )?;
        Ok(true)
    }

    fn init_composite(conn: &RustConnection, root: XWindow) -> Result<bool> {
        if !conn.query_extension(b"Composite")?.reply()?.present {
            return Ok(false);
        }
        let version = conn.composite_query_version(0, 4)?.reply()?;
        debug!(
            "Composite {}.{}",
            version.major_version, version.minor_version
        );
        conn.composite_redirect_subwindows(root, composite::Redirect::AUTOMATIC)?
            .check()
            .context("Failed to redirect top-level windows")?;
        Ok(true)
    }

    /// Shared connection, for the event stream
    pub fn connection(&self) -> Arc<RustConnection> {
        Arc::clone(&self.conn)
    }

    pub fn stage_window(&self) -> Option<WindowId> {
        self.stage.as_ref().map(|s| window_id(s.window))
    }

    // ------------------------------------------------------------------
    // Property reads
    // ------------------------------------------------------------------

    fn property32(&self, window: XWindow, property: Atom, ty: impl Into<Atom>) -> Result<Vec<u32>> {
        let reply = self
            .conn
            .get_property(false, window, property, ty, 0, u32::MAX)?
            .reply()?;
        Ok(reply.value32().map(|v| v.collect()).unwrap_or_default())
    }

    fn property_bytes(&self, window: XWindow, property: Atom, ty: impl Into<Atom>) -> Result<Vec<u8>> {
        let reply = self
            .conn
            .get_property(false, window, property, ty, 0, u32::MAX)?
            .reply()?;
        Ok(reply.value)
    }

    fn read_root_windows(&self, property: Atom) -> Vec<XWindow> {
        self.property32(self.root, property, AtomEnum::WINDOW)
            .unwrap_or_else(|e| {
                warn!("Failed to read root window list: {:#}", e);
                Vec::new()
            })
    }

    fn read_root_atoms(&self, property: Atom) -> Vec<Atom> {
        self.property32(self.root, property, AtomEnum::ATOM)
            .unwrap_or_default()
    }

    fn read_root_cardinal(&self, property: Atom) -> Option<u32> {
        self.property32(self.root, property, AtomEnum::CARDINAL)
            .ok()
            .and_then(|v| v.first().copied())
    }

    fn read_active(&self) -> Option<XWindow> {
        self.property32(self.root, self.atoms.net_active_window, AtomEnum::WINDOW)
            .ok()
            .and_then(|v| v.first().copied())
            .filter(|w| *w != x11rb::NONE)
    }

    fn read_geometry(&self, window: XWindow) -> Result<Geometry> {
        let geometry = self.conn.get_geometry(window)?.reply()?;
        let origin = self
            .conn
            .translate_coordinates(window, self.root, 0, 0)?
            .reply()?;
        Ok(Geometry::new(
            origin.dst_x as i32,
            origin.dst_y as i32,
            geometry.width as u32,
            geometry.height as u32,
        ))
    }

    fn read_name(&self, window: XWindow) -> String {
        let utf8 = self
            .property_bytes(window, self.atoms.net_wm_name, self.atoms.utf8_string)
            .unwrap_or_default();
        let raw = if utf8.is_empty() {
            self.property_bytes(window, self.atoms.wm_name, AtomEnum::ANY)
                .unwrap_or_default()
        } else {
            utf8
        };
        String::from_utf8_lossy(&raw).into_owned()
    }

    fn read_info(&self, window: XWindow) -> Result<WindowInfo> {
        let net = &self.atoms;
        let state_atoms = self.property32(window, net.net_wm_state, AtomEnum::ATOM)?;
        let desktop = self
            .property32(window, net.net_wm_desktop, AtomEnum::CARDINAL)?
            .first()
            .copied();
        let urgent = self
            .property32(window, net.wm_hints, net.wm_hints)?
            .first()
            .is_some_and(|flags| flags & atoms::WM_HINTS_URGENCY != 0);
        let allowed = self.property32(window, net.net_wm_allowed_actions, AtomEnum::ATOM)?;
        let class = self.property_bytes(window, net.wm_class, AtomEnum::STRING)?;
        let pid = self
            .property32(window, net.net_wm_pid, AtomEnum::CARDINAL)?
            .first()
            .copied();

        Ok(WindowInfo {
            id: window_id(window),
            name: self.read_name(window),
            class: atoms::wm_class(&class),
            state: atoms::state_from_atoms(
                &net.state_table(),
                (net.net_wm_state_maximized_vert, net.net_wm_state_maximized_horz),
                &state_atoms,
                desktop,
                urgent,
            ),
            actions: atoms::actions_from_atoms(&net.action_table(), &allowed),
            geometry: self.read_geometry(window)?,
            workspace: desktop
                .filter(|d| *d != atoms::ALL_DESKTOPS)
                .map(|d| d as usize),
            pid,
            is_stage: self.stage.as_ref().is_some_and(|s| s.window == window),
        })
    }

    fn read_workspaces(&self) -> Vec<WorkspaceInfo> {
        let count = self
            .read_root_cardinal(self.atoms.net_number_of_desktops)
            .unwrap_or(0) as usize;
        let raw = self
            .property_bytes(self.root, self.atoms.net_desktop_names, self.atoms.utf8_string)
            .unwrap_or_default();
        atoms::desktop_names(&raw, count)
            .into_iter()
            .enumerate()
            .map(|(index, name)| WorkspaceInfo::new(index, name))
            .collect()
    }

    fn read_monitors(&self) -> Vec<MonitorInfo> {
        let screen_monitor = || {
            vec![MonitorInfo {
                index: 0,
                geometry: Geometry::new(0, 0, self.screen.0, self.screen.1),
                primary: true,
                name: "screen".to_string(),
            }]
        };
        if !self.has_randr {
            return screen_monitor();
        }

        let reply = match self
            .conn
            .randr_get_monitors(self.root, true)
            .map_err(anyhow::Error::from)
            .and_then(|cookie| cookie.reply().map_err(anyhow::Error::from))
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Failed to query RandR monitors: {:#}", e);
                return screen_monitor();
            }
        };
        if reply.monitors.is_empty() {
            return screen_monitor();
        }

        reply
            .monitors
            .iter()
            .enumerate()
            .map(|(index, monitor)| MonitorInfo {
                index,
                geometry: Geometry::new(
                    monitor.x as i32,
                    monitor.y as i32,
                    monitor.width as u32,
                    monitor.height as u32,
                ),
                primary: monitor.primary,
                name: self.atom_name(monitor.name),
            })
            .collect()
    }

    fn atom_name(&self, atom: Atom) -> String {
        self.conn
            .get_atom_name(atom)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map(|reply| String::from_utf8_lossy(&reply.name).into_owned())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    fn send_message(&self, window: XWindow, message_type: Atom, data: [u32; 5]) -> Result<()> {
        let event = ClientMessageEvent::new(32, window, message_type, data);
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn request(&self, what: &str, window: XWindow, message_type: Atom, data: [u32; 5]) {
        if let Err(e) = self.send_message(window, message_type, data) {
            warn!(window = %window_id(window), "Failed to request {}: {:#}", what, e);
        }
    }

    fn add_states(&self, window: XWindow, states: WindowState) {
        for flag in states.iter() {
            if let Some(atom) = self.atoms.state_atom(flag) {
                self.request(
                    "_NET_WM_STATE",
                    window,
                    self.atoms.net_wm_state,
                    [NET_WM_STATE_ADD, atom, 0, SOURCE_PAGER, 0],
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // Stage window
    // ------------------------------------------------------------------

    /// Create the (unmapped) stage window
    pub fn create_stage(&mut self, title: &str) -> Result<WindowId> {
        let screen = &self.conn.setup().roots[self.screen_num];
        let (depth, visual) = (screen.root_depth, screen.root_visual);
        let window = self.conn.generate_id()?;
        self.conn
            .create_window(
                depth,
                window,
                self.root,
                0,
                0,
                self.screen.0.max(1) as u16,
                self.screen.1.max(1) as u16,
                0,
                WindowClass::INPUT_OUTPUT,
                visual,
                &CreateWindowAux::new()
                    .event_mask(EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY),
            )?
            .check()
            .context("Failed to create stage window")?;

        self.conn.change_property8(
            PropMode::REPLACE,
            window,
            self.atoms.net_wm_name,
            self.atoms.utf8_string,
            title.as_bytes(),
        )?;
        // Initial state for the window manager to pick up when mapping
        let initial: Vec<Atom> = REQUIRED_STAGE_STATE
            .iter()
            .filter_map(|flag| self.atoms.state_atom(flag))
            .collect();
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.net_wm_state,
            AtomEnum::ATOM,
            &initial,
        )?;
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.net_wm_desktop,
            AtomEnum::CARDINAL,
            &[atoms::ALL_DESKTOPS],
        )?;
        self.conn.flush()?;

        info!(window = %window_id(window), "Created stage window");
        self.stage = Some(StageWindow {
            window,
            visible: Cell::new(false),
        });
        Ok(window_id(window))
    }

    /// Put back any stage state the window manager removed
    fn heal_stage_state(&self, missing: WindowState) {
        let Some(stage) = &self.stage else { return };
        if missing.is_empty() {
            return;
        }
        debug!(?missing, "Re-asserting stage window state");
        self.add_states(stage.window, missing);
        if missing.contains(WindowState::PINNED) {
            self.request(
                "_NET_WM_DESKTOP",
                stage.window,
                self.atoms.net_wm_desktop,
                [atoms::ALL_DESKTOPS, SOURCE_PAGER, 0, 0, 0],
            );
        }
    }

    fn reselect_stage(&self) {
        let Some(stage) = &self.stage else { return };
        if should_reselect_stage(
            self.active.map(window_id),
            window_id(stage.window),
            stage.visible.get(),
        ) {
            debug!("Active window moved away from the stage, reselecting it");
            self.request(
                "_NET_ACTIVE_WINDOW",
                stage.window,
                self.atoms.net_active_window,
                [SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0],
            );
        }
    }

    fn place_stage(&self) {
        let Some(stage) = &self.stage else { return };
        let supported = self.supported.contains(&self.atoms.net_wm_fullscreen_monitors);
        match stage_placement(&self.monitors, self.screen, supported) {
            StagePlacement::FullscreenMonitors {
                top,
                bottom,
                left,
                right,
            } => {
                debug!(top, bottom, left, right, "Spanning stage across monitors");
                self.request(
                    "_NET_WM_FULLSCREEN_MONITORS",
                    stage.window,
                    self.atoms.net_wm_fullscreen_monitors,
                    [top, bottom, left, right, SOURCE_PAGER],
                );
                self.add_states(stage.window, WindowState::FULLSCREEN);
            }
            StagePlacement::Primary(geometry) => {
                warn!(
                    "Window manager lacks _NET_WM_FULLSCREEN_MONITORS, stage covers the primary monitor only"
                );
                let aux = ConfigureWindowAux::new()
                    .x(geometry.x)
                    .y(geometry.y)
                    .width(geometry.width)
                    .height(geometry.height);
                if let Err(e) = self
                    .conn
                    .configure_window(stage.window, &aux)
                    .map_err(anyhow::Error::from)
                    .and_then(|_| self.conn.flush().map_err(anyhow::Error::from))
                {
                    warn!("Failed to resize stage window: {:#}", e);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Event translation
    // ------------------------------------------------------------------

    /// Start tracking a client window, returning its snapshot
    fn track(&mut self, window: XWindow) -> Option<WindowInfo> {
        let selected = self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new()
                .event_mask(EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY),
        );
        if let Err(e) = selected {
            warn!(window = %window_id(window), "Failed to select window events: {}", e);
        }
        match self.read_info(window) {
            Ok(info) => {
                self.infos.insert(window, info.clone());
                Some(info)
            }
            Err(e) => {
                // Usually a window destroyed before we got to read it
                debug!(window = %window_id(window), "Skipping window: {:#}", e);
                None
            }
        }
    }

    fn client_list_changed(&mut self, changes: &mut Vec<BackendChange>) {
        let clients = self.read_root_windows(self.atoms.net_client_list);
        let gone: Vec<XWindow> = self
            .clients
            .iter()
            .copied()
            .filter(|w| !clients.contains(w))
            .collect();
        for window in gone {
            if self.infos.remove(&window).is_some() {
                changes.push(BackendChange::WindowClosed(window_id(window)));
            }
        }
        for window in clients.iter().copied() {
            if !self.infos.contains_key(&window) {
                if let Some(info) = self.track(window) {
                    changes.push(BackendChange::WindowOpened(info));
                }
            }
        }
        self.clients = clients;
    }

    fn root_property_changed(&mut self, atom: Atom, changes: &mut Vec<BackendChange>) {
        let atoms = self.atoms.clone();
        if atom == atoms.net_client_list {
            self.client_list_changed(changes);
        } else if atom == atoms.net_client_list_stacking {
            self.stacking = self.read_root_windows(atom);
            changes.push(BackendChange::StackingChanged(self.windows_stacked()));
        } else if atom == atoms.net_active_window {
            let active = self.read_active();
            if active != self.active {
                self.active = active;
                changes.push(BackendChange::ActiveWindowChanged(active.map(window_id)));
                self.reselect_stage();
            }
        } else if atom == atoms.net_number_of_desktops || atom == atoms.net_desktop_names {
            changes.push(BackendChange::WorkspacesChanged(self.read_workspaces()));
        } else if atom == atoms.net_current_desktop {
            changes.push(BackendChange::ActiveWorkspaceChanged(self.active_workspace()));
        } else if atom == atoms.net_supported {
            self.supported = self.read_root_atoms(atom);
        }
    }

    fn window_property_changed(&mut self, window: XWindow, atom: Atom, changes: &mut Vec<BackendChange>) {
        if !self.infos.contains_key(&window) {
            return;
        }
        if atom == self.atoms.net_wm_icon {
            changes.push(BackendChange::WindowIconChanged(window_id(window)));
            return;
        }
        self.refresh_window(window, changes);
        if let Some(info) = self.infos.get(&window) {
            let stage = self.stage.as_ref().map(|s| window_id(s.window));
            self.heal_stage_state(stage_state_to_heal(info.id, stage, info.state));
        }
    }

    fn refresh_window(&mut self, window: XWindow, changes: &mut Vec<BackendChange>) {
        match self.read_info(window) {
            Ok(info) => {
                if self.infos.get(&window) != Some(&info) {
                    self.infos.insert(window, info.clone());
                    changes.push(BackendChange::WindowChanged(info));
                }
            }
            Err(e) => debug!(window = %window_id(window), "Failed to re-read window: {:#}", e),
        }
    }

    fn screen_changed(&mut self, width: u32, height: u32, changes: &mut Vec<BackendChange>) {
        if (width, height) != self.screen {
            self.screen = (width, height);
            changes.push(BackendChange::ScreenSizeChanged { width, height });
        }
        let monitors = self.read_monitors();
        if monitors != self.monitors {
            self.monitors = monitors.clone();
            changes.push(BackendChange::MonitorsChanged(monitors));
        }
        self.place_stage();
    }

    fn translate(&mut self, event: Event, changes: &mut Vec<BackendChange>) {
        match event {
            Event::PropertyNotify(e) if e.window == self.root => {
                self.root_property_changed(e.atom, changes);
            }
            Event::PropertyNotify(e) => self.window_property_changed(e.window, e.atom, changes),
            Event::ConfigureNotify(e) if e.window == self.root => {
                self.screen_changed(e.width as u32, e.height as u32, changes);
            }
            Event::ConfigureNotify(e) => {
                if self.infos.contains_key(&e.window) {
                    self.refresh_window(e.window, changes);
                }
            }
            Event::RandrScreenChangeNotify(e) => {
                self.screen_changed(e.width as u32, e.height as u32, changes);
            }
            Event::RandrNotify(_) => {
                let screen = self.screen;
                self.screen_changed(screen.0, screen.1, changes);
            }
            Event::DestroyNotify(e) => {
                if self.infos.remove(&e.window).is_some() {
                    self.clients.retain(|w| *w != e.window);
                    self.stacking.retain(|w| *w != e.window);
                    changes.push(BackendChange::WindowClosed(window_id(e.window)));
                }
                if self.stage.as_ref().is_some_and(|s| s.window == e.window) {
                    warn!("Stage window was destroyed");
                    self.stage = None;
                }
            }
            Event::Error(e) => debug!("X11 error: {:?}", e),
            _ => {}
        }
    }
}

impl WindowTrackerBackend for X11Backend {
    fn name(&self) -> &str {
        "x11"
    }

    fn dispatch(&mut self) -> Vec<BackendChange> {
        let mut changes = Vec::new();
        while !self.connection_lost {
            match self.conn.poll_for_event() {
                Ok(Some(event)) => self.translate(event, &mut changes),
                Ok(None) => break,
                Err(e) => {
                    error!("X11 connection error: {}", e);
                    self.connection_lost = true;
                }
            }
        }
        changes
    }

    fn is_connected(&self) -> bool {
        !self.connection_lost
    }

    fn windows(&self) -> Vec<WindowInfo> {
        self.clients
            .iter()
            .filter_map(|w| self.infos.get(w).cloned())
            .collect()
    }

    fn windows_stacked(&self) -> Vec<WindowId> {
        self.stacking
            .iter()
            .filter(|w| self.infos.contains_key(w))
            .map(|w| window_id(*w))
            .collect()
    }

    fn active_window(&self) -> Option<WindowId> {
        self.active.map(window_id)
    }

    fn workspaces(&self) -> Vec<WorkspaceInfo> {
        self.read_workspaces()
    }

    fn active_workspace(&self) -> Option<usize> {
        self.read_root_cardinal(self.atoms.net_current_desktop)
            .map(|d| d as usize)
    }

    fn monitors(&self) -> Vec<MonitorInfo> {
        self.monitors.clone()
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn window_geometry(&self, window: WindowId) -> Option<Geometry> {
        self.read_geometry(xid(window))
            .map_err(|e| debug!(%window, "Failed to query geometry: {:#}", e))
            .ok()
    }

    fn set_window_geometry(&self, window: WindowId, geometry: Geometry) {
        self.request(
            "_NET_MOVERESIZE_WINDOW",
            xid(window),
            self.atoms.net_moveresize_window,
            [
                MOVERESIZE_ALL | (SOURCE_PAGER << 12),
                geometry.x as u32,
                geometry.y as u32,
                geometry.width,
                geometry.height,
            ],
        );
    }

    fn activate_window(&self, window: WindowId) {
        self.request(
            "_NET_ACTIVE_WINDOW",
            xid(window),
            self.atoms.net_active_window,
            [SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0],
        );
    }

    fn close_window(&self, window: WindowId) {
        self.request(
            "_NET_CLOSE_WINDOW",
            xid(window),
            self.atoms.net_close_window,
            [x11rb::CURRENT_TIME, SOURCE_PAGER, 0, 0, 0],
        );
    }

    fn activate_workspace(&self, index: usize) {
        self.request(
            "_NET_CURRENT_DESKTOP",
            self.root,
            self.atoms.net_current_desktop,
            [index as u32, x11rb::CURRENT_TIME, 0, 0, 0],
        );
    }

    fn window_icon(&self, window: WindowId) -> Option<IconImage> {
        let data = self
            .property32(xid(window), self.atoms.net_wm_icon, AtomEnum::CARDINAL)
            .map_err(|e| debug!(%window, "Failed to read _NET_WM_ICON: {:#}", e))
            .ok()?;
        icons::parse_net_wm_icon(&data)
    }

    fn window_surface(&self, window: WindowId) -> Option<WindowSurface> {
        if !self.has_composite {
            return None;
        }
        let name = || -> Result<WindowSurface> {
            let geometry = self.conn.get_geometry(xid(window))?.reply()?;
            let pixmap = self.conn.generate_id()?;
            self.conn
                .composite_name_window_pixmap(xid(window), pixmap)?
                .check()?;
            Ok(WindowSurface {
                window,
                resource: pixmap as u64,
                width: geometry.width as u32 + 2 * geometry.border_width as u32,
                height: geometry.height as u32 + 2 * geometry.border_width as u32,
            })
        };
        name()
            .map_err(|e| debug!(%window, "No live surface: {:#}", e))
            .ok()
    }

    fn release_window_surface(&self, surface: &WindowSurface) {
        let freed = self
            .conn
            .free_pixmap(surface.resource as u32)
            .map_err(anyhow::Error::from)
            .and_then(|_| self.conn.flush().map_err(anyhow::Error::from));
        if let Err(e) = freed {
            warn!(window = %surface.window, "Failed to free window pixmap: {:#}", e);
        }
    }

    fn window_for_surface(&self, surface: SurfaceId) -> Option<WindowId> {
        let window = surface.0 as XWindow;
        let known = self.infos.contains_key(&window)
            || self.stage.as_ref().is_some_and(|s| s.window == window);
        known.then(|| window_id(window))
    }

    fn surface_for_window(&self, window: WindowId) -> Option<SurfaceId> {
        let known = self.infos.contains_key(&xid(window))
            || self.stage.as_ref().is_some_and(|s| s.window == xid(window));
        known.then_some(SurfaceId(window.0))
    }

    fn show_stage(&self, window: WindowId) {
        let Some(stage) = self.stage.as_ref().filter(|s| s.window == xid(window)) else {
            warn!(%window, "show_stage called for a window that is not the stage");
            return;
        };
        if let Err(e) = self
            .conn
            .map_window(stage.window)
            .map_err(anyhow::Error::from)
            .and_then(|_| self.conn.flush().map_err(anyhow::Error::from))
        {
            warn!("Failed to map stage window: {:#}", e);
            return;
        }
        stage.visible.set(true);
        self.place_stage();
        self.activate_window(window);
    }

    fn hide_stage(&self, window: WindowId) {
        let Some(stage) = self.stage.as_ref().filter(|s| s.window == xid(window)) else {
            warn!(%window, "hide_stage called for a window that is not the stage");
            return;
        };
        stage.visible.set(false);
        if let Err(e) = self
            .conn
            .unmap_window(stage.window)
            .map_err(anyhow::Error::from)
            .and_then(|_| self.conn.flush().map_err(anyhow::Error::from))
        {
            warn!("Failed to unmap stage window: {:#}", e);
        }
    }
}
