//! Live window view
//!
//! A node presenting one tracked window. While bound it listens to the
//! window's geometry, state, workspace and closed events (plus icon changes
//! when showing the icon) and re-derives its visibility, style classes and
//! content from them. Binding replays all derivations at once so a freshly
//! bound view is never stale.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::content::{DisplayMode, WindowContent};
use crate::layout::{LayoutChild, Size};
use crate::shared::{IconImage, IconLoader};
use crate::signal::{Signal, Subscription};
use crate::style::{self, Stylable, StyleError, StyleValue};
use crate::tracker::{EventKind, WeakWindowHandle, Window, WindowHandle, WindowState, WindowTracker};

pub const DEFAULT_ICON_SIZE: u32 = 64;

/// Notifications from a [`LiveWindowView`]
#[derive(Debug, Clone, PartialEq)]
pub enum LiveWindowEvent {
    VisibilityChanged(bool),
    ContentChanged,
    GeometryChanged,
    WorkspaceChanged,
    StyleChanged,
    /// The bound window closed; the view is unbound now
    Closed,
    /// The view destroyed itself after its window closed
    Destroyed,
}

const STATE_CLASSES: [(WindowState, &str); 4] = [
    (WindowState::PINNED, "pinned"),
    (WindowState::MINIMIZED, "minimized"),
    (WindowState::MAXIMIZED, "maximized"),
    (WindowState::URGENT, "urgent"),
];

/// Style classes implied by a window state
pub fn style_classes_for(state: WindowState) -> BTreeSet<&'static str> {
    STATE_CLASSES
        .iter()
        .filter(|(flag, _)| state.contains(*flag))
        .map(|(_, class)| *class)
        .collect()
}

struct ViewState {
    window: Option<WeakWindowHandle>,
    window_subscriptions: Vec<Subscription>,
    icon_subscription: Option<Subscription>,
    display_mode: DisplayMode,
    destroy_on_close: bool,
    icon_size: u32,
    visible: bool,
    style_classes: BTreeSet<&'static str>,
    content: Option<WindowContent>,
    destroyed: bool,
}

struct Shared {
    tracker: Rc<WindowTracker>,
    icons: Option<Rc<dyn IconLoader>>,
    state: RefCell<ViewState>,
    signal: Signal<LiveWindowEvent>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(WindowContent::Live(surface)) = self.state.get_mut().content.take() {
            self.tracker.release_window_surface(&surface);
        }
    }
}

/// Handle to a live window view; clones refer to the same view
#[derive(Clone)]
pub struct LiveWindowView {
    shared: Rc<Shared>,
}

impl std::fmt::Debug for LiveWindowView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("LiveWindowView")
            .field("window", &state.window.as_ref().and_then(Weak::upgrade).map(|w| w.id()))
            .field("display_mode", &state.display_mode)
            .field("visible", &state.visible)
            .field("destroyed", &state.destroyed)
            .finish()
    }
}

impl LiveWindowView {
    pub fn new(tracker: Rc<WindowTracker>) -> Self {
        Self::build(tracker, None)
    }

    /// View that resolves themed icons for windows without one
    pub fn with_icon_loader(tracker: Rc<WindowTracker>, icons: Rc<dyn IconLoader>) -> Self {
        Self::build(tracker, Some(icons))
    }

    fn build(tracker: Rc<WindowTracker>, icons: Option<Rc<dyn IconLoader>>) -> Self {
        Self {
            shared: Rc::new(Shared {
                tracker,
                icons,
                state: RefCell::new(ViewState {
                    window: None,
                    window_subscriptions: Vec::new(),
                    icon_subscription: None,
                    display_mode: DisplayMode::default(),
                    destroy_on_close: false,
                    icon_size: DEFAULT_ICON_SIZE,
                    visible: false,
                    style_classes: BTreeSet::new(),
                    content: None,
                    destroyed: false,
                }),
                signal: Signal::new(),
            }),
        }
    }

    /// Observe this view's notifications
    #[must_use = "dropping the subscription disconnects the handler"]
    pub fn connect<F: Fn(&LiveWindowEvent) + 'static>(&self, handler: F) -> Subscription {
        self.shared.signal.connect(handler)
    }

    fn emit(&self, event: LiveWindowEvent) {
        self.shared.signal.emit(&event);
    }

    pub fn window(&self) -> Option<WindowHandle> {
        self.shared.state.borrow().window.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_bound(&self) -> bool {
        self.window().is_some()
    }

    /// Bind to `window`, rebind to another one, or unbind with `None`
    pub fn set_window(&self, window: Option<&WindowHandle>) {
        if self.is_destroyed() {
            warn!("Ignoring window change on a destroyed live window view");
            return;
        }

        let current = self.window();
        let unchanged = match (&current, window) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        if current.is_some() {
            self.unbind();
        }
        if let Some(window) = window {
            self.bind(window);
        }
    }

    fn bind(&self, window: &WindowHandle) {
        if window.is_closed() {
            warn!("Not binding live window view to closed window {}", window.id());
            return;
        }

        debug!("Binding live window view to window {}", window.id());
        let subscriptions = self.subscribe_window(window);
        let icon_subscription =
            (self.display_mode() == DisplayMode::IconOnly).then(|| self.subscribe_icon(window));
        {
            let mut state = self.shared.state.borrow_mut();
            state.window = Some(Rc::downgrade(window));
            state.window_subscriptions = subscriptions;
            state.icon_subscription = icon_subscription;
        }

        // Replay every derivation as if each event had just fired
        self.update_visibility();
        self.update_style();
        self.reload_content();
        self.emit(LiveWindowEvent::GeometryChanged);
        self.emit(LiveWindowEvent::WorkspaceChanged);
    }

    fn unbind(&self) {
        let (window_subscriptions, icon_subscription, old_window) = {
            let mut state = self.shared.state.borrow_mut();
            (
                std::mem::take(&mut state.window_subscriptions),
                state.icon_subscription.take(),
                state.window.take(),
            )
        };
        if let Some(window) = old_window.as_ref().and_then(Weak::upgrade) {
            debug!("Unbinding live window view from window {}", window.id());
        }
        drop(window_subscriptions);
        drop(icon_subscription);

        if self.take_content() {
            self.emit(LiveWindowEvent::ContentChanged);
        }
        self.set_visible(false);
        self.set_style_classes(BTreeSet::new());
    }

    /// Connect one handler per window-scoped event this view follows
    fn subscribe_window(&self, window: &Window) -> Vec<Subscription> {
        let handlers: [(EventKind, fn(&LiveWindowView)); 4] = [
            (EventKind::WindowGeometryChanged, Self::on_geometry_changed),
            (EventKind::WindowStateChanged, Self::on_state_changed),
            (EventKind::WindowWorkspaceChanged, Self::on_workspace_changed),
            (EventKind::WindowClosed, Self::on_closed),
        ];
        handlers
            .into_iter()
            .map(|(kind, handler)| self.subscribe(window, kind, handler))
            .collect()
    }

    fn subscribe_icon(&self, window: &Window) -> Subscription {
        self.subscribe(window, EventKind::WindowIconChanged, Self::on_icon_changed)
    }

    fn subscribe(&self, window: &Window, kind: EventKind, handler: fn(&LiveWindowView)) -> Subscription {
        let weak = Rc::downgrade(&self.shared);
        self.shared.tracker.connect_window(window, kind, move |_| {
            if let Some(shared) = weak.upgrade() {
                handler(&LiveWindowView { shared });
            }
        })
    }

    /// Number of tracker subscriptions this view holds
    pub fn subscription_count(&self) -> usize {
        let state = self.shared.state.borrow();
        state.window_subscriptions.len() + usize::from(state.icon_subscription.is_some())
    }

    fn on_geometry_changed(&self) {
        if self.display_mode() == DisplayMode::LivePreview {
            self.reload_content();
        }
        self.emit(LiveWindowEvent::GeometryChanged);
    }

    fn on_state_changed(&self) {
        self.update_visibility();
        self.update_style();
        if self.display_mode() == DisplayMode::LivePreview {
            self.reload_content();
        }
    }

    fn on_workspace_changed(&self) {
        self.emit(LiveWindowEvent::WorkspaceChanged);
    }

    fn on_icon_changed(&self) {
        self.reload_content();
    }

    fn on_closed(&self) {
        debug!("Bound window of live window view closed");
        self.unbind();
        self.emit(LiveWindowEvent::Closed);
        if self.destroy_on_window_close() {
            self.destroy();
        }
    }

    /// Unbind and refuse any further binding
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        if self.is_bound() {
            self.unbind();
        }
        self.shared.state.borrow_mut().destroyed = true;
        self.emit(LiveWindowEvent::Destroyed);
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.state.borrow().destroyed
    }

    // ------------------------------------------------------------------
    // Visibility and style
    // ------------------------------------------------------------------

    /// Visible in the pager sense: no skip-pager or skip-tasklist flag
    pub fn is_visible(&self) -> bool {
        self.shared.state.borrow().visible
    }

    fn update_visibility(&self) {
        let visible = self.window().is_some_and(|w| w.is_visible_in_pager());
        self.set_visible(visible);
    }

    fn set_visible(&self, visible: bool) {
        let changed = {
            let mut state = self.shared.state.borrow_mut();
            std::mem::replace(&mut state.visible, visible) != visible
        };
        if changed {
            self.emit(LiveWindowEvent::VisibilityChanged(visible));
        }
    }

    pub fn style_classes(&self) -> BTreeSet<&'static str> {
        self.shared.state.borrow().style_classes.clone()
    }

    pub fn has_style_class(&self, class: &str) -> bool {
        self.shared.state.borrow().style_classes.contains(class)
    }

    fn update_style(&self) {
        let classes = self
            .window()
            .map(|w| style_classes_for(w.state()))
            .unwrap_or_default();
        self.set_style_classes(classes);
    }

    fn set_style_classes(&self, classes: BTreeSet<&'static str>) {
        let changed = {
            let mut state = self.shared.state.borrow_mut();
            if state.style_classes == classes {
                false
            } else {
                state.style_classes = classes;
                true
            }
        };
        if changed {
            self.emit(LiveWindowEvent::StyleChanged);
        }
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    pub fn content(&self) -> Option<WindowContent> {
        self.shared.state.borrow().content.clone()
    }

    /// Drop the current content, handing live surfaces back to the backend
    fn take_content(&self) -> bool {
        let old = self.shared.state.borrow_mut().content.take();
        match old {
            Some(WindowContent::Live(surface)) => {
                self.shared.tracker.release_window_surface(&surface);
                true
            }
            Some(WindowContent::Icon(_)) => true,
            None => false,
        }
    }

    fn reload_content(&self) {
        let Some(window) = self.window() else {
            return;
        };

        self.take_content();
        let (mode, icon_size) = {
            let state = self.shared.state.borrow();
            (state.display_mode, state.icon_size)
        };
        let content = match mode {
            DisplayMode::LivePreview => match self.shared.tracker.window_surface(&window) {
                Some(surface) => WindowContent::Live(surface),
                None => {
                    debug!("No live surface for window {}, showing its icon", window.id());
                    WindowContent::Icon(self.load_icon(&window, icon_size))
                }
            },
            DisplayMode::IconOnly => WindowContent::Icon(self.load_icon(&window, icon_size)),
        };

        self.shared.state.borrow_mut().content = Some(content);
        self.emit(LiveWindowEvent::ContentChanged);
    }

    fn load_icon(&self, window: &Window, size: u32) -> IconImage {
        if let Some(icon) = self.shared.tracker.window_icon(window) {
            return icon.scaled(size);
        }

        let class = window.class().unwrap_or_default();
        match &self.shared.icons {
            Some(loader) if !class.is_empty() => loader.load_or_placeholder(&class.to_lowercase(), size),
            _ => IconImage::missing(size),
        }
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    pub fn display_mode(&self) -> DisplayMode {
        self.shared.state.borrow().display_mode
    }

    pub fn set_display_mode(&self, mode: DisplayMode) {
        let window = {
            let mut state = self.shared.state.borrow_mut();
            if state.display_mode == mode {
                return;
            }
            state.display_mode = mode;
            state.window.as_ref().and_then(Weak::upgrade)
        };

        let Some(window) = window else {
            return;
        };
        let icon_subscription = match mode {
            DisplayMode::IconOnly => Some(self.subscribe_icon(&window)),
            DisplayMode::LivePreview => None,
        };
        let old = std::mem::replace(&mut self.shared.state.borrow_mut().icon_subscription, icon_subscription);
        drop(old);
        self.reload_content();
    }

    pub fn destroy_on_window_close(&self) -> bool {
        self.shared.state.borrow().destroy_on_close
    }

    pub fn set_destroy_on_window_close(&self, destroy: bool) {
        self.shared.state.borrow_mut().destroy_on_close = destroy;
    }

    pub fn icon_size(&self) -> u32 {
        self.shared.state.borrow().icon_size
    }

    pub fn set_icon_size(&self, size: u32) {
        let reload = {
            let mut state = self.shared.state.borrow_mut();
            let changed = state.icon_size != size;
            state.icon_size = size;
            changed && state.content.as_ref().is_some_and(|c| !c.is_live())
        };
        if reload {
            self.reload_content();
        }
    }

    /// Window geometry, or the content's own size while no valid geometry is known
    pub fn preferred_size(&self) -> Size {
        if let Some(window) = self.window() {
            let geometry = window.geometry();
            if !geometry.is_empty() {
                return Size::new(geometry.width as f32, geometry.height as f32);
            }
        }
        self.shared
            .state
            .borrow()
            .content
            .as_ref()
            .map(WindowContent::natural_size)
            .unwrap_or(Size::ZERO)
    }
}

impl LayoutChild for LiveWindowView {
    fn is_visible(&self) -> bool {
        LiveWindowView::is_visible(self)
    }

    fn natural_size(&self) -> Size {
        self.preferred_size()
    }
}

impl Stylable for LiveWindowView {
    fn style_properties(&self) -> &'static [&'static str] {
        &["display-mode", "destroy-on-close", "icon-size"]
    }

    fn set_style_property(&mut self, name: &str, value: &StyleValue) -> Result<(), StyleError> {
        match name {
            "display-mode" => {
                let mode = DisplayMode::parse(value.as_str(name)?)
                    .ok_or_else(|| style::invalid(name, "live-preview or icon-only"))?;
                self.set_display_mode(mode);
            }
            "destroy-on-close" => self.set_destroy_on_window_close(value.as_bool(name)?),
            "icon-size" => self.set_icon_size(value.as_u32(name)?),
            _ => return Err(style::unknown(name)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Geometry;
    use crate::tracker::testing::{FakeBackend, FakeControl, window_info};
    use crate::tracker::WindowId;
    use image::{Rgba, RgbaImage};

    fn setup() -> (Rc<WindowTracker>, FakeControl) {
        let (backend, fake) = FakeBackend::new();
        fake.add_window(window_info(1, "A", Geometry::new(0, 0, 800, 600)));
        fake.add_window(window_info(2, "B", Geometry::new(100, 100, 640, 480)));
        (WindowTracker::new(Box::new(backend)), fake)
    }

    fn record(view: &LiveWindowView) -> (Rc<RefCell<Vec<LiveWindowEvent>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        let sub = view.connect(move |e| l.borrow_mut().push(e.clone()));
        (log, sub)
    }

    fn visibility_events(log: &[LiveWindowEvent]) -> Vec<bool> {
        log.iter()
            .filter_map(|e| match e {
                LiveWindowEvent::VisibilityChanged(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_skip_pager_drives_visibility() {
        let (tracker, fake) = setup();
        fake.update_window(1, |info| info.state = WindowState::SKIP_PAGER | WindowState::MAXIMIZED);
        tracker.dispatch();

        let view = LiveWindowView::new(tracker.clone());
        let (log, _sub) = record(&view);
        view.set_window(tracker.window_by_id(WindowId(1)).as_ref());
        assert!(!view.is_visible());

        fake.update_window(1, |info| info.state.remove(WindowState::SKIP_PAGER));
        tracker.dispatch();

        assert!(view.is_visible());
        assert_eq!(visibility_events(&log.borrow()), vec![true]);
        assert!(view.has_style_class("maximized"));
    }

    #[test]
    fn test_rebind_moves_all_subscriptions() {
        let (tracker, fake) = setup();
        let a = tracker.window_by_id(WindowId(1)).unwrap();
        let b = tracker.window_by_id(WindowId(2)).unwrap();
        let view = LiveWindowView::new(tracker.clone());
        let baseline = tracker.subscriber_count();

        view.set_window(Some(&a));
        assert_eq!(tracker.subscriber_count(), baseline + 4);
        assert_eq!(view.subscription_count(), 4);

        view.set_window(Some(&b));
        assert_eq!(tracker.subscriber_count(), baseline + 4);
        assert!(Rc::ptr_eq(&view.window().unwrap(), &b));

        let (log, _sub) = record(&view);
        fake.update_window(1, |info| {
            info.geometry = Geometry::new(5, 5, 300, 300);
            info.state = WindowState::SKIP_TASKLIST;
            info.workspace = Some(1);
        });
        fake.close_window_id(1);
        tracker.dispatch();
        assert!(log.borrow().is_empty());
        assert!(view.is_bound());
    }

    #[test]
    fn test_subscriptions_follow_binding_for_any_sequence() {
        let (tracker, _fake) = setup();
        let windows = tracker.windows();
        let view = LiveWindowView::new(tracker.clone());
        let baseline = tracker.subscriber_count();

        // 0 = unbind, 1/2 = bind a window; every sequence of length 4
        for code in 0..3usize.pow(4) {
            let mut c = code;
            for _ in 0..4 {
                let target = match c % 3 {
                    0 => None,
                    n => Some(&windows[n - 1]),
                };
                c /= 3;
                view.set_window(target);
                let expected = if target.is_some() { 4 } else { 0 };
                assert_eq!(view.subscription_count(), expected);
                assert_eq!(tracker.subscriber_count(), baseline + expected);
            }
        }
        view.set_window(None);
        assert_eq!(tracker.subscriber_count(), baseline);
    }

    #[test]
    fn test_binding_replays_state() {
        let (tracker, fake) = setup();
        fake.update_window(2, |info| info.state = WindowState::PINNED | WindowState::URGENT);
        tracker.dispatch();

        let view = LiveWindowView::new(tracker.clone());
        let (log, _sub) = record(&view);
        view.set_window(tracker.window_by_id(WindowId(2)).as_ref());

        assert_eq!(
            *log.borrow(),
            vec![
                LiveWindowEvent::VisibilityChanged(true),
                LiveWindowEvent::StyleChanged,
                LiveWindowEvent::ContentChanged,
                LiveWindowEvent::GeometryChanged,
                LiveWindowEvent::WorkspaceChanged,
            ]
        );
        let classes: Vec<&str> = view.style_classes().into_iter().collect();
        assert_eq!(classes, vec!["pinned", "urgent"]);
        assert_eq!(view.preferred_size(), Size::new(640.0, 480.0));
    }

    #[test]
    fn test_style_classes_are_removed_symmetrically() {
        let (tracker, fake) = setup();
        let view = LiveWindowView::new(tracker.clone());
        view.set_window(tracker.window_by_id(WindowId(1)).as_ref());

        fake.update_window(1, |info| info.state = WindowState::MINIMIZED | WindowState::URGENT);
        tracker.dispatch();
        assert!(view.has_style_class("minimized") && view.has_style_class("urgent"));

        fake.update_window(1, |info| info.state = WindowState::URGENT);
        tracker.dispatch();
        assert!(!view.has_style_class("minimized"));
        assert!(view.has_style_class("urgent"));

        view.set_window(None);
        assert!(view.style_classes().is_empty());
    }

    #[test]
    fn test_live_content_is_refetched_and_released() {
        let (tracker, fake) = setup();
        let view = LiveWindowView::new(tracker.clone());
        view.set_window(tracker.window_by_id(WindowId(1)).as_ref());
        let first = view.content().and_then(|c| c.surface().cloned()).unwrap();

        fake.update_window(1, |info| info.geometry = Geometry::new(0, 0, 1024, 768));
        tracker.dispatch();
        let second = view.content().and_then(|c| c.surface().cloned()).unwrap();

        assert_ne!(first.resource, second.resource);
        assert_eq!((second.width, second.height), (1024, 768));
        assert_eq!(fake.released(), vec![first]);

        drop(view);
        assert_eq!(fake.released().len(), 2);
        assert_eq!(tracker.subscriber_count(), 0);
    }

    #[test]
    fn test_icon_mode_uses_window_icon_and_follows_changes() {
        let (tracker, fake) = setup();
        let view = LiveWindowView::new(tracker.clone());
        view.set_icon_size(32);
        view.set_display_mode(DisplayMode::IconOnly);
        view.set_window(tracker.window_by_id(WindowId(1)).as_ref());

        // No icon yet: placeholder, one extra subscription for icon changes
        assert_eq!(view.subscription_count(), 5);
        let icon = view.content().and_then(|c| c.icon().cloned()).unwrap();
        assert!(icon.is_placeholder());
        assert_eq!(icon.width(), 32);

        fake.set_icon(1, IconImage::new("term", RgbaImage::from_pixel(64, 64, Rgba([0, 0, 255, 255]))));
        tracker.dispatch();
        let icon = view.content().and_then(|c| c.icon().cloned()).unwrap();
        assert_eq!(icon.name(), "term");
        assert_eq!(icon.width(), 32);

        view.set_display_mode(DisplayMode::LivePreview);
        assert_eq!(view.subscription_count(), 4);
        assert!(view.content().is_some_and(|c| c.is_live()));
    }

    #[test]
    fn test_close_unbinds_and_optionally_destroys() {
        let (tracker, fake) = setup();
        let keep = LiveWindowView::new(tracker.clone());
        let doomed = LiveWindowView::new(tracker.clone());
        doomed.set_destroy_on_window_close(true);
        keep.set_window(tracker.window_by_id(WindowId(1)).as_ref());
        doomed.set_window(tracker.window_by_id(WindowId(1)).as_ref());
        let (keep_log, _k) = record(&keep);
        let (doomed_log, _d) = record(&doomed);

        fake.close_window_id(1);
        tracker.dispatch();

        assert!(!keep.is_bound() && !keep.is_destroyed());
        assert!(keep.content().is_none());
        assert!(keep_log.borrow().contains(&LiveWindowEvent::Closed));
        assert!(!keep_log.borrow().contains(&LiveWindowEvent::Destroyed));

        assert!(doomed.is_destroyed());
        assert_eq!(doomed_log.borrow().last(), Some(&LiveWindowEvent::Destroyed));
        assert_eq!(tracker.subscriber_count(), 0);

        doomed.set_window(tracker.window_by_id(WindowId(2)).as_ref());
        assert!(!doomed.is_bound());
        keep.set_window(tracker.window_by_id(WindowId(2)).as_ref());
        assert!(keep.is_bound());
    }

    #[test]
    fn test_preferred_size_falls_back_to_content() {
        let (backend, fake) = FakeBackend::new();
        fake.add_window(window_info(7, "Unmapped", Geometry::new(0, 0, 0, 0)));
        let tracker = WindowTracker::new(Box::new(backend));

        let mut view = LiveWindowView::new(tracker.clone());
        assert_eq!(view.apply_style(&[("display-mode", "icon-only"), ("icon-size", "48")]), 2);
        view.set_window(tracker.window_by_id(WindowId(7)).as_ref());
        assert_eq!(view.preferred_size(), Size::new(48.0, 48.0));
        assert_eq!(LayoutChild::natural_size(&view), Size::new(48.0, 48.0));
    }
}
