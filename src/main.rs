//! xfdashboard
//!
//! Connects to the X server, tracks its windows and keeps one live window
//! view per pager-visible window, laid out as a scaled grid over the
//! primary monitor.

use anyhow::{bail, Context, Result};
use std::cell::Cell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xfdashboard::config::Config;
use xfdashboard::layout::{Rect, ScaledTableLayout};
use xfdashboard::shared::{IconLoader, ThemeIconLoader};
use xfdashboard::signal::Subscription;
use xfdashboard::tracker::{EventKind, TrackerEvent, WindowId, WindowTracker, WindowTrackerBackend};
use xfdashboard::view::{LiveWindowEvent, LiveWindowView};
use xfdashboard::x11::{X11Backend, X11EventStream};

struct Args {
    config: Option<PathBuf>,
    no_stage: bool,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = std::env::args().skip(1);
        let mut parsed = Args {
            config: None,
            no_stage: false,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().context("--config needs a path")?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--no-stage" => parsed.no_stage = true,
                other => bail!("Unknown argument '{}'", other),
            }
        }
        Ok(parsed)
    }
}

/// Views of all pager-visible windows and their layout
struct Dashboard {
    tracker: Rc<WindowTracker>,
    icons: Rc<dyn IconLoader>,
    config: Config,
    layout: ScaledTableLayout,
    views: HashMap<WindowId, LiveWindowView>,
    /// View notifications that mark the layout dirty
    view_subscriptions: HashMap<WindowId, Subscription>,
    dirty: Rc<Cell<bool>>,
    _tracker_subscription: Subscription,
}

impl Dashboard {
    fn new(tracker: Rc<WindowTracker>, config: Config) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        let subscription = tracker.connect_all(move |event| {
            let relayout = matches!(
                event.kind(),
                EventKind::WindowOpened
                    | EventKind::WindowClosed
                    | EventKind::WindowGeometryChanged
                    | EventKind::WindowStateChanged
                    | EventKind::MonitorGeometryChanged
                    | EventKind::PrimaryMonitorChanged
                    | EventKind::ScreenSizeChanged
            );
            if relayout {
                flag.set(true);
            }
            if let TrackerEvent::WindowOpened(window) = event {
                debug!(window = %window.id(), name = %window.name(), "Window opened");
            }
        });

        Self {
            layout: config.layout.build(),
            icons: Rc::new(ThemeIconLoader::with_default_paths()),
            tracker,
            config,
            views: HashMap::new(),
            view_subscriptions: HashMap::new(),
            dirty,
            _tracker_subscription: subscription,
        }
    }

    /// Create views for new windows and drop views whose window is gone
    fn sync_views(&mut self) {
        let before = self.views.len();
        self.views
            .retain(|_, view| !view.is_destroyed() && view.is_bound());
        self.view_subscriptions
            .retain(|id, _| self.views.contains_key(id));

        for window in self.tracker.windows() {
            if window.is_stage() || self.views.contains_key(&window.id()) {
                continue;
            }
            let view = LiveWindowView::with_icon_loader(Rc::clone(&self.tracker), Rc::clone(&self.icons));
            self.config.live_window.configure(&view);
            let flag = Rc::clone(&self.dirty);
            let subscription = view.connect(move |event| {
                if !matches!(event, LiveWindowEvent::StyleChanged | LiveWindowEvent::WorkspaceChanged) {
                    flag.set(true);
                }
            });
            view.set_window(Some(&window));
            self.view_subscriptions.insert(window.id(), subscription);
            self.views.insert(window.id(), view);
        }

        if self.views.len() != before {
            self.dirty.set(true);
        }
    }

    fn relayout(&mut self) {
        if !self.dirty.replace(false) {
            return;
        }
        let Some(monitor) = self.tracker.primary_monitor() else {
            debug!("No primary monitor, skipping layout");
            return;
        };
        let geometry = monitor.geometry();
        let container = Rect::new(
            geometry.x as f32,
            geometry.y as f32,
            geometry.width as f32,
            geometry.height as f32,
        );

        // Stacking order, bottom to top
        let children: Vec<(WindowId, LiveWindowView)> = self
            .tracker
            .windows_stacked()
            .iter()
            .filter_map(|w| self.views.get(&w.id()).map(|v| (w.id(), v.clone())))
            .collect();
        let views: Vec<LiveWindowView> = children.iter().map(|(_, v)| v.clone()).collect();
        let allocations = self.layout.allocate(&views, container);

        info!(
            "Layout pass: {} windows in {}x{} grid on monitor {}",
            self.layout.number_children(),
            self.layout.rows(),
            self.layout.columns(),
            monitor.number()
        );
        for ((id, view), allocation) in children.iter().zip(allocations) {
            match allocation {
                Some(rect) => debug!(
                    window = %id,
                    live = view.content().is_some_and(|c| c.is_live()),
                    "Allocated {:.0}x{:.0}+{:.0}+{:.0}",
                    rect.width,
                    rect.height,
                    rect.x,
                    rect.y
                ),
                None => debug!(window = %id, "Hidden"),
            }
        }
    }

    fn update(&mut self) {
        self.sync_views();
        self.relayout();
    }
}

fn init_logging(filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| filter.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run(config: Config, no_stage: bool, mut shutdown: tokio::sync::mpsc::Receiver<()>) -> Result<()> {
    if config.backend.name != "x11" {
        bail!("Unsupported window tracker backend '{}'", config.backend.name);
    }
    let mut backend = X11Backend::connect(config.backend.display.as_deref())?;
    let stream = X11EventStream::new(backend.connection())?;

    if config.stage.enabled && !no_stage {
        let stage = backend.create_stage(&config.stage.title)?;
        backend.show_stage(stage);
    }

    let tracker = WindowTracker::new(Box::new(backend));
    let mut dashboard = Dashboard::new(Rc::clone(&tracker), config);

    // Events read into the connection's buffer while waiting for replies
    // do not wake the poller
    let mut fallback = tokio::time::interval(Duration::from_secs(1));

    info!("Starting main event loop");
    loop {
        tracker.dispatch();
        if !tracker.is_backend_connected() {
            bail!("Lost connection to the X server");
        }
        dashboard.update();
        stream.flush().context("Failed to flush X11 requests")?;

        tokio::select! {
            () = stream.readable() => {}
            _ = fallback.tick() => {}
            _ = shutdown.recv() => {
                info!("Shutdown signal received, cleaning up...");
                break;
            }
        }
    }

    // Release live surfaces before the stage goes away
    drop(dashboard);
    if let Some(stage) = tracker.stage_window() {
        tracker.hide_stage(&stage);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse()?;
    let config = Config::load(args.config.as_deref())?;
    init_logging(&config.logging.filter);

    info!("Starting xfdashboard");

    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
            }
            let _ = shutdown_tx.send(()).await;
        });
    }

    if let Err(e) = run(config, args.no_stage, shutdown_rx).await {
        error!("Application error: {:#}", e);
        return Err(e);
    }
    Ok(())
}
