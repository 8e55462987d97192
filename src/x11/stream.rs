//! Readiness notification for the X11 connection
//!
//! A blocking mio poller watches the connection fd on tokio's blocking pool
//! and wakes the main loop through a [`Notify`]. The main loop then lets the
//! backend drain all queued events through the tracker.

use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{oneshot, Notify};
use x11rb::connection::Connection;
use x11rb::rust_connection::RustConnection;

const X11_TOKEN: mio::Token = mio::Token(0);

/// Wakes the event loop whenever the X11 socket becomes readable
pub struct X11EventStream {
    conn: Arc<RustConnection>,
    notify: Arc<Notify>,
    /// Dropping this stops the poller
    _shutdown: oneshot::Receiver<()>,
}

impl X11EventStream {
    /// Must be called from within a tokio runtime
    pub fn new(conn: Arc<RustConnection>) -> Result<Self> {
        let fd = conn.stream().as_raw_fd();
        let notify = Arc::new(Notify::new());
        let poller_notify = Arc::clone(&notify);
        let (alive, shutdown) = oneshot::channel::<()>();

        let mut poll = mio::Poll::new().context("Failed to create mio poller")?;
        poll.registry()
            .register(&mut mio::unix::SourceFd(&fd), X11_TOKEN, mio::Interest::READABLE)
            .context("Failed to register the X11 connection with mio")?;

        tokio::task::spawn_blocking(move || {
            let mut events = mio::Events::with_capacity(1);
            loop {
                if alive.is_closed() {
                    tracing::debug!("X11 poller stopping");
                    return;
                }
                if let Err(err) = poll.poll(&mut events, Some(Duration::from_millis(100))) {
                    tracing::warn!("X11 socket poll failed: {:?}", err);
                    continue;
                }
                if events.iter().any(|event| event.token() == X11_TOKEN) {
                    poller_notify.notify_one();
                }
            }
        });

        Ok(Self {
            conn,
            notify,
            _shutdown: shutdown,
        })
    }

    /// Resolves once the socket has data (or a notification is already pending)
    pub async fn readable(&self) {
        self.notify.notified().await;
    }

    /// Send queued requests before going back to sleep
    pub fn flush(&self) -> Result<()> {
        self.conn.flush().context("Failed to flush X11 connection")?;
        Ok(())
    }
}
