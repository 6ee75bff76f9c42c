//! Lifecycle controller
//!
//! [`FrameServer`] is the single entry point the embedding application
//! talks to: it owns the slot, the stats window, the presenter and the
//! listener, and exposes `start` / `stop` / `set_output_surface` /
//! `is_running`.
//!
//! State machine: STOPPED -> start() -> LISTENING for the whole running
//! lifetime; each accepted connection runs a receiving activity alongside
//! and is replaced, not queued, by the next connection. The presenter's
//! IDLE/SCHEDULED sub-state is toggled purely by surface attach/detach.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use framesink_core::{Config, FrameSlot, Result, StatsWindow};
use framesink_present::{OutputSurface, Presenter, RefreshDriver};

use crate::listener::FrameListener;

/// The frame-delivery bridge.
pub struct FrameServer {
    config: Config,
    slot: Arc<FrameSlot>,
    stats: Arc<StatsWindow>,
    running: Arc<AtomicBool>,
    presenter: Arc<Presenter>,
    listener: Mutex<Option<FrameListener>>,
}

impl FrameServer {
    pub fn new(config: Config, driver: Arc<dyn RefreshDriver>) -> Self {
        let slot = Arc::new(FrameSlot::new());
        let stats = Arc::new(StatsWindow::new());
        let running = Arc::new(AtomicBool::new(false));
        let presenter = Arc::new(Presenter::new(
            slot.clone(),
            stats.clone(),
            driver,
            running.clone(),
        ));

        Self {
            config,
            slot,
            stats,
            running,
            presenter,
            listener: Mutex::new(None),
        }
    }

    /// Bind the frame port and begin serving. Idempotent: calling while
    /// already running returns success without rebinding. On bind failure
    /// no server is created and the error is returned.
    pub fn start(&self) -> Result<()> {
        let mut listener = self.listener_slot();
        if self.running.load(Ordering::SeqCst) {
            debug!("start() while already running, nothing to do");
            return Ok(());
        }

        self.stats.reset();
        // A frame left over from a previous run must not be presented
        self.slot.take_and_clear();

        let started = FrameListener::start(
            self.config.port,
            self.slot.clone(),
            self.stats.clone(),
            self.config.snapshot_dir.clone(),
        )?;
        let port = started.local_port();
        *listener = Some(started);
        self.running.store(true, Ordering::SeqCst);
        drop(listener);

        // If a surface is already attached, presenting resumes immediately
        self.presenter.ensure_scheduled();

        info!("Frame server running on port {}", port);
        Ok(())
    }

    /// Stop serving: terminate the listener and the active receiver and
    /// let the presenter's refresh chain wind down. Idempotent; callable
    /// from any thread.
    pub fn stop(&self) {
        let mut listener = self.listener_slot();
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(mut active) = listener.take() {
            active.stop();
        }
        info!("Frame server stopped");
    }

    /// Overall server state.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Attach or detach the output surface. Attaching while running
    /// (re)starts the presenter's refresh cadence; `None` stops it. Safe
    /// to call repeatedly and concurrently with an in-flight tick.
    pub fn set_output_surface(&self, surface: Option<Arc<dyn OutputSurface>>) {
        self.presenter.set_surface(surface);
    }

    /// Port the listener is bound to, while running. Useful with port 0.
    pub fn local_port(&self) -> Option<u16> {
        self.listener_slot().as_ref().map(FrameListener::local_port)
    }

    /// Receive/display counters for the current stats window.
    pub fn stats(&self) -> &Arc<StatsWindow> {
        &self.stats
    }

    fn listener_slot(&self) -> std::sync::MutexGuard<'_, Option<FrameListener>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for FrameServer {
    fn drop(&mut self) {
        self.stop();
    }
}
