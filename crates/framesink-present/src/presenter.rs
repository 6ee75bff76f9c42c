//! Refresh-driven frame presenter
//!
//! Drains the latest-wins slot once per display refresh and blits the
//! frame to the attached surface. Scheduling is a self-rescheduling chain
//! of one-shot refresh callbacks that runs only while the server is
//! running and a surface is attached; an empty slot makes a tick a no-op,
//! so an idle producer costs no redraws.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use framesink_core::{Frame, FrameSlot, Result, StatsWindow};

use crate::refresh::RefreshDriver;
use crate::surface::{FitTransform, OutputSurface, ScratchImage};

/// Background color drawn behind letterboxed frames.
const BACKGROUND: [u8; 4] = [0, 0, 0, 255];

/// Cadence-driven consumer of the frame slot.
pub struct Presenter {
    slot: Arc<FrameSlot>,
    stats: Arc<StatsWindow>,
    driver: Arc<dyn RefreshDriver>,
    /// Server-level running flag, shared with the lifecycle controller.
    running: Arc<AtomicBool>,
    surface: Mutex<Option<Arc<dyn OutputSurface>>>,
    scratch: Mutex<ScratchImage>,
    /// Whether a refresh callback is currently registered.
    scheduled: AtomicBool,
}

impl Presenter {
    pub fn new(
        slot: Arc<FrameSlot>,
        stats: Arc<StatsWindow>,
        driver: Arc<dyn RefreshDriver>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            slot,
            stats,
            driver,
            running,
            surface: Mutex::new(None),
            scratch: Mutex::new(ScratchImage::new()),
            scheduled: AtomicBool::new(false),
        }
    }

    /// Attach or detach the output surface.
    ///
    /// Attaching while the server runs (re)starts the refresh cadence;
    /// detaching lets the chain wind down on its next firing. Safe to call
    /// concurrently with an in-flight tick: the tick captured its own
    /// handle and finishes drawing to it.
    pub fn set_surface(self: &Arc<Self>, surface: Option<Arc<dyn OutputSurface>>) {
        let attached = surface.is_some();
        *self.surface_slot() = surface;
        debug!(
            "Output surface {}",
            if attached { "attached" } else { "detached" }
        );
        self.ensure_scheduled();
    }

    /// Start the refresh chain if presenting should happen and no callback
    /// is registered yet. Idempotent.
    pub fn ensure_scheduled(self: &Arc<Self>) {
        if !self.should_present() {
            return;
        }
        if self
            .scheduled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.schedule_next();
        }
    }

    /// Whether a refresh callback is currently registered.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// One refresh firing: drain the slot and draw, if possible.
    ///
    /// Never blocks beyond the memcpy into the cached image; reallocates
    /// only when the frame dimensions change.
    pub fn tick(&self) {
        let Some(frame) = self.slot.take_and_clear() else {
            return;
        };

        // Capture the handle once per tick; a detach from another thread
        // after this point does not invalidate the draw in progress, and a
        // detach observed here is a no-op, never a fault.
        let Some(surface) = self.surface_slot().clone() else {
            return;
        };

        match self.render(&frame, surface.as_ref()) {
            Ok(()) => self.stats.record_displayed(),
            Err(e) => warn!("Presenter tick skipped: {}", e),
        }
    }

    fn render(&self, frame: &Frame, surface: &dyn OutputSurface) -> Result<()> {
        let mut scratch = self
            .scratch
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if scratch.load(frame) {
            debug!(
                "Scratch image reallocated for {}x{}",
                frame.width, frame.height
            );
        }

        let fit = FitTransform::compute(surface.dimensions(), (frame.width, frame.height));
        let mut target = surface.begin_frame()?;
        target.clear(BACKGROUND);
        target.blit_scaled(&scratch, &fit)?;
        target.present()
    }

    fn should_present(&self) -> bool {
        self.running.load(Ordering::SeqCst) && self.surface_slot().is_some()
    }

    fn schedule_next(self: &Arc<Self>) {
        let presenter = Arc::clone(self);
        self.driver.schedule(Box::new(move || presenter.on_refresh()));
    }

    fn on_refresh(self: Arc<Self>) {
        self.tick();
        if self.should_present() {
            self.schedule_next();
            return;
        }
        self.scheduled.store(false, Ordering::SeqCst);
        // A re-attach may have raced the decision to stop; pick the chain
        // back up rather than leaving the presenter idle.
        self.ensure_scheduled();
    }

    fn surface_slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<dyn OutputSurface>>> {
        self.surface.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
