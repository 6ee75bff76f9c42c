//! Rolling receive/display rate window
//!
//! Received and displayed frame counts over a fixed 5 second window,
//! logged and reset by the receiver loop. The presenter only increments
//! its counter; it must never block or log on the render path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::info;

/// Length of one stats window.
pub const WINDOW_LENGTH: Duration = Duration::from_secs(5);

/// Counters for instantaneous receive and display FPS.
pub struct StatsWindow {
    received: AtomicU64,
    displayed: AtomicU64,
    window_start: Mutex<Instant>,
}

impl StatsWindow {
    pub fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            displayed: AtomicU64::new(0),
            window_start: Mutex::new(Instant::now()),
        }
    }

    /// Count one frame received from the producer.
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one frame blitted to the surface.
    pub fn record_displayed(&self) {
        self.displayed.fetch_add(1, Ordering::Relaxed);
    }

    /// Zero both counters and restart the window. Called on server start.
    pub fn reset(&self) {
        self.received.store(0, Ordering::Relaxed);
        self.displayed.store(0, Ordering::Relaxed);
        *self.start() = Instant::now();
    }

    /// Log receive/display FPS and reset, if the window has elapsed.
    ///
    /// Called from the receiver loop after each frame; cheap when the
    /// window is still open.
    pub fn maybe_log(&self) {
        let mut start = self.start();
        let elapsed = start.elapsed();
        if elapsed < WINDOW_LENGTH {
            return;
        }

        let received = self.received.swap(0, Ordering::Relaxed);
        let displayed = self.displayed.swap(0, Ordering::Relaxed);
        let secs = elapsed.as_secs_f64();
        info!(
            "Frame rates: {:.1} fps received, {:.1} fps displayed",
            received as f64 / secs,
            displayed as f64 / secs
        );
        *start = Instant::now();
    }

    /// Frames received in the current window.
    pub fn received_count(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Frames displayed in the current window.
    pub fn displayed_count(&self) -> u64 {
        self.displayed.load(Ordering::Relaxed)
    }

    fn start(&self) -> std::sync::MutexGuard<'_, Instant> {
        self.window_start
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn counts(&self) -> (u64, u64) {
        (self.received_count(), self.displayed_count())
    }
}

impl Default for StatsWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = StatsWindow::new();
        stats.record_received();
        stats.record_received();
        stats.record_displayed();
        assert_eq!(stats.counts(), (2, 1));
    }

    #[test]
    fn test_reset_clears_counters() {
        let stats = StatsWindow::new();
        stats.record_received();
        stats.record_displayed();
        stats.reset();
        assert_eq!(stats.counts(), (0, 0));
    }

    #[test]
    fn test_log_only_after_window() {
        let stats = StatsWindow::new();
        stats.record_received();
        // Window has just opened, counters must survive
        stats.maybe_log();
        assert_eq!(stats.counts(), (1, 0));
    }
}
