//! Refresh-cadence scheduling
//!
//! The presenter is driven by one-shot callbacks bound to the host's
//! frame-presentation clock: each firing does one tick and re-registers
//! itself while presenting should continue. Hosts with a native facility
//! (compositor frame callbacks, vsync events) implement [`RefreshDriver`]
//! over it; [`TimerDriver`] is the fixed-period fallback.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use framesink_core::{Error, Result};

/// A one-shot callback scheduled for the next display refresh.
pub type RefreshCallback = Box<dyn FnOnce() + Send>;

/// Registrar for "run once on the next display refresh".
///
/// Each registration fires exactly once; continuing requires the callback
/// to re-register. Firings are independent: a registration made while a
/// callback runs must not queue a backlog of extra firings.
pub trait RefreshDriver: Send + Sync {
    fn schedule(&self, callback: RefreshCallback);
}

/// Fixed-period [`RefreshDriver`] for hosts without an exposed frame clock.
///
/// A single worker thread sleeps out the remainder of the refresh interval
/// before running each scheduled callback, so firings land at most once
/// per interval regardless of how quickly callbacks re-register.
pub struct TimerDriver {
    tx: mpsc::Sender<RefreshCallback>,
}

impl TimerDriver {
    pub fn new(interval: Duration) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<RefreshCallback>();

        thread::Builder::new()
            .name("framesink-refresh".into())
            .spawn(move || {
                let mut next_fire = Instant::now() + interval;
                while let Ok(callback) = rx.recv() {
                    if let Some(remaining) = next_fire.checked_duration_since(Instant::now()) {
                        thread::sleep(remaining);
                    }
                    next_fire = Instant::now() + interval;
                    callback();
                }
                debug!("Refresh timer thread exiting");
            })
            .map_err(Error::Io)?;

        Ok(Self { tx })
    }
}

impl RefreshDriver for TimerDriver {
    fn schedule(&self, callback: RefreshCallback) {
        // Send fails only after the worker exited, i.e. during teardown
        let _ = self.tx.send(callback);
    }
}
