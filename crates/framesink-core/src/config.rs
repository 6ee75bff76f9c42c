//! Configuration types for framesink

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::protocol::DEFAULT_PORT;

/// Main configuration for the frame bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// TCP port the producer connects to (0 picks an ephemeral port)
    pub port: u16,
    /// Refresh rate for the fixed-period presenter fallback, in Hz
    pub refresh_fps: u32,
    /// Directory to snapshot the first frame of each connection into
    /// (PNG, debugging aid); disabled when None
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            refresh_fps: 60,
            snapshot_dir: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder pattern: set refresh rate
    pub fn with_refresh_fps(mut self, fps: u32) -> Self {
        self.refresh_fps = fps.max(1);
        self
    }

    /// Builder pattern: set snapshot directory
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    /// Interval between presenter firings for the timer fallback
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_micros(1_000_000 / self.refresh_fps as u64)
    }
}
