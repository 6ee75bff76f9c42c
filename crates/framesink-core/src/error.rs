//! Error types for framesink

use thiserror::Error;

/// Main error type for framesink operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to bind frame socket on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("frame dimensions {width}x{height} outside 1..={max}")]
    InvalidDimensions { width: u32, height: u32, max: u32 },

    #[error("frame payload is {actual} bytes, header declares {expected}")]
    PayloadMismatch { expected: usize, actual: usize },

    #[error("output surface error: {0}")]
    Surface(String),

    #[error("frame snapshot failed: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using framesink's Error
pub type Result<T> = std::result::Result<T, Error>;
