//! framesink core - shared types for the frame-delivery bridge
//!
//! This crate is the leaf of the workspace: the immutable [`Frame`] type,
//! the latest-wins [`FrameSlot`] exchange, the wire protocol header codec,
//! and the rolling FPS stats window.

pub mod config;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod slot;
pub mod stats;

pub use config::Config;
pub use error::{Error, Result};
pub use frame::Frame;
pub use protocol::{FrameHeader, DEFAULT_PORT, FRAME_HEADER_LEN, MAX_DIMENSION};
pub use slot::FrameSlot;
pub use stats::StatsWindow;
