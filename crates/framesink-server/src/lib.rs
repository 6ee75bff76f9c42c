//! framesink server - frame socket plumbing and lifecycle
//!
//! [`FrameListener`] owns the accept loop, [`FrameReceiver`] parses one
//! connection's frame stream into the latest-wins slot, and [`FrameServer`]
//! ties listener, receiver and presenter together behind the public
//! `start` / `stop` / `set_output_surface` / `is_running` entry points.

pub mod listener;
pub mod receiver;
pub mod server;

pub use listener::FrameListener;
pub use receiver::FrameReceiver;
pub use server::FrameServer;
