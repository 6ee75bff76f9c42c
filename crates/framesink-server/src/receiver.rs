//! Per-connection frame stream parser
//!
//! Reads the producer's frame stream (8-byte header, RGBA8 payload) and
//! publishes each complete frame into the latest-wins slot. Runs on its
//! own thread; any read failure ends this connection quietly and the
//! server simply awaits the next one.

use std::io::Read;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use framesink_core::{Error, Frame, FrameHeader, FrameSlot, Result, StatsWindow, FRAME_HEADER_LEN};

/// Parser for one producer connection.
pub struct FrameReceiver {
    slot: Arc<FrameSlot>,
    stats: Arc<StatsWindow>,
    snapshot_dir: Option<PathBuf>,
    /// Reusable payload buffer; grows to the largest frame seen, never
    /// shrinks.
    scratch: Vec<u8>,
    sequence: u64,
}

impl FrameReceiver {
    pub fn new(
        slot: Arc<FrameSlot>,
        stats: Arc<StatsWindow>,
        snapshot_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            slot,
            stats,
            snapshot_dir,
            scratch: Vec::new(),
            sequence: 0,
        }
    }

    /// Parse frames from `stream` until the producer disconnects, errors,
    /// or the listener shuts this connection down in favor of a newer one.
    pub fn run(mut self, mut stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".into());
        info!("Producer connected from {}", peer);

        let mut header_bytes = [0u8; FRAME_HEADER_LEN];
        loop {
            if let Err(e) = stream.read_exact(&mut header_bytes) {
                debug!("Producer {} header read ended: {}", peer, e);
                break;
            }

            let header = FrameHeader::parse(&header_bytes);
            if let Err(e) = header.validate() {
                // Best-effort resync: reject before allocating anything
                // and try the next 8 bytes as a fresh header.
                warn!("Discarding frame from {}: {}", peer, e);
                continue;
            }

            let payload_len = header.payload_len();
            if self.scratch.len() < payload_len {
                self.scratch.resize(payload_len, 0);
            }
            if let Err(e) = stream.read_exact(&mut self.scratch[..payload_len]) {
                debug!("Producer {} disconnected mid-frame: {}", peer, e);
                break;
            }

            let frame = match Frame::from_payload(
                header,
                self.scratch[..payload_len].to_vec(),
                self.sequence,
            ) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Dropping frame from {}: {}", peer, e);
                    continue;
                }
            };
            self.sequence += 1;

            if frame.sequence == 0 {
                self.snapshot_first_frame(&frame);
            }

            self.slot.publish(frame);
            self.stats.record_received();
            self.stats.maybe_log();
        }

        info!("Producer {} gone after {} frames", peer, self.sequence);
    }

    /// Debugging aid: persist the first frame of a connection as PNG.
    /// Failures are logged and ignored; correctness never depends on this.
    fn snapshot_first_frame(&self, frame: &Frame) {
        let Some(dir) = &self.snapshot_dir else {
            return;
        };
        match write_snapshot(dir, frame) {
            Ok(path) => info!("First frame snapshot: {}", path.display()),
            Err(e) => warn!("First frame snapshot failed: {}", e),
        }
    }
}

fn write_snapshot(dir: &Path, frame: &Frame) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("first-frame-{}x{}.png", frame.width, frame.height));
    image::save_buffer(
        &path,
        frame.pixels(),
        frame.width,
        frame.height,
        image::ExtendedColorType::Rgba8,
    )
    .map_err(|e| Error::Snapshot(e.to_string()))?;
    Ok(path)
}
