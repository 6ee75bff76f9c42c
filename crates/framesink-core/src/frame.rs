//! Immutable frame representation
//!
//! A [`Frame`] is one complete RGBA8 image as delivered by the producer.
//! Pixels are stored behind an `Arc` so handing the frame from the receiver
//! to the presenter is a pointer move, never a pixel copy.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::protocol::FrameHeader;

/// One complete RGBA8 frame received from the producer.
///
/// Immutable once constructed: the receiver builds it from the wire payload
/// and publishes it; whoever takes it out of the slot owns the only live
/// reference.
#[derive(Clone)]
pub struct Frame {
    pixels: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Per-connection sequence number assigned by the receiver
    pub sequence: u64,
    /// Receive timestamp in microseconds since the epoch
    pub timestamp_us: u64,
}

impl Frame {
    /// Build a frame from a validated header and its wire payload.
    ///
    /// Fails if the payload length does not match `width * height * 4`.
    pub fn from_payload(header: FrameHeader, pixels: Vec<u8>, sequence: u64) -> Result<Self> {
        let expected = header.payload_len();
        if pixels.len() != expected {
            return Err(Error::PayloadMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        let timestamp_us = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);

        Ok(Self {
            pixels: Arc::new(pixels),
            width: header.width,
            height: header.height,
            sequence,
            timestamp_us,
        })
    }

    /// Raw RGBA8 pixel data, row-major, unpadded.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(width: u32, height: u32) -> FrameHeader {
        FrameHeader { width, height }
    }

    #[test]
    fn test_frame_from_payload() {
        let frame = Frame::from_payload(header(2, 2), vec![7u8; 16], 3).unwrap();
        assert_eq!(frame.width, 2);
        assert_eq!(frame.height, 2);
        assert_eq!(frame.sequence, 3);
        assert_eq!(frame.stride(), 8);
        assert!(frame.pixels().iter().all(|&b| b == 7));
    }

    #[test]
    fn test_frame_rejects_short_payload() {
        let err = Frame::from_payload(header(2, 2), vec![0u8; 15], 0).unwrap_err();
        assert!(matches!(
            err,
            Error::PayloadMismatch {
                expected: 16,
                actual: 15
            }
        ));
    }
}
