//! Wire protocol for the frame socket
//!
//! The producer sends frames back to back with no delimiter beyond the
//! implicit length: an 8-byte header of two little-endian u32 values
//! (width, height) followed by `width * height * 4` bytes of RGBA8 pixel
//! data, row-major, no row padding.

use crate::error::{Error, Result};

/// Default TCP port the producer connects to.
pub const DEFAULT_PORT: u16 = 19850;

/// Size of the per-frame header in bytes.
pub const FRAME_HEADER_LEN: usize = 8;

/// Upper bound on either frame axis. A header declaring more is rejected
/// before any payload allocation happens.
pub const MAX_DIMENSION: u32 = 4096;

/// Decoded per-frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub width: u32,
    pub height: u32,
}

impl FrameHeader {
    /// Decode a header from its 8-byte wire form.
    pub fn parse(bytes: &[u8; FRAME_HEADER_LEN]) -> Self {
        Self {
            width: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            height: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// Encode the header into its wire form. Used by producers and tests.
    pub fn encode(&self) -> [u8; FRAME_HEADER_LEN] {
        let mut out = [0u8; FRAME_HEADER_LEN];
        out[..4].copy_from_slice(&self.width.to_le_bytes());
        out[4..].copy_from_slice(&self.height.to_le_bytes());
        out
    }

    /// Check both axes against `1..=MAX_DIMENSION`.
    pub fn validate(&self) -> Result<()> {
        let in_bounds = |v: u32| (1..=MAX_DIMENSION).contains(&v);
        if in_bounds(self.width) && in_bounds(self.height) {
            Ok(())
        } else {
            Err(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
                max: MAX_DIMENSION,
            })
        }
    }

    /// Number of payload bytes that follow this header.
    pub fn payload_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}
