//! Output surface abstraction
//!
//! The platform owning the actual window/display implements
//! [`OutputSurface`]; the presenter only ever sees these traits. One tick
//! is: `begin_frame`, clear, one scaled blit, `present`.

use framesink_core::{Frame, Result};

/// An opaque handle to the host's displayable surface.
///
/// Implementations must tolerate `begin_frame` failing at any time (e.g.
/// the platform invalidated the backing store); the presenter logs and
/// skips the tick.
pub trait OutputSurface: Send + Sync {
    /// Current pixel dimensions of the surface.
    fn dimensions(&self) -> (u32, u32);

    /// Lock the surface for drawing one frame.
    fn begin_frame(&self) -> Result<Box<dyn DrawTarget + '_>>;
}

/// A locked, writable draw target for exactly one presented frame.
pub trait DrawTarget {
    /// Fill the whole target with a solid RGBA color.
    fn clear(&mut self, color: [u8; 4]);

    /// Draw `image` scaled and translated by `fit`.
    fn blit_scaled(&mut self, image: &ScratchImage, fit: &FitTransform) -> Result<()>;

    /// Unlock and present the drawn frame.
    fn present(self: Box<Self>) -> Result<()>;
}

/// Aspect-preserving fit of a frame into a surface.
///
/// `scale = min(surface_w / frame_w, surface_h / frame_h)`, with the scaled
/// frame centered on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl FitTransform {
    /// Compute the fit of `frame` (w, h) into `surface` (w, h).
    pub fn compute(surface: (u32, u32), frame: (u32, u32)) -> Self {
        let (sw, sh) = (surface.0 as f32, surface.1 as f32);
        let (fw, fh) = (frame.0 as f32, frame.1 as f32);
        let scale = (sw / fw).min(sh / fh);
        Self {
            scale,
            offset_x: (sw - fw * scale) / 2.0,
            offset_y: (sh - fh * scale) / 2.0,
        }
    }

    /// Size of the scaled frame on the surface, in whole pixels.
    pub fn fitted_size(&self, frame: (u32, u32)) -> (u32, u32) {
        (
            (frame.0 as f32 * self.scale).round() as u32,
            (frame.1 as f32 * self.scale).round() as u32,
        )
    }
}

/// Reusable intermediate image, keyed by the last-seen frame dimensions.
///
/// Reallocated only when the incoming frame's dimensions change; the
/// common case of a steady stream costs one memcpy and no allocation.
pub struct ScratchImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ScratchImage {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 pixel bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Copy a frame in, reallocating only if its dimensions differ from
    /// the cached ones. Returns true when a reallocation happened.
    pub fn load(&mut self, frame: &Frame) -> bool {
        let reallocated = self.width != frame.width || self.height != frame.height;
        if reallocated {
            self.width = frame.width;
            self.height = frame.height;
            self.pixels = vec![0u8; frame.width as usize * frame.height as usize * 4];
        }
        self.pixels.copy_from_slice(frame.pixels());
        reallocated
    }
}

impl Default for ScratchImage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framesink_core::{Frame, FrameHeader};

    #[test]
    fn test_scale_to_fit_arithmetic() {
        // 800x600 into 1920x1080: limited by height
        let fit = FitTransform::compute((1920, 1080), (800, 600));
        assert_eq!(fit.scale, 1.8);
        assert_eq!(fit.offset_x, 240.0);
        assert_eq!(fit.offset_y, 0.0);
        assert_eq!(fit.fitted_size((800, 600)), (1440, 1080));
    }

    #[test]
    fn test_fit_letterboxes_wide_frame() {
        let fit = FitTransform::compute((1000, 1000), (2000, 1000));
        assert_eq!(fit.scale, 0.5);
        assert_eq!(fit.offset_x, 0.0);
        assert_eq!(fit.offset_y, 250.0);
        assert_eq!(fit.fitted_size((2000, 1000)), (1000, 500));
    }

    #[test]
    fn test_fit_identity() {
        let fit = FitTransform::compute((640, 480), (640, 480));
        assert_eq!(fit.scale, 1.0);
        assert_eq!(fit.offset_x, 0.0);
        assert_eq!(fit.offset_y, 0.0);
    }

    #[test]
    fn test_scratch_reuse_and_reallocation() {
        let mut scratch = ScratchImage::new();

        let first = Frame::from_payload(
            FrameHeader {
                width: 2,
                height: 2,
            },
            vec![1u8; 16],
            0,
        )
        .unwrap();
        assert!(scratch.load(&first));

        // Same dimensions: buffer is reused
        let second = Frame::from_payload(
            FrameHeader {
                width: 2,
                height: 2,
            },
            vec![2u8; 16],
            1,
        )
        .unwrap();
        assert!(!scratch.load(&second));
        assert!(scratch.pixels().iter().all(|&b| b == 2));

        // New dimensions: buffer is replaced
        let third = Frame::from_payload(
            FrameHeader {
                width: 1,
                height: 3,
            },
            vec![3u8; 12],
            2,
        )
        .unwrap();
        assert!(scratch.load(&third));
        assert_eq!(scratch.pixels().len(), 12);
    }
}
