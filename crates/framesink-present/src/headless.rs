//! Software output surface
//!
//! An in-memory RGBA8 surface with a nearest-neighbor blit. Backs the demo
//! binary when no real display is wired up, and gives tests a surface whose
//! pixels can be inspected.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use framesink_core::Result;

use crate::surface::{DrawTarget, FitTransform, OutputSurface, ScratchImage};

/// CPU-only [`OutputSurface`] over a plain pixel buffer.
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    pixels: Mutex<Vec<u8>>,
    presents: AtomicU64,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: Mutex::new(vec![0u8; width as usize * height as usize * 4]),
            presents: AtomicU64::new(0),
        }
    }

    /// Number of frames presented so far.
    pub fn present_count(&self) -> u64 {
        self.presents.load(Ordering::Relaxed)
    }

    /// RGBA value of one surface pixel.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let buf = self.lock_pixels();
        let at = (y as usize * self.width as usize + x as usize) * 4;
        [buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]
    }

    fn lock_pixels(&self) -> MutexGuard<'_, Vec<u8>> {
        self.pixels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutputSurface for HeadlessSurface {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn begin_frame(&self) -> Result<Box<dyn DrawTarget + '_>> {
        Ok(Box::new(HeadlessTarget {
            buf: self.lock_pixels(),
            width: self.width,
            height: self.height,
            presents: &self.presents,
        }))
    }
}

struct HeadlessTarget<'a> {
    buf: MutexGuard<'a, Vec<u8>>,
    width: u32,
    height: u32,
    presents: &'a AtomicU64,
}

impl DrawTarget for HeadlessTarget<'_> {
    fn clear(&mut self, color: [u8; 4]) {
        for px in self.buf.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    fn blit_scaled(&mut self, image: &ScratchImage, fit: &FitTransform) -> Result<()> {
        let (dest_w, dest_h) = fit.fitted_size((image.width(), image.height()));
        let offset_x = fit.offset_x.round() as u32;
        let offset_y = fit.offset_y.round() as u32;
        let src = image.pixels();
        let src_stride = image.width() as usize * 4;

        // Nearest-neighbor sampling at destination pixel centers
        for dy in 0..dest_h.min(self.height.saturating_sub(offset_y)) {
            let sy = (((dy as f32 + 0.5) / fit.scale) as u32).min(image.height() - 1);
            let src_row = &src[sy as usize * src_stride..][..src_stride];
            let dest_row_at = ((offset_y + dy) as usize * self.width as usize) * 4;

            for dx in 0..dest_w.min(self.width.saturating_sub(offset_x)) {
                let sx = (((dx as f32 + 0.5) / fit.scale) as u32).min(image.width() - 1);
                let dest_at = dest_row_at + (offset_x + dx) as usize * 4;
                self.buf[dest_at..dest_at + 4]
                    .copy_from_slice(&src_row[sx as usize * 4..][..4]);
            }
        }
        Ok(())
    }

    fn present(self: Box<Self>) -> Result<()> {
        self.presents.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
