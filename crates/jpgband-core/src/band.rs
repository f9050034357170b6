//! Band accumulator: turns decoder blocks into full-width RGB565 bands.
//!
//! The decoder emits blocks (MCUs) left to right, top to bottom. A band starts
//! with the first block at column 0 and spans that block's rows; following
//! blocks of the same MCU row land beside it in the band buffer. Once the band
//! has received `band_width * band_height` pixels it is handed to the pixel
//! writer in one call.

use alloc::vec::Vec;

use log::{debug, warn};

use crate::{
    decoder::{BlockRect, BlockSink, ImageHeader},
    error::{BufferKind, DecodeError},
    rgb565::{ByteOrder, to_rgb565},
    writer::{PixelWriter, Window},
};

const BYTES_PER_PIXEL: usize = 2;
const RGB888_BYTES: usize = 3;

/// Why a block was refused.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockReject {
    /// Zero pixels, or more than the per-call cap.
    Size { pixels: usize },
    /// Pixel data shorter than the rectangle needs.
    ShortData { needed: usize, got: usize },
    /// Block does not continue the band in raster order, or does not fit the
    /// band buffer.
    OutOfRaster,
}

/// Fixed parameters of one accumulator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BandLayout {
    /// Scaled image size.
    pub image: ImageHeader,
    /// Band buffer height in image rows.
    pub band_lines: usize,
    /// Largest block accepted per callback, in pixels.
    pub max_block_pixels: usize,
    pub byte_order: ByteOrder,
    /// Display position of image pixel (0, 0).
    pub origin_x: i32,
    pub origin_y: i32,
}

pub struct BandAccumulator<'w> {
    layout: BandLayout,
    band: Vec<u8>,
    band_width: usize,
    writer: Option<&'w mut dyn PixelWriter>,
    band_start: usize,
    band_height: usize,
    band_remaining: usize,
    image_remaining: usize,
    bands_written: u32,
    writer_missing: bool,
    rejected: Option<BlockReject>,
}

impl<'w> BandAccumulator<'w> {
    /// Allocates a zeroed band buffer of `width * band_lines` pixels.
    pub fn allocate(
        layout: BandLayout,
        writer: Option<&'w mut dyn PixelWriter>,
    ) -> Result<Self, DecodeError> {
        let band_width = layout.image.width as usize;
        let Some(bytes) = band_width
            .checked_mul(layout.band_lines)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
        else {
            warn!("jpeg: band buffer size overflow width={}", band_width);
            return Err(DecodeError::AllocationFailure(BufferKind::Band));
        };

        let mut band = Vec::new();
        if band.try_reserve_exact(bytes).is_err() {
            warn!("jpeg: band buffer alloc failed bytes={}", bytes);
            return Err(DecodeError::AllocationFailure(BufferKind::Band));
        }
        band.resize(bytes, 0);

        Ok(Self {
            layout,
            band,
            band_width,
            writer,
            band_start: 0,
            band_height: 0,
            band_remaining: 0,
            image_remaining: layout.image.pixel_count(),
            bands_written: 0,
            writer_missing: false,
            rejected: None,
        })
    }

    /// Pixels of the image not yet flushed. Zero after a complete decode.
    pub const fn image_remaining(&self) -> usize {
        self.image_remaining
    }

    /// Bands handed to the writer.
    pub const fn bands_written(&self) -> u32 {
        self.bands_written
    }

    /// Whether a finished band had no writer to go to.
    pub const fn writer_missing(&self) -> bool {
        self.writer_missing
    }

    /// The block that stopped decoding, if any.
    pub const fn rejected(&self) -> Option<BlockReject> {
        self.rejected
    }

    pub const fn band_capacity_bytes(&self) -> usize {
        self.band.len()
    }

    fn reject(&mut self, rect: BlockRect, reason: BlockReject) -> bool {
        warn!(
            "jpeg: block rejected rect=({},{},{},{}) reason={:?}",
            rect.left, rect.top, rect.right, rect.bottom, reason
        );
        self.rejected = Some(reason);
        false
    }

    fn flush(&mut self) {
        let pixels = self.band_width * self.band_height;
        let x0 = self.layout.origin_x;
        let y0 = self.layout.origin_y.saturating_add(self.band_start as i32);
        let window = Window::new(
            x0,
            y0,
            x0.saturating_add(self.band_width as i32 - 1),
            y0.saturating_add(self.band_height as i32 - 1),
        );

        match self.writer.as_deref_mut() {
            Some(writer) => {
                debug!(
                    "jpeg: band flush rows={}..{} window=({},{},{},{})",
                    self.band_start,
                    self.band_start + self.band_height,
                    window.x0,
                    window.y0,
                    window.x1,
                    window.y1
                );
                writer.write_pixels(window, &self.band[..pixels * BYTES_PER_PIXEL]);
                self.bands_written = self.bands_written.saturating_add(1);
            }
            None => {
                if !self.writer_missing {
                    warn!("jpeg: no pixel writer, band data dropped");
                }
                self.writer_missing = true;
            }
        }

        self.image_remaining = self.image_remaining.saturating_sub(pixels);
        self.band_remaining = 0;
    }
}

impl BlockSink for BandAccumulator<'_> {
    fn put_block(&mut self, rect: BlockRect, rgb: &[u8]) -> bool {
        let pixels = rect.pixel_count();
        if pixels == 0 || pixels > self.layout.max_block_pixels {
            return self.reject(rect, BlockReject::Size { pixels });
        }
        let needed = pixels * RGB888_BYTES;
        if rgb.len() < needed {
            return self.reject(
                rect,
                BlockReject::ShortData {
                    needed,
                    got: rgb.len(),
                },
            );
        }

        let left = rect.left as usize;
        let top = rect.top as usize;
        let width = rect.width();
        let height = rect.height();

        let starts_band = self.band_remaining == 0;
        let (band_start, band_height) = if starts_band {
            if left != 0 {
                return self.reject(rect, BlockReject::OutOfRaster);
            }
            (top, height)
        } else {
            (self.band_start, self.band_height)
        };

        if band_height > self.layout.band_lines
            || top < band_start
            || top + height > band_start + band_height
            || left + width > self.band_width
        {
            return self.reject(rect, BlockReject::OutOfRaster);
        }

        if starts_band {
            self.band_start = band_start;
            self.band_height = band_height;
            self.band_remaining = self.band_width * band_height;
        }

        let stride = self.band_width * BYTES_PER_PIXEL;
        let order = self.layout.byte_order;
        for (row, line) in rgb[..needed].chunks_exact(width * RGB888_BYTES).enumerate() {
            let offset = (top - band_start + row) * stride + left * BYTES_PER_PIXEL;
            let dest = &mut self.band[offset..offset + width * BYTES_PER_PIXEL];
            for (px, out) in line
                .chunks_exact(RGB888_BYTES)
                .zip(dest.chunks_exact_mut(BYTES_PER_PIXEL))
            {
                out.copy_from_slice(&order.encode(to_rgb565(px[0], px[1], px[2])));
            }
        }

        self.band_remaining = self.band_remaining.saturating_sub(pixels);
        if self.band_remaining == 0 {
            self.flush();
        }
        true
    }
}
