//! In-memory RGB565 framebuffer.

/// Row-major RGB565 framebuffer over a caller-owned slice.
///
/// Pixels are stored as native `u16` values. [`FrameBuffer::blit`] takes
/// big-endian wire bytes, the order the panel expects after `RAMWR`;
/// [`FrameBuffer::blit_with`] takes any word decoder.
pub struct FrameBuffer<'a> {
    pixels: &'a mut [u16],
    width: u16,
    height: u16,
}

impl<'a> FrameBuffer<'a> {
    /// Wraps `pixels` as a `width x height` buffer.
    ///
    /// Returns `None` when the slice is smaller than the area.
    pub fn new(pixels: &'a mut [u16], width: u16, height: u16) -> Option<Self> {
        if pixels.len() < width as usize * height as usize {
            return None;
        }

        Some(Self {
            pixels,
            width,
            height,
        })
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub const fn height(&self) -> u16 {
        self.height
    }

    pub fn pixels(&self) -> &[u16] {
        &self.pixels[..self.width as usize * self.height as usize]
    }

    /// Sets a pixel.
    ///
    /// Returns `true` when pixel is in bounds, `false` otherwise.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: u16) -> bool {
        if x >= self.width as usize || y >= self.height as usize {
            return false;
        }

        self.pixels[y * self.width as usize + x] = color;
        true
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u16> {
        if x >= self.width as usize || y >= self.height as usize {
            return None;
        }

        Some(self.pixels[y * self.width as usize + x])
    }

    /// Copies a `width x height` block of big-endian RGB565 bytes with its
    /// top-left corner at `(x, y)`, dropping whatever falls outside.
    ///
    /// Returns the number of pixels written.
    pub fn blit(&mut self, x: i32, y: i32, width: usize, height: usize, data: &[u8]) -> usize {
        self.blit_with(x, y, width, height, data, u16::from_be_bytes)
    }

    /// [`FrameBuffer::blit`] with `decode` turning each byte pair into a pixel.
    pub fn blit_with<D>(
        &mut self,
        x: i32,
        y: i32,
        width: usize,
        height: usize,
        data: &[u8],
        decode: D,
    ) -> usize
    where
        D: Fn([u8; 2]) -> u16,
    {
        let rows = height.min(data.len() / 2 / width.max(1));
        let fb_w = self.width as i64;
        let fb_h = self.height as i64;

        let x_start = (x as i64).max(0);
        let x_end = (x as i64 + width as i64).min(fb_w);
        if x_start >= x_end {
            return 0;
        }
        let skip_cols = (x_start - x as i64) as usize;
        let cols = (x_end - x_start) as usize;

        let mut written = 0usize;
        for row in 0..rows {
            let dst_y = y as i64 + row as i64;
            if dst_y < 0 {
                continue;
            }
            if dst_y >= fb_h {
                break;
            }

            let src = (row * width + skip_cols) * 2;
            let dst = dst_y as usize * self.width as usize + x_start as usize;
            for (out, px) in self.pixels[dst..dst + cols]
                .iter_mut()
                .zip(data[src..src + cols * 2].chunks_exact(2))
            {
                *out = decode([px[0], px[1]]);
            }
            written += cols;
        }

        written
    }
}
