//! Pixel writer boundary.

/// Inclusive display-space rectangle.
///
/// Coordinates are signed: a negative placement moves part of the image off
/// the top or left edge and the writer is expected to clip.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Window {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Window {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub const fn width(&self) -> usize {
        if self.x1 < self.x0 {
            0
        } else {
            (self.x1 - self.x0) as usize + 1
        }
    }

    pub const fn height(&self) -> usize {
        if self.y1 < self.y0 {
            0
        } else {
            (self.y1 - self.y0) as usize + 1
        }
    }

    pub const fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }
}

/// Sink for finished bands.
///
/// `data` holds `window.pixel_count()` RGB565 words, two bytes each, row-major.
/// It is only valid for the duration of the call.
pub trait PixelWriter {
    fn write_pixels(&mut self, window: Window, data: &[u8]);
}

impl<F> PixelWriter for F
where
    F: FnMut(Window, &[u8]),
{
    fn write_pixels(&mut self, window: Window, data: &[u8]) {
        self(window, data)
    }
}
