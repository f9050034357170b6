//! Pixel writers that put finished bands on a panel or into a framebuffer.

use embedded_hal::{digital::OutputPin, spi::SpiDevice};
use jpgband_core::{ByteOrder, PixelWriter, Window};
use log::warn;
use rgb565_panel::{FrameBuffer, Rgb565Panel};

const BYTES_PER_PIXEL: usize = 2;

/// Part of a window that lands on a `width x height` surface.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Clipped {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
    /// Leading source columns cut off the left edge.
    pub skip_cols: usize,
    /// Leading source rows cut off the top edge.
    pub skip_rows: usize,
}

impl Clipped {
    pub const fn is_whole(&self, window: &Window) -> bool {
        self.skip_cols == 0
            && self.skip_rows == 0
            && self.x1 as i32 == window.x1
            && self.y1 as i32 == window.y1
    }
}

/// Intersects `window` with `(0, 0)..(width, height)`.
pub fn clip(window: Window, width: u16, height: u16) -> Option<Clipped> {
    if width == 0 || height == 0 || window.x1 < window.x0 || window.y1 < window.y0 {
        return None;
    }

    let x0 = window.x0.max(0);
    let y0 = window.y0.max(0);
    let x1 = window.x1.min(width as i32 - 1);
    let y1 = window.y1.min(height as i32 - 1);
    if x0 > x1 || y0 > y1 {
        return None;
    }

    Some(Clipped {
        x0: x0 as u16,
        y0: y0 as u16,
        x1: x1 as u16,
        y1: y1 as u16,
        skip_cols: (x0 - window.x0) as usize,
        skip_rows: (y0 - window.y0) as usize,
    })
}

/// Streams bands straight to the panel over SPI.
///
/// Bands fully on screen go out as one `RAMWR` burst; clipped bands are sent
/// row by row. Band bytes are forwarded untouched, so the renderer must use
/// [`ByteOrder::BigEndian`], the panel's wire order.
pub struct PanelSink<'a, SPI, DC> {
    panel: &'a mut Rgb565Panel<SPI, DC>,
    failures: u32,
}

impl<'a, SPI, DC> PanelSink<'a, SPI, DC>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
{
    pub fn new(panel: &'a mut Rgb565Panel<SPI, DC>) -> Self {
        Self { panel, failures: 0 }
    }

    /// Panel writes that failed since creation.
    pub const fn failures(&self) -> u32 {
        self.failures
    }
}

impl<SPI, DC> PixelWriter for PanelSink<'_, SPI, DC>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
{
    fn write_pixels(&mut self, window: Window, data: &[u8]) {
        let config = self.panel.config();
        let Some(visible) = clip(window, config.width, config.height) else {
            return;
        };

        if visible.is_whole(&window) {
            if let Err(err) =
                self.panel
                    .write_window(visible.x0, visible.y0, visible.x1, visible.y1, data)
            {
                warn!("panel: band write failed err={:?}", err);
                self.failures = self.failures.saturating_add(1);
            }
            return;
        }

        let stride = window.width() * BYTES_PER_PIXEL;
        let row_bytes = (visible.x1 - visible.x0 + 1) as usize * BYTES_PER_PIXEL;
        for (i, y) in (visible.y0..=visible.y1).enumerate() {
            let start = (visible.skip_rows + i) * stride + visible.skip_cols * BYTES_PER_PIXEL;
            let Some(row) = data.get(start..start + row_bytes) else {
                warn!("panel: band data short len={} need={}", data.len(), start + row_bytes);
                self.failures = self.failures.saturating_add(1);
                return;
            };
            if let Err(err) = self.panel.write_window(visible.x0, y, visible.x1, y, row) {
                warn!("panel: row write failed y={} err={:?}", y, err);
                self.failures = self.failures.saturating_add(1);
                return;
            }
        }
    }
}

/// Copies bands into an in-memory framebuffer.
pub struct FrameSink<'a> {
    frame: FrameBuffer<'a>,
    byte_order: ByteOrder,
    pixels_written: usize,
}

impl<'a> FrameSink<'a> {
    /// `byte_order` must match the renderer's [`jpgband_core::RendererConfig`].
    pub fn new(frame: FrameBuffer<'a>, byte_order: ByteOrder) -> Self {
        Self {
            frame,
            byte_order,
            pixels_written: 0,
        }
    }

    /// Pixels that landed inside the framebuffer.
    pub const fn pixels_written(&self) -> usize {
        self.pixels_written
    }

    pub fn frame(&self) -> &FrameBuffer<'a> {
        &self.frame
    }

    pub fn into_inner(self) -> FrameBuffer<'a> {
        self.frame
    }
}

impl PixelWriter for FrameSink<'_> {
    fn write_pixels(&mut self, window: Window, data: &[u8]) {
        let order = self.byte_order;
        let written = self.frame.blit_with(
            window.x0,
            window.y0,
            window.width(),
            window.height(),
            data,
            |word| order.decode(word),
        );
        self.pixels_written = self.pixels_written.saturating_add(written);
    }
}
