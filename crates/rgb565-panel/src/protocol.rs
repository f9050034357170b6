//! MIPI-DCS command set shared by ST7789/ILI9341-class RGB565 panels.

/// Software reset.
pub const SWRESET: u8 = 0x01;
/// Sleep out.
pub const SLPOUT: u8 = 0x11;
/// Display on.
pub const DISPON: u8 = 0x29;
/// Column address set.
pub const CASET: u8 = 0x2A;
/// Row address set.
pub const RASET: u8 = 0x2B;
/// Memory write; pixel data follows.
pub const RAMWR: u8 = 0x2C;
/// Interface pixel format.
pub const COLMOD: u8 = 0x3A;

/// `COLMOD` argument selecting 16 bits per pixel.
pub const COLMOD_RGB565: u8 = 0x55;

/// Bytes per RGB565 pixel on the wire.
pub const BYTES_PER_PIXEL: usize = 2;

/// Start/end pair for `CASET`/`RASET`, big-endian.
///
/// Returns `None` when `end < start`.
#[inline]
pub fn build_address_packet(start: u16, end: u16) -> Option<[u8; 4]> {
    if end < start {
        return None;
    }

    let [s_hi, s_lo] = start.to_be_bytes();
    let [e_hi, e_lo] = end.to_be_bytes();
    Some([s_hi, s_lo, e_hi, e_lo])
}

/// Payload length in bytes for a `width x height` window.
#[inline]
pub fn window_bytes(width: u16, height: u16) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}
