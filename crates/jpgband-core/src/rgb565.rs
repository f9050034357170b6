//! RGB888 -> RGB565 pixel packing.

use embedded_graphics_core::pixelcolor::{IntoStorage, Rgb565};

/// Packs one RGB888 pixel as `RRRRRGGG_GGGBBBBB`.
///
/// The low 3 bits of red and blue and the low 2 bits of green are dropped.
#[inline]
pub fn to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    Rgb565::new(r >> 3, g >> 2, b >> 3).into_storage()
}

/// Byte order of the 16-bit words handed to the pixel writer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ByteOrder {
    /// High byte first. This is what SPI panels expect after `RAMWR`.
    #[default]
    BigEndian,
    /// Low byte first, for targets that push words straight from memory.
    LittleEndian,
}

impl ByteOrder {
    #[inline]
    pub const fn encode(self, value: u16) -> [u8; 2] {
        match self {
            Self::BigEndian => value.to_be_bytes(),
            Self::LittleEndian => value.to_le_bytes(),
        }
    }

    #[inline]
    pub const fn decode(self, bytes: [u8; 2]) -> u16 {
        match self {
            Self::BigEndian => u16::from_be_bytes(bytes),
            Self::LittleEndian => u16::from_le_bytes(bytes),
        }
    }
}
