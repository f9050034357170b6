//! Seam between the banding engine and the external JPEG decompressor.
//!
//! The decompressor owns entropy decoding, IDCT and upsampling. It drives the
//! session through two capabilities: [`JpegInput`] for compressed bytes and
//! [`BlockSink`] for decoded RGB888 blocks.

use alloc::vec::Vec;

/// Compressed byte supply.
///
/// Both methods return the number of bytes actually obtained. A short or zero
/// count means end of stream or failure; implementations never report errors
/// any other way.
pub trait JpegInput {
    /// Fills `buf` with up to `buf.len()` bytes.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Discards up to `len` bytes.
    fn skip(&mut self, len: usize) -> usize;
}

/// Inclusive image-space rectangle of one decoded block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlockRect {
    pub left: u16,
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
}

impl BlockRect {
    pub const fn new(left: u16, top: u16, right: u16, bottom: u16) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn width(&self) -> usize {
        if self.right < self.left {
            0
        } else {
            (self.right - self.left) as usize + 1
        }
    }

    pub const fn height(&self) -> usize {
        if self.bottom < self.top {
            0
        } else {
            (self.bottom - self.top) as usize + 1
        }
    }

    pub const fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }
}

/// Receiver of decoded blocks, in raster order.
pub trait BlockSink {
    /// `rgb` holds `rect.pixel_count()` interleaved RGB888 pixels, row-major.
    ///
    /// Returns `false` to abort decompression.
    fn put_block(&mut self, rect: BlockRect, rgb: &[u8]) -> bool;
}

/// Image size reported by a successful prepare step.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ImageHeader {
    pub width: u16,
    pub height: u16,
}

impl ImageHeader {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Output size after downscaling.
    pub const fn scaled(self, scale: Scale) -> Self {
        Self {
            width: scale.apply(self.width),
            height: scale.apply(self.height),
        }
    }

    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Power-of-two output downscale.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Scale {
    #[default]
    Full = 0,
    Half = 1,
    Quarter = 2,
    Eighth = 3,
}

impl Scale {
    pub const MAX: Self = Self::Eighth;

    /// Maps ordinal `0..=3`; anything larger clamps to [`Scale::MAX`].
    pub const fn from_ordinal(ordinal: u8) -> Self {
        match ordinal {
            0 => Self::Full,
            1 => Self::Half,
            2 => Self::Quarter,
            _ => Self::Eighth,
        }
    }

    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    pub const fn denominator(self) -> u16 {
        1 << self.ordinal()
    }

    /// Rounds down; a dimension smaller than the denominator scales to 0,
    /// matching the decoder skipping blocks that round away.
    const fn apply(self, value: u16) -> u16 {
        value >> self.ordinal()
    }
}

impl From<u8> for Scale {
    fn from(ordinal: u8) -> Self {
        Self::from_ordinal(ordinal)
    }
}

/// Non-OK status codes of a TJpgDec-style decoder (`JRESULT`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JdrStatus {
    /// Interrupted by the output callback.
    Interrupted,
    /// Device error or wrong termination of the input stream.
    Input,
    /// Insufficient work area for the image.
    Memory1,
    /// Insufficient stream input buffer.
    Memory2,
    /// Parameter error.
    Parameter,
    /// Data format error, possibly a damaged file.
    Format1,
    /// Right format but not supported.
    Format2,
    /// Not supported JPEG standard (progressive and friends).
    Format3,
    /// Status code outside the known set.
    Unknown(i32),
}

impl JdrStatus {
    /// Decodes a raw `JRESULT`. `0` is success and yields `None`.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => None,
            1 => Some(Self::Interrupted),
            2 => Some(Self::Input),
            3 => Some(Self::Memory1),
            4 => Some(Self::Memory2),
            5 => Some(Self::Parameter),
            6 => Some(Self::Format1),
            7 => Some(Self::Format2),
            8 => Some(Self::Format3),
            other => Some(Self::Unknown(other)),
        }
    }

    pub const fn code(self) -> i32 {
        match self {
            Self::Interrupted => 1,
            Self::Input => 2,
            Self::Memory1 => 3,
            Self::Memory2 => 4,
            Self::Parameter => 5,
            Self::Format1 => 6,
            Self::Format2 => 7,
            Self::Format3 => 8,
            Self::Unknown(code) => code,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Interrupted => "intr",
            Self::Input => "inp",
            Self::Memory1 => "mem1",
            Self::Memory2 => "mem2",
            Self::Parameter => "par",
            Self::Format1 => "fmt1",
            Self::Format2 => "fmt2",
            Self::Format3 => "fmt3_progressive_or_unsupported",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Opaque scratch pool handed to the decompressor.
///
/// Backed by words so the pool is 4-byte aligned, as TJpgDec requires.
#[derive(Debug)]
pub struct WorkArea {
    words: Vec<u32>,
}

impl WorkArea {
    /// Allocates a zeroed pool of at least `bytes` bytes.
    ///
    /// Returns `None` when the allocation cannot be satisfied.
    pub fn allocate(bytes: usize) -> Option<Self> {
        let len = bytes.div_ceil(core::mem::size_of::<u32>());
        let mut words = Vec::new();
        words.try_reserve_exact(len).ok()?;
        words.resize(len, 0);
        Some(Self { words })
    }

    pub fn len_bytes(&self) -> usize {
        self.words.len() * core::mem::size_of::<u32>()
    }

    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    pub fn as_mut_ptr(&mut self) -> *mut u32 {
        self.words.as_mut_ptr()
    }
}

/// External decompressor driven by one decode session.
///
/// `prepare` parses headers and sets up state inside `work`; `decompress`
/// must be called with the same input and work area afterwards.
pub trait Decompressor {
    fn prepare<I: JpegInput>(
        &mut self,
        input: &mut I,
        work: &mut WorkArea,
    ) -> Result<ImageHeader, JdrStatus>;

    fn decompress<I: JpegInput, S: BlockSink>(
        &mut self,
        input: &mut I,
        work: &mut WorkArea,
        sink: &mut S,
        scale: Scale,
    ) -> Result<(), JdrStatus>;
}
