#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! Band-streaming RGB565 output engine for tiny callback-driven JPEG decoders.
//!
//! The decoder pulls compressed bytes through [`decoder::JpegInput`] and pushes
//! RGB888 blocks through [`decoder::BlockSink`]. [`band::BandAccumulator`]
//! assembles those blocks into full-width bands and hands each finished band to
//! a [`writer::PixelWriter`].

extern crate alloc;

pub mod band;
pub mod decoder;
pub mod error;
pub mod fs;
pub mod input;
pub mod rgb565;
pub mod session;
pub mod writer;

pub use decoder::{BlockRect, BlockSink, Decompressor, ImageHeader, JdrStatus, JpegInput, Scale};
pub use error::{BufferKind, DecodeError, SourceStage};
pub use rgb565::{ByteOrder, to_rgb565};
pub use session::{DecodeReport, ImageSource, JpegRenderer, Placement, RendererConfig};
pub use writer::{PixelWriter, Window};
