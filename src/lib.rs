#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! Band-streaming JPEG rendering onto RGB565 displays.
//!
//! [`jpgband_core`] turns decoder blocks into full-width RGB565 bands;
//! [`rgb565_panel`] drives the display. This crate wires the two together
//! and, with `rom-tjpgd`, binds the decoder in ESP32 ROM.

#[cfg(feature = "rom-tjpgd")]
pub mod rom;
pub mod sink;

pub use jpgband_core::{
    BlockRect, BlockSink, BufferKind, ByteOrder, DecodeError, DecodeReport,
    Decompressor, ImageHeader, ImageSource, JdrStatus, JpegInput, JpegRenderer, PixelWriter,
    Placement, RendererConfig, Scale, SourceStage, Window, to_rgb565,
};
#[cfg(feature = "std")]
pub use jpgband_core::fs::StdFileSystem;
pub use rgb565_panel::{self as panel, FrameBuffer, Rgb565Panel};
pub use sink::{FrameSink, PanelSink};
