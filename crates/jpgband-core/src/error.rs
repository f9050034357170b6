//! Decode session errors.

use core::fmt;

use crate::{decoder::JdrStatus, session::DecodeReport};

/// Which step of opening a file source failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceStage {
    Stat,
    Open,
}

/// Which session buffer could not be allocated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BufferKind {
    /// Decoder scratch pool.
    Work,
    /// RGB565 band buffer.
    Band,
}

/// Terminal failure of one decode session.
///
/// Every variant is also logged at the point of failure. A missing pixel
/// writer is not an error; see [`crate::DecodeReport::writer_missing`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// The image file could not be stat'ed or opened.
    SourceUnavailable(SourceStage),
    /// A session buffer could not be allocated.
    AllocationFailure(BufferKind),
    /// The decoder rejected the stream header.
    DecoderPrepare(JdrStatus),
    /// Decompression aborted mid-stream, including blocks rejected by the
    /// band accumulator (reported as [`JdrStatus::Interrupted`]).
    ///
    /// `partial` counts what reached the writer before the abort.
    DecoderRuntime {
        status: JdrStatus,
        partial: DecodeReport,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable(SourceStage::Stat) => f.write_str("image file not found"),
            Self::SourceUnavailable(SourceStage::Open) => {
                f.write_str("image file could not be opened")
            }
            Self::AllocationFailure(BufferKind::Work) => f.write_str("work buffer alloc failed"),
            Self::AllocationFailure(BufferKind::Band) => f.write_str("band buffer alloc failed"),
            Self::DecoderPrepare(status) => {
                write!(f, "jpeg prepare error {} ({})", status.code(), status.name())
            }
            Self::DecoderRuntime { status, .. } => {
                write!(f, "jpeg decompression error {} ({})", status.code(), status.name())
            }
        }
    }
}

impl core::error::Error for DecodeError {}
