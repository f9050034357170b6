//! Compressed-byte adapters feeding the decompressor.

use embedded_io::{Error as _, ErrorKind, Read, Seek, SeekFrom};
use log::warn;

use crate::decoder::JpegInput;

/// Bytes a buffer source may serve past its declared end.
pub const BUFFER_PAD_BYTES: usize = 2;

/// Served in the pad slack so an over-reading decoder sees a clean EOI marker.
const PAD_FILL: [u8; BUFFER_PAD_BYTES] = [0xFF, 0xD9];

/// In-memory image holding the complete compressed stream.
#[derive(Clone, Debug)]
pub struct BufferInput<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> BufferInput<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    /// Current read position; never exceeds [`BufferInput::limit`].
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Furthest position the cursor may reach: buffer size plus pad slack.
    pub const fn limit(&self) -> usize {
        self.data.len() + BUFFER_PAD_BYTES
    }

    fn claim(&self, len: usize) -> usize {
        len.min(self.limit().saturating_sub(self.cursor))
    }
}

impl JpegInput for BufferInput<'_> {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let len = self.claim(buf.len());
        let start = self.cursor;
        let end = start + len;
        let size = self.data.len();

        let data_end = end.min(size);
        if start < data_end {
            buf[..data_end - start].copy_from_slice(&self.data[start..data_end]);
        }
        for pos in start.max(size)..end {
            buf[pos - start] = PAD_FILL[pos - size];
        }

        self.cursor = end;
        len
    }

    fn skip(&mut self, len: usize) -> usize {
        let len = self.claim(len);
        self.cursor += len;
        len
    }
}

/// Open file handle read sequentially; skips are relative seeks.
#[derive(Debug)]
pub struct FileInput<F> {
    file: F,
    io_failed: bool,
}

impl<F> FileInput<F>
where
    F: Read + Seek,
{
    pub const fn new(file: F) -> Self {
        Self {
            file,
            io_failed: false,
        }
    }

    /// Whether a read or seek failed at the device level.
    pub const fn io_failed(&self) -> bool {
        self.io_failed
    }

    pub fn into_inner(self) -> F {
        self.file
    }
}

impl<F> JpegInput for FileInput<F>
where
    F: Read + Seek,
{
    fn read(&mut self, buf: &mut [u8]) -> usize {
        if self.io_failed {
            return 0;
        }

        let mut copied = 0usize;
        while copied < buf.len() {
            match self.file.read(&mut buf[copied..]) {
                Ok(0) => break,
                Ok(read_now) => copied = copied.saturating_add(read_now),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!("jpeg: file read failed kind={:?}", err.kind());
                    self.io_failed = true;
                    break;
                }
            }
        }
        copied
    }

    fn skip(&mut self, len: usize) -> usize {
        if self.io_failed {
            return 0;
        }
        let Ok(offset) = i64::try_from(len) else {
            return 0;
        };

        match self.file.seek(SeekFrom::Current(offset)) {
            Ok(_) => len,
            Err(err) => {
                warn!("jpeg: file seek failed len={} kind={:?}", len, err.kind());
                self.io_failed = true;
                0
            }
        }
    }
}

/// Input of one session: either an open file or a memory buffer.
#[derive(Debug)]
pub enum InputSource<'a, F> {
    File(FileInput<F>),
    Buffer(BufferInput<'a>),
}

impl<F> InputSource<'_, F>
where
    F: Read + Seek,
{
    pub fn io_failed(&self) -> bool {
        match self {
            Self::File(file) => file.io_failed(),
            Self::Buffer(_) => false,
        }
    }
}

impl<F> JpegInput for InputSource<'_, F>
where
    F: Read + Seek,
{
    fn read(&mut self, buf: &mut [u8]) -> usize {
        match self {
            Self::File(file) => file.read(buf),
            Self::Buffer(buffer) => buffer.read(buf),
        }
    }

    fn skip(&mut self, len: usize) -> usize {
        match self {
            Self::File(file) => file.skip(len),
            Self::Buffer(buffer) => buffer.skip(len),
        }
    }
}
