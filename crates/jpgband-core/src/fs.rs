//! File access used by file-backed image sources.

use core::{convert::Infallible, fmt};

use embedded_io::{ErrorType, Read, Seek, SeekFrom};

/// Minimal file system: size lookup and read-only open.
///
/// Closing is dropping the returned handle.
pub trait FileSystem {
    type File: Read + Seek;
    type Error: fmt::Debug;

    /// Returns the file size in bytes.
    fn stat(&mut self, path: &str) -> Result<u64, Self::Error>;

    fn open(&mut self, path: &str) -> Result<Self::File, Self::Error>;
}

/// File system for builds that only decode from memory.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFileSystem;

/// Error returned by every [`NoFileSystem`] call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NoFileSystemError;

/// Uninhabited handle type of [`NoFileSystem`].
#[derive(Debug)]
pub enum NoFile {}

impl ErrorType for NoFile {
    type Error = Infallible;
}

impl Read for NoFile {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> {
        match *self {}
    }
}

impl Seek for NoFile {
    fn seek(&mut self, _pos: SeekFrom) -> Result<u64, Self::Error> {
        match *self {}
    }
}

impl FileSystem for NoFileSystem {
    type File = NoFile;
    type Error = NoFileSystemError;

    fn stat(&mut self, _path: &str) -> Result<u64, Self::Error> {
        Err(NoFileSystemError)
    }

    fn open(&mut self, _path: &str) -> Result<Self::File, Self::Error> {
        Err(NoFileSystemError)
    }
}

#[cfg(feature = "std")]
pub use std_fs::{StdFile, StdFileSystem};

#[cfg(feature = "std")]
mod std_fs {
    use std::io::{Read as _, Seek as _};

    use embedded_io::{ErrorType, Read, Seek, SeekFrom};

    use super::FileSystem;

    /// Host file system backed by `std::fs`.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct StdFileSystem;

    /// Read-only `std::fs::File` exposed through `embedded-io`.
    #[derive(Debug)]
    pub struct StdFile(std::fs::File);

    impl ErrorType for StdFile {
        type Error = std::io::Error;
    }

    impl Read for StdFile {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            self.0.read(buf)
        }
    }

    impl Seek for StdFile {
        fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
            self.0.seek(pos.into())
        }
    }

    impl FileSystem for StdFileSystem {
        type File = StdFile;
        type Error = std::io::Error;

        fn stat(&mut self, path: &str) -> Result<u64, Self::Error> {
            std::fs::metadata(path).map(|meta| meta.len())
        }

        fn open(&mut self, path: &str) -> Result<Self::File, Self::Error> {
            std::fs::File::open(path).map(StdFile)
        }
    }

}
