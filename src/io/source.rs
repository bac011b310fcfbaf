use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::IoError;

/// Where an image comes from: a file on disk or bytes already in memory.
///
/// Opening a source yields a [`SourceStream`] that the reader owns for the
/// lifetime of the handle. Dropping the stream closes the file.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Bytes),
}

impl ImageSource {
    pub fn path(path: impl AsRef<Path>) -> Self {
        ImageSource::Path(path.as_ref().to_path_buf())
    }

    pub fn bytes(data: impl Into<Bytes>) -> Self {
        ImageSource::Bytes(data.into())
    }

    /// Identifier for logging and error messages.
    pub fn identifier(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes(data) => format!("memory://{} bytes", data.len()),
        }
    }

    /// File name component, if the source is a path.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            ImageSource::Path(path) => path.file_name().and_then(|n| n.to_str()),
            ImageSource::Bytes(_) => None,
        }
    }

    /// Open a fresh stream positioned at the start of the data.
    pub fn open(&self) -> Result<SourceStream, IoError> {
        match self {
            ImageSource::Path(path) => {
                let file = File::open(path).map_err(|e| IoError::Open {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                Ok(SourceStream::File(BufReader::new(file)))
            }
            ImageSource::Bytes(data) => Ok(SourceStream::Memory(Cursor::new(data.clone()))),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<Bytes> for ImageSource {
    fn from(data: Bytes) -> Self {
        ImageSource::Bytes(data)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(data: Vec<u8>) -> Self {
        ImageSource::Bytes(Bytes::from(data))
    }
}

/// An owned, seekable byte stream handed to the TIFF decoder.
#[derive(Debug)]
pub enum SourceStream {
    File(BufReader<File>),
    Memory(Cursor<Bytes>),
}

impl SourceStream {
    /// Read up to `len` leading bytes and rewind to the start.
    ///
    /// Returns fewer bytes when the stream is shorter than `len`.
    pub fn read_prefix(&mut self, len: usize) -> Result<Vec<u8>, IoError> {
        self.seek(SeekFrom::Start(0))?;
        let mut prefix = Vec::with_capacity(len);
        self.by_ref().take(len as u64).read_to_end(&mut prefix)?;
        self.seek(SeekFrom::Start(0))?;
        Ok(prefix)
    }
}

impl Read for SourceStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            SourceStream::File(r) => r.read(buf),
            SourceStream::Memory(r) => r.read(buf),
        }
    }
}

impl Seek for SourceStream {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            SourceStream::File(r) => r.seek(pos),
            SourceStream::Memory(r) => r.seek(pos),
        }
    }
}

// =============================================================================
// Endian Helper Functions
// =============================================================================

/// Read a little-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Read a big-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_be(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}
