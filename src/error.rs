use thiserror::Error;

use crate::scene::SceneRef;

/// I/O errors that can occur when opening or reading the image source
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// The path does not exist or cannot be opened
    #[error("Cannot open {path}: {message}")]
    Open { path: String, message: String },

    /// Read or seek failure on an already opened stream
    #[error("Read error: {0}")]
    Read(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        IoError::Read(err.to_string())
    }
}

/// Errors raised by the wrapped TIFF decoder or by format checks
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// The decoder rejected the file structure
    #[error("TIFF error: {0}")]
    Tiff(String),

    /// File format is not supported by this reader
    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },
}

impl From<tiff::TiffError> for FormatError {
    fn from(err: tiff::TiffError) -> Self {
        match err {
            tiff::TiffError::IoError(e) => FormatError::Io(IoError::from(e)),
            tiff::TiffError::FormatError(e) => FormatError::UnsupportedFormat {
                reason: e.to_string(),
            },
            other => FormatError::Tiff(other.to_string()),
        }
    }
}

/// Non-fatal metadata problems; callers may still read pixel data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetadataError {
    /// A tag needed for a metadata field is absent
    #[error("Missing tag: {0}")]
    MissingTag(&'static str),

    /// A tag is present but cannot be interpreted
    #[error("Invalid value for {tag}: {message}")]
    InvalidValue { tag: &'static str, message: String },

    /// The unit string or code is not a known length unit
    #[error("Unknown resolution unit: {0}")]
    UnknownUnit(String),

    /// The directory walk stopped before the end of the file
    #[error("Page walk stopped after {pages} page(s): {message}")]
    TruncatedWalk { pages: usize, message: String },
}

/// Errors surfaced by the reader handle
#[derive(Debug, Clone, Error)]
pub enum ReaderError {
    /// File unreadable or not a supported format; aborts the open call
    #[error("Failed to open {path}: {source}")]
    OpenFailure {
        path: String,
        #[source]
        source: FormatError,
    },

    /// Partial metadata; the handle is still usable
    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(#[from] MetadataError),

    /// Requested index exceeds the declared size of a dimension
    #[error("Index out of range for dimension {dim}: requested {requested}, size is {size}")]
    IndexOutOfRange {
        dim: char,
        requested: String,
        size: usize,
    },

    /// Scene id or index not present in the file
    #[error("Unknown scene: {requested} (file has {available} scene(s))")]
    UnknownScene { requested: SceneRef, available: usize },

    /// Dimension order string is malformed
    #[error("Invalid dimensions {dims:?}: {message}")]
    InvalidDimensions { dims: String, message: String },

    /// Arguments disagree with each other or with the file
    #[error("Conflicting arguments: {0}")]
    ConflictingArguments(String),

    /// The decoder failed while reading pixel data
    #[error("Decode error: {0}")]
    Decode(#[from] FormatError),
}

impl ReaderError {
    pub(crate) fn open_failure(path: impl Into<String>, source: impl Into<FormatError>) -> Self {
        ReaderError::OpenFailure {
            path: path.into(),
            source: source.into(),
        }
    }
}
