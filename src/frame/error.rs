use crate::matrix::MatrixError;
use crate::metadata::MetadataError;
use crate::store::StoreError;

/// Errors surfaced by frame operations
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Mutation of persisted state on a read-only frame
    #[error("Frame is read-only: {0}")]
    ReadOnly(String),

    /// A bulk update or matrix has the wrong number of entries
    #[error("Size mismatch: expected {expected}, found {found}")]
    SizeMismatch {
        /// Required count
        expected: usize,
        /// Supplied count
        found: usize,
    },

    /// A channel name is empty
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// A channel name would appear more than once
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// Column, keyword, attribute or store lookup miss
    #[error("Not found: {0}")]
    NotFound(String),

    /// Copy or migration destination is occupied
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Stored sections disagree with each other
    #[error("Schema inconsistency: {0}")]
    SchemaInconsistency(String),

    /// Operation not available for this backend or location
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Row or column selection past the frame extent
    #[error("Index out of bounds: {axis} {index} >= {len}")]
    IndexOutOfBounds {
        /// "row" or "column"
        axis: &'static str,
        /// Offending index
        index: usize,
        /// Extent of that axis
        len: usize,
    },

    /// Store failure without a frame-level meaning
    #[error("Store error: {0}")]
    Store(StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MetadataError> for FrameError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::SizeMismatch { expected, found } => {
                FrameError::SizeMismatch { expected, found }
            }
            MetadataError::InvalidName(msg) => FrameError::InvalidName(msg),
            MetadataError::DuplicateName(name) => FrameError::DuplicateName(name),
            MetadataError::NotFound(what) => FrameError::NotFound(what),
        }
    }
}

impl From<MatrixError> for FrameError {
    fn from(err: MatrixError) -> Self {
        match err {
            MatrixError::ShapeMismatch { expected, found } => {
                FrameError::SizeMismatch { expected, found }
            }
            MatrixError::IndexOutOfBounds { axis, index, len } => {
                FrameError::IndexOutOfBounds { axis, index, len }
            }
        }
    }
}

impl From<StoreError> for FrameError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Matrix(e) => e.into(),
            StoreError::SchemaInconsistency(msg) => FrameError::SchemaInconsistency(msg),
            StoreError::AlreadyExists(msg) => FrameError::AlreadyExists(msg),
            StoreError::Unsupported(msg) => FrameError::Unsupported(msg),
            other => FrameError::Store(other),
        }
    }
}
