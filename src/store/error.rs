use crate::matrix::MatrixError;

/// Errors that can occur while reading or writing a store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Matrix shape or selection error
    #[error("Matrix error: {0}")]
    Matrix(#[from] MatrixError),

    /// Invalid store layout or section format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Declared entry counts disagree with what was actually stored
    #[error("Schema inconsistency: {0}")]
    SchemaInconsistency(String),

    /// A location that already exists would be overwritten
    #[error("Store already exists: {0}")]
    AlreadyExists(String),

    /// Requested operation or location kind is not available
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// I/O thread pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}
