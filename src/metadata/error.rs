/// Errors that can occur while mutating or querying frame metadata
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// Bulk column replacement with the wrong number of entries
    #[error("Size mismatch: expected {expected} columns, got {found}")]
    SizeMismatch {
        /// Current number of columns
        expected: usize,
        /// Number of entries supplied
        found: usize,
    },

    /// A channel name is empty
    #[error("Invalid channel name: {0}")]
    InvalidName(String),

    /// A channel name would appear more than once
    #[error("Duplicate channel name: {0}")]
    DuplicateName(String),

    /// Column, marker, keyword or phenotype attribute lookup miss
    #[error("Not found: {0}")]
    NotFound(String),
}
