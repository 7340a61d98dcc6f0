//! Manifest schema for cytoframe stores.
//!
//! `manifest.json` declares the format version and the matrix dimensions,
//! so a reader can cross-check the matrix section before trusting it.

use serde::{Deserialize, Serialize};

use super::constants::CYTOFRAME_FORMAT_VERSION;

/// Manifest written at the root of every store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreManifest {
    /// Store format version (e.g., "1.0.0")
    pub format_version: String,
    /// Number of events in the matrix section
    pub n_rows: u64,
    /// Number of channels in the matrix section
    pub n_cols: u64,
    /// ISO 8601 timestamp of the last matrix write
    pub created: String,
    /// Name and version of the writer
    pub writer: String,
}

impl StoreManifest {
    /// Creates a manifest for a matrix of the given shape, stamped now.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            format_version: CYTOFRAME_FORMAT_VERSION.to_string(),
            n_rows: n_rows as u64,
            n_cols: n_cols as u64,
            created: chrono::Utc::now().to_rfc3339(),
            writer: writer_info(),
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// `(rows, cols)` as recorded
    pub fn dims(&self) -> (u64, u64) {
        (self.n_rows, self.n_cols)
    }
}

/// Writer identity recorded in manifests and Parquet footers
pub fn writer_info() -> String {
    format!("cytoframe v{}", env!("CARGO_PKG_VERSION"))
}
