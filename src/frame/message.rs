//! Serializable interchange record of a frame.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{Backend, CytoFrame, FrameError, TileCytoFrame};
use crate::metadata::{ColumnDescriptor, Keywords, MetaCache, PhenoData};
use crate::schema::CYTOFRAME_FORMAT_VERSION;

/// What happens to the backing store when a message is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationOption {
    /// Copy the store to the destination
    Copy,
    /// Move the store to the destination and re-point the frame
    Move,
    /// Reference the current location
    Skip,
    /// Hard link the store (not available for directory stores)
    Link,
    /// Symbolic link at the destination pointing to the store
    Symlink,
}

impl fmt::Display for MigrationOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationOption::Copy => "copy",
            MigrationOption::Move => "move",
            MigrationOption::Skip => "skip",
            MigrationOption::Link => "link",
            MigrationOption::Symlink => "symlink",
        };
        f.write_str(name)
    }
}

/// Frame metadata plus the location of its persisted matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMessage {
    /// Store format version of the producer
    pub format_version: String,
    /// Backend that produced the message
    pub backend: Backend,
    /// Store location, if the frame is persisted
    pub uri: Option<PathBuf>,
    /// Number of events
    pub n_rows: u64,
    /// Number of channels
    pub n_cols: u64,
    /// Column descriptors
    pub params: Vec<ColumnDescriptor>,
    /// Instrument keywords
    pub keywords: Keywords,
    /// Phenotype attributes
    pub pheno: PhenoData,
}

impl FrameMessage {
    pub(crate) fn new(backend: Backend, uri: Option<PathBuf>, n_rows: usize, cache: &MetaCache) -> Self {
        Self {
            format_version: CYTOFRAME_FORMAT_VERSION.to_string(),
            backend,
            uri,
            n_rows: n_rows as u64,
            n_cols: cache.columns.len() as u64,
            params: cache.columns.params().to_vec(),
            keywords: cache.keywords.clone(),
            pheno: cache.pheno.clone(),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Open the referenced store with the message's metadata.
    ///
    /// Categories whose message metadata differs from the stored one are
    /// marked dirty, so a later flush persists them.
    pub fn open(&self, readonly: bool) -> Result<TileCytoFrame, FrameError> {
        let uri = self
            .uri
            .as_ref()
            .ok_or_else(|| FrameError::NotFound("message carries no store location".to_string()))?;
        let mut frame = TileCytoFrame::open(uri, readonly)?;

        if (frame.n_rows() as u64, frame.n_cols() as u64) != (self.n_rows, self.n_cols) {
            return Err(FrameError::SchemaInconsistency(format!(
                "message dims {}x{} differ from store {}x{}",
                self.n_rows,
                self.n_cols,
                frame.n_rows(),
                frame.n_cols()
            )));
        }

        if frame.params() != self.params.as_slice() {
            frame.set_params(self.params.clone())?;
        }
        if frame.get_keywords() != &self.keywords {
            frame.set_keywords(self.keywords.clone());
        }
        if frame.get_pheno_data() != &self.pheno {
            frame.set_pheno_data(self.pheno.clone());
        }
        Ok(frame)
    }
}
