//! # cytoframe - Flow Cytometry Frames over Tiled Stores
//!
//! `cytoframe` presents flow-cytometry event data as a mutable, indexable
//! frame: a dense events x channels matrix plus three kinds of metadata
//! (per-channel parameter descriptors, instrument keywords and sample-level
//! phenotype attributes).
//!
//! ## Key Features
//!
//! - **One interface, two backends**: [`frame::MemCytoFrame`] keeps everything
//!   in memory; [`frame::TileCytoFrame`] keeps the matrix on disk and reads it
//!   on demand. Both implement [`frame::CytoFrame`].
//!
//! - **Columnar partial reads**: the matrix section stores one Parquet column
//!   per channel, so selecting channels reads only those columns.
//!
//! - **Explicit persistence**: disk frames cache metadata and track which
//!   categories changed. Nothing reaches disk until `flush_meta`, and
//!   `load_meta` discards unflushed edits.
//!
//! - **Case-insensitive column index**: channels and markers resolve to
//!   positions regardless of case, and the index is rebuilt by every
//!   structural change.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cytoframe::prelude::*;
//!
//! let params = vec![
//!     ColumnDescriptor::new("FSC-A").with_instrument_range(0.0, 262144.0),
//!     ColumnDescriptor::new("FL1-A").with_marker("CD4"),
//! ];
//! let matrix = EventMatrix::from_columns(3, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])?;
//! let frame = MemCytoFrame::new(params, Keywords::new(), matrix)?;
//!
//! // Persist and reopen as a disk-resident frame
//! let mut tile = TileCytoFrame::create_from(&frame, "sample.tile", false, StoreConfig::default())?;
//! tile.set_marker("FSC-A", "size")?;
//! let cd4 = tile.get_data_by_names(&["CD4"], ColumnType::Marker)?;
//! tile.flush_meta()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`]: column descriptors, name index, keywords, phenotype data
//! - [`matrix`]: the dense event matrix
//! - [`schema`]: on-disk layout and Arrow schemas of the store sections
//! - [`store`]: Parquet-backed reads and writes of a store
//! - [`frame`]: the frame contract and its two backends
//! - [`config`]: TOML configuration of the store client

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod frame;
pub mod matrix;
pub mod metadata;
pub mod schema;
pub mod store;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{Config, ConfigError};
    pub use crate::frame::{
        Backend, CopyOptions, CytoFrame, DirtyFlags, FrameError, FrameMessage, MemCytoFrame,
        MetaState, MigrationOption, RangeType, TileCytoFrame,
    };
    pub use crate::matrix::{EventMatrix, MatrixError};
    pub use crate::metadata::{
        ColumnDescriptor, ColumnSet, ColumnType, Keywords, MetaCache, MetaCategory, PhenoData,
        ValueRange,
    };
    pub use crate::schema::{StoreManifest, CYTOFRAME_FORMAT_VERSION};
    pub use crate::store::{CompressionType, ObjectStoreCredentials, StoreConfig, StoreError};
}
