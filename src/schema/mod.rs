//! # cytoframe Store Schema
//!
//! This module defines the on-disk layout of a tiled cytoframe store and the
//! Apache Arrow schemas of its sections.
//!
//! ## Layout
//!
//! ```text
//! sample.tile/
//! ├── manifest.json             # format version, matrix dims
//! ├── mat/mat.parquet           # event matrix, one Float32 column per channel
//! ├── params/params.parquet     # per-column descriptors
//! ├── keywords/keywords.parquet # ordered instrument keywords
//! └── pdata/pdata.parquet       # phenotype attributes
//! ```
//!
//! ## Matrix Section
//!
//! | Column | Type | Description |
//! |--------|------|-------------|
//! | ch1 .. chN | Float32 | Events for the channel at store ordinal k (1-based) |
//!
//! Each Parquet row group is one tile of consecutive events, so a column
//! subset is read by projecting only the requested `ch<k>` columns.
//!
//! ## Params Section
//!
//! | Column | Type | Description |
//! |--------|------|-------------|
//! | channel | Utf8 | Channel name |
//! | marker | Utf8 | Marker label attached to the channel |
//! | instrument_min / instrument_max | Float64 | Instrument range |
//! | data_min / data_max | Float64 | Observed data range |
//!
//! The footer key `cytoframe:param_count` declares the number of rows.
//!
//! ## Keywords and Phenotype Sections
//!
//! | Column | Type | Description |
//! |--------|------|-------------|
//! | name | Utf8 | Entry name |
//! | value | Utf8 | Entry value |

mod builders;
/// Store column name constants.
pub mod columns;
mod constants;
mod layout;
pub mod manifest;


pub use builders::{
    create_key_value_schema, create_key_value_schema_arc, create_matrix_schema,
    create_matrix_schema_arc, create_params_schema, create_params_schema_arc,
};
pub use columns::{matrix_column_name, matrix_column_position};
pub use constants::*;
pub use layout::Section;
pub use manifest::StoreManifest;
