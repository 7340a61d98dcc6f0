//! # Frame Metadata
//!
//! The three metadata categories carried by every frame, plus the column
//! index used to resolve names to matrix positions.
//!
//! ## Categories
//!
//! 1. **Params**: one [`ColumnDescriptor`] per matrix column, in column order.
//!    Channel names are unique (case-insensitive); marker names may be empty.
//!
//! 2. **Keywords**: ordered free-form instrument pairs ([`Keywords`]) as
//!    extracted from the source file's text segment.
//!
//! 3. **Phenotype data**: sample-level annotations ([`PhenoData`]).
//!
//! ## Column Index
//!
//! [`ColumnSet`] owns the descriptors together with two case-insensitive
//! [`NameIndex`] maps (channel and marker). The channel index size equals
//! the column count whenever the index is current; mutators rebuild it
//! before returning.

mod cache;
mod descriptor;
mod error;
mod index;
mod keywords;
mod pheno;


pub use cache::{MetaCache, MetaCategory};
pub use descriptor::{ColumnDescriptor, ValueRange};
pub use error::MetadataError;
pub use index::{ChannelField, ColumnField, ColumnSet, ColumnType, MarkerField, NameIndex};
pub use keywords::{
    channel_keyword, range_max_keyword, range_min_keyword, Keywords, PARAMETER_COUNT_KEYWORD,
};
pub use pheno::PhenoData;
