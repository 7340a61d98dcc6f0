//! # Frames
//!
//! [`CytoFrame`] is the contract shared by the two backends:
//!
//! - [`MemCytoFrame`] owns its matrix and metadata in memory.
//! - [`TileCytoFrame`] keeps the matrix in a tiled store on disk and caches
//!   the metadata, tracking which categories changed since the last flush.
//!
//! Metadata operations are provided methods on the trait, implemented once
//! over the backend's [`MetaCache`]. Every setter reports the categories it
//! touched through [`CytoFrame::mark_dirty`], which is the only entry point
//! into a backend's dirty state.
//!
//! ```no_run
//! use cytoframe::prelude::*;
//!
//! # fn main() -> Result<(), FrameError> {
//! let mut frame = TileCytoFrame::open("sample.tile", false)?;
//! frame.rename_column("FL1-A", "CD4", true)?;
//! let cd4 = frame.get_data_by_names(&["CD4"], ColumnType::Channel)?;
//! frame.flush_meta()?;
//! # Ok(())
//! # }
//! ```

mod dirty;
mod error;
mod mem;
mod message;
mod tile;

#[cfg(test)]
mod tests;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::matrix::{check_bounds, EventMatrix};
use crate::metadata::{
    channel_keyword, range_max_keyword, range_min_keyword, ColumnDescriptor, ColumnType, Keywords,
    MetaCache, MetaCategory, PhenoData, ValueRange,
};

pub use dirty::{DirtyFlags, MetaState};
pub use error::FrameError;
pub use mem::MemCytoFrame;
pub use message::{FrameMessage, MigrationOption};
pub use tile::TileCytoFrame;

/// Storage strategy behind a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-memory matrix
    Mem,
    /// Tiled on-disk store
    Tile,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Mem => write!(f, "mem"),
            Backend::Tile => write!(f, "tile"),
        }
    }
}

/// Which range of a column to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeType {
    /// Range the instrument can record
    Instrument,
    /// Range observed in the events
    Data,
}

/// Destination settings for [`CytoFrame::copy_with`]
#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    /// Store location of the copy; `None` picks a fresh one under the temp directory
    pub destination: Option<PathBuf>,
    /// Replace an existing destination
    pub overwrite: bool,
}

impl CopyOptions {
    /// Copy into `destination`
    pub fn to(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: Some(destination.into()),
            overwrite: false,
        }
    }

    /// Set whether an existing destination is replaced
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

mod sealed {
    /// Access token for mutable cache access; only this crate can build one
    #[derive(Debug, Clone, Copy)]
    pub struct Internal(pub(super) ());
}

use sealed::Internal;

const INTERNAL: Internal = Internal(());

/// Common interface over in-memory and disk-resident frames
///
/// Cached metadata is only mutable through the provided setters, each of
/// which reports what it touched to [`CytoFrame::mark_dirty`]. Code outside
/// this crate cannot reach the cache directly:
///
/// ```compile_fail
/// use cytoframe::prelude::*;
///
/// fn edit_behind_the_flags<F: CytoFrame>(frame: &mut F) {
///     frame.cache_mut().pheno.set("batch", "7");
/// }
/// ```
pub trait CytoFrame {
    /// Cached metadata
    fn cache(&self) -> &MetaCache;

    /// Mutable cached metadata, for the setters of this crate only
    #[doc(hidden)]
    fn cache_mut(&mut self, token: Internal) -> &mut MetaCache;

    /// Number of events
    fn n_rows(&self) -> usize;

    /// Storage strategy
    fn backend(&self) -> Backend;

    /// The full event matrix
    fn get_data(&self) -> Result<EventMatrix, FrameError>;

    /// Selected rows and columns, in the given order; `None` selects the whole axis
    fn get_data_subset(
        &self,
        rows: Option<&[usize]>,
        cols: Option<&[usize]>,
    ) -> Result<EventMatrix, FrameError>;

    /// Replace the event matrix; the column count must equal [`CytoFrame::n_cols`]
    fn set_data(&mut self, matrix: EventMatrix) -> Result<(), FrameError>;

    /// Independent frame holding the selected rows and columns
    fn copy_with(
        &self,
        rows: Option<&[usize]>,
        cols: Option<&[usize]>,
        options: &CopyOptions,
    ) -> Result<Self, FrameError>
    where
        Self: Sized;

    /// Interchange record, migrating the backing store as requested
    fn to_message(
        &mut self,
        dest: &Path,
        option: MigrationOption,
    ) -> Result<FrameMessage, FrameError>;

    /// Record that a metadata category changed
    fn mark_dirty(&mut self, _category: MetaCategory) {}

    /// Whether persisted state is protected
    fn is_readonly(&self) -> bool {
        false
    }

    /// Protect or unprotect persisted state
    fn set_readonly(&mut self, _readonly: bool) {}

    /// Persist every changed metadata category
    fn flush_meta(&mut self) -> Result<(), FrameError> {
        Ok(())
    }

    /// Discard cached metadata and reload it from storage
    fn load_meta(&mut self) -> Result<(), FrameError> {
        Ok(())
    }

    /// Number of channels
    fn n_cols(&self) -> usize {
        self.cache().columns.len()
    }

    /// Column descriptors in column order
    fn params(&self) -> &[ColumnDescriptor] {
        self.cache().columns.params()
    }

    /// Replace all column descriptors
    fn set_params(&mut self, params: Vec<ColumnDescriptor>) -> Result<(), FrameError> {
        self.cache_mut(INTERNAL).columns.replace(params)?;
        self.mark_dirty(MetaCategory::Params);
        Ok(())
    }

    /// Channel or marker names in column order
    fn get_columns(&self, col_type: ColumnType) -> Vec<String> {
        self.cache().columns.names(col_type)
    }

    /// Position of a column, matched case-insensitively
    fn column_index(&self, name: &str, col_type: ColumnType) -> Result<usize, FrameError> {
        Ok(self.cache().columns.position(name, col_type)?)
    }

    /// Positions of several columns
    fn column_indices(&self, names: &[&str], col_type: ColumnType) -> Result<Vec<usize>, FrameError> {
        names
            .iter()
            .map(|name| self.column_index(name, col_type))
            .collect()
    }

    /// Marker attached to a channel
    fn marker_of(&self, channel: &str) -> Result<&str, FrameError> {
        let position = self.column_index(channel, ColumnType::Channel)?;
        Ok(self.params()[position].marker.as_str())
    }

    /// Replace every channel name positionally, updating `$P<n>N`
    fn set_columns(&mut self, names: &[String]) -> Result<(), FrameError> {
        let cache = self.cache_mut(INTERNAL);
        cache.columns.set_channels(names)?;
        for (position, name) in names.iter().enumerate() {
            cache.keywords.set(channel_keyword(position), name.as_str());
        }
        self.mark_dirty(MetaCategory::Params);
        self.mark_dirty(MetaCategory::Keywords);
        Ok(())
    }

    /// Rename one channel
    fn rename_column(&mut self, old: &str, new: &str, update_keywords: bool) -> Result<(), FrameError> {
        let cache = self.cache_mut(INTERNAL);
        let position = cache.columns.rename(old, new)?;
        if update_keywords {
            cache.keywords.set(channel_keyword(position), new);
            self.mark_dirty(MetaCategory::Keywords);
        }
        self.mark_dirty(MetaCategory::Params);
        Ok(())
    }

    /// Rename several channels, validated as a whole before any change
    fn rename_columns(
        &mut self,
        renames: &[(String, String)],
        update_keywords: bool,
    ) -> Result<(), FrameError> {
        let cache = self.cache_mut(INTERNAL);
        let positions = cache.columns.rename_many(renames)?;
        if update_keywords {
            for (position, (_, new)) in positions.into_iter().zip(renames) {
                cache.keywords.set(channel_keyword(position), new.as_str());
            }
            self.mark_dirty(MetaCategory::Keywords);
        }
        self.mark_dirty(MetaCategory::Params);
        Ok(())
    }

    /// Attach a marker label to a channel
    fn set_marker(&mut self, channel: &str, marker: &str) -> Result<(), FrameError> {
        self.cache_mut(INTERNAL).columns.set_marker(channel, marker)?;
        self.mark_dirty(MetaCategory::Params);
        Ok(())
    }

    /// Set the instrument range of a column
    ///
    /// With `update_keywords` the `flowCore_$P<n>Rmin`/`Rmax` keywords are
    /// written too.
    fn set_range(
        &mut self,
        column: &str,
        col_type: ColumnType,
        (min, max): (f64, f64),
        update_keywords: bool,
    ) -> Result<(), FrameError> {
        let position = self.column_index(column, col_type)?;
        let cache = self.cache_mut(INTERNAL);
        cache
            .columns
            .set_instrument_range(position, ValueRange::new(min, max))?;
        if update_keywords {
            cache.keywords.set(range_min_keyword(position), min.to_string());
            cache.keywords.set(range_max_keyword(position), max.to_string());
            self.mark_dirty(MetaCategory::Keywords);
        }
        self.mark_dirty(MetaCategory::Params);
        Ok(())
    }

    /// Instrument or data range of a column
    fn get_range(
        &self,
        column: &str,
        col_type: ColumnType,
        range_type: RangeType,
    ) -> Result<(f64, f64), FrameError> {
        let position = self.column_index(column, col_type)?;
        let descriptor = &self.params()[position];
        let range = match range_type {
            RangeType::Instrument => descriptor.instrument_range,
            RangeType::Data => descriptor.data_range,
        };
        Ok(range.as_tuple())
    }

    /// Columns selected by name, in the given order
    fn get_data_by_names(&self, names: &[&str], col_type: ColumnType) -> Result<EventMatrix, FrameError> {
        let cols = self.column_indices(names, col_type)?;
        self.get_data_subset(None, Some(&cols))
    }

    /// All keywords
    fn get_keywords(&self) -> &Keywords {
        &self.cache().keywords
    }

    /// Value of a keyword
    fn get_keyword(&self, name: &str) -> Result<&str, FrameError> {
        self.cache()
            .keywords
            .get(name)
            .ok_or_else(|| FrameError::NotFound(format!("keyword '{}'", name)))
    }

    /// Set a keyword, replacing the first match or appending
    fn set_keyword(&mut self, name: &str, value: &str) {
        self.cache_mut(INTERNAL).keywords.set(name, value);
        self.mark_dirty(MetaCategory::Keywords);
    }

    /// Replace all keywords
    fn set_keywords(&mut self, keywords: Keywords) {
        self.cache_mut(INTERNAL).keywords = keywords;
        self.mark_dirty(MetaCategory::Keywords);
    }

    /// All phenotype attributes
    fn get_pheno_data(&self) -> &PhenoData {
        &self.cache().pheno
    }

    /// Value of a phenotype attribute
    fn get_pheno(&self, name: &str) -> Result<&str, FrameError> {
        self.cache()
            .pheno
            .get(name)
            .ok_or_else(|| FrameError::NotFound(format!("phenotype attribute '{}'", name)))
    }

    /// Set a phenotype attribute
    fn set_pheno(&mut self, name: &str, value: &str) {
        self.cache_mut(INTERNAL).pheno.set(name, value);
        self.mark_dirty(MetaCategory::PhenoData);
    }

    /// Replace all phenotype attributes
    fn set_pheno_data(&mut self, pheno: PhenoData) {
        self.cache_mut(INTERNAL).pheno = pheno;
        self.mark_dirty(MetaCategory::PhenoData);
    }

    /// Remove a phenotype attribute, returning its value
    fn del_pheno(&mut self, name: &str) -> Option<String> {
        let removed = self.cache_mut(INTERNAL).pheno.remove(name);
        if removed.is_some() {
            self.mark_dirty(MetaCategory::PhenoData);
        }
        removed
    }

    /// Independent copy of the whole frame
    fn copy(&self) -> Result<Self, FrameError>
    where
        Self: Sized,
    {
        self.copy_with(None, None, &CopyOptions::default())
    }
}

/// Metadata of a column subset: descriptors selected, keyword families renumbered
pub(crate) fn subset_cache(cache: &MetaCache, cols: Option<&[usize]>) -> Result<MetaCache, FrameError> {
    match cols {
        None => Ok(cache.clone()),
        Some(cols) => {
            check_bounds("column", cols, cache.columns.len())?;
            Ok(MetaCache::new(
                cache.columns.select(cols)?,
                cache.keywords.renumber_parameters(cols),
                cache.pheno.clone(),
            ))
        }
    }
}
