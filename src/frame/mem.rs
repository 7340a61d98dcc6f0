use std::path::Path;

use super::{
    subset_cache, Backend, CopyOptions, CytoFrame, FrameError, FrameMessage, Internal,
    MigrationOption, TileCytoFrame,
};
use crate::matrix::EventMatrix;
use crate::metadata::{ColumnDescriptor, ColumnSet, Keywords, MetaCache, PhenoData};
use crate::store::{self, StoreConfig};

/// Frame whose matrix and metadata live in memory
///
/// Metadata setters apply immediately; there is nothing to flush.
#[derive(Debug, Clone, PartialEq)]
pub struct MemCytoFrame {
    cache: MetaCache,
    matrix: EventMatrix,
}

impl MemCytoFrame {
    /// Assemble a frame from parser output.
    ///
    /// Fails with `SizeMismatch` when the descriptor count differs from the
    /// matrix column count and `DuplicateName` when channels repeat.
    pub fn new(
        params: Vec<ColumnDescriptor>,
        keywords: Keywords,
        matrix: EventMatrix,
    ) -> Result<Self, FrameError> {
        Self::from_parts(
            MetaCache::new(ColumnSet::new(params)?, keywords, PhenoData::new()),
            matrix,
        )
    }

    /// Assemble a frame from an existing cache
    pub fn from_parts(cache: MetaCache, matrix: EventMatrix) -> Result<Self, FrameError> {
        if cache.columns.len() != matrix.n_cols() {
            return Err(FrameError::SizeMismatch {
                expected: matrix.n_cols(),
                found: cache.columns.len(),
            });
        }
        Ok(Self { cache, matrix })
    }

    /// Attach phenotype attributes
    pub fn with_pheno(mut self, pheno: PhenoData) -> Self {
        self.cache.pheno = pheno;
        self
    }

    /// Materialize a disk frame
    pub fn from_tile(frame: &TileCytoFrame) -> Result<Self, FrameError> {
        frame.to_mem()
    }

    /// Borrow the event matrix
    pub fn matrix(&self) -> &EventMatrix {
        &self.matrix
    }

    /// Split into metadata and matrix
    pub fn into_parts(self) -> (MetaCache, EventMatrix) {
        (self.cache, self.matrix)
    }

    /// Serialize to a store at `uri`
    pub fn write_store(
        &self,
        uri: impl AsRef<Path>,
        overwrite: bool,
        config: &StoreConfig,
    ) -> Result<(), FrameError> {
        store::write_store(uri.as_ref(), &self.cache, &self.matrix, config, overwrite)?;
        Ok(())
    }

    /// Keep only the given columns, in the given order
    pub fn subset_columns(&mut self, cols: &[usize]) -> Result<(), FrameError> {
        let cache = subset_cache(&self.cache, Some(cols))?;
        self.matrix = self.matrix.select_cols(cols)?;
        self.cache = cache;
        Ok(())
    }

    /// Keep only the given rows, in the given order
    pub fn subset_rows(&mut self, rows: &[usize]) -> Result<(), FrameError> {
        self.matrix = self.matrix.select_rows(rows)?;
        Ok(())
    }
}

impl CytoFrame for MemCytoFrame {
    fn cache(&self) -> &MetaCache {
        &self.cache
    }

    fn cache_mut(&mut self, _: Internal) -> &mut MetaCache {
        &mut self.cache
    }

    fn n_rows(&self) -> usize {
        self.matrix.n_rows()
    }

    fn backend(&self) -> Backend {
        Backend::Mem
    }

    fn get_data(&self) -> Result<EventMatrix, FrameError> {
        Ok(self.matrix.clone())
    }

    fn get_data_subset(
        &self,
        rows: Option<&[usize]>,
        cols: Option<&[usize]>,
    ) -> Result<EventMatrix, FrameError> {
        Ok(self.matrix.select(rows, cols)?)
    }

    fn set_data(&mut self, matrix: EventMatrix) -> Result<(), FrameError> {
        if matrix.n_cols() != self.n_cols() {
            return Err(FrameError::SizeMismatch {
                expected: self.n_cols(),
                found: matrix.n_cols(),
            });
        }
        self.cache.columns.set_data_ranges(matrix.column_ranges())?;
        self.matrix = matrix;
        Ok(())
    }

    /// In-memory copies ignore the destination.
    fn copy_with(
        &self,
        rows: Option<&[usize]>,
        cols: Option<&[usize]>,
        _options: &CopyOptions,
    ) -> Result<Self, FrameError> {
        let matrix = self.matrix.select(rows, cols)?;
        let cache = subset_cache(&self.cache, cols)?;
        Self::from_parts(cache, matrix)
    }

    fn to_message(
        &mut self,
        dest: &Path,
        option: MigrationOption,
    ) -> Result<FrameMessage, FrameError> {
        let uri = match option {
            MigrationOption::Copy | MigrationOption::Move => {
                self.write_store(dest, false, &StoreConfig::default())?;
                Some(dest.to_path_buf())
            }
            MigrationOption::Skip => None,
            MigrationOption::Link | MigrationOption::Symlink => {
                return Err(FrameError::Unsupported(format!(
                    "{} migration of an in-memory frame",
                    option
                )))
            }
        };
        Ok(FrameMessage::new(Backend::Mem, uri, self.n_rows(), &self.cache))
    }
}
