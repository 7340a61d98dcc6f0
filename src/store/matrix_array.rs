//! Handle on the matrix section of one store.
//!
//! The handle caches the Parquet footer while open in read mode, together
//! with the size and modification time of the file it came from. A read on a
//! closed (or write-mode) handle, or on a section file that changed since the
//! footer was cached, loads the footer for that read only.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parquet::arrow::arrow_reader::{
    ArrowReaderMetadata, ArrowReaderOptions, ParquetRecordBatchReaderBuilder,
};
use parquet::arrow::ProjectionMask;
use rayon::prelude::*;

use super::config::StoreConfig;
use super::sections;
use super::utils::get_float32_column;
use super::StoreError;
use crate::matrix::{check_bounds, EventMatrix};
use crate::schema::{matrix_column_name, Section};

/// Mode the handle was opened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Reads allowed, footer cached
    Read,
    /// Section is being rewritten
    Write,
}

/// Identity of a section file as seen by the footer cache
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self, StoreError> {
        let meta = fs::metadata(path)?;
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Open handle on a store's matrix section
#[derive(Debug)]
pub struct MatrixArray {
    root: PathBuf,
    mode: AccessMode,
    handle: Option<(ArrowReaderMetadata, FileStamp)>,
    batch_size: usize,
    pool: Option<rayon::ThreadPool>,
}

impl MatrixArray {
    /// Open the matrix section under `root` for reading
    pub fn open(root: &Path, config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = if config.num_threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(config.num_threads)
                    .thread_name(|i| format!("cytoframe-io-{}", i))
                    .build()
                    .map_err(|e| StoreError::ThreadPool(e.to_string()))?,
            )
        } else {
            None
        };

        let mut array = Self {
            root: root.to_path_buf(),
            mode: AccessMode::Read,
            handle: None,
            batch_size: config.batch_size.max(1),
            pool,
        };
        array.reopen()?;
        Ok(array)
    }

    /// Section file path
    pub fn path(&self) -> PathBuf {
        Section::Matrix.path(&self.root)
    }

    /// Whether a read handle is currently cached
    pub fn is_open(&self) -> bool {
        self.handle.is_some() && self.mode == AccessMode::Read
    }

    /// Current access mode
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Drop the cached handle
    pub fn close(&mut self) {
        self.handle = None;
    }

    /// Reload the footer in read mode
    pub fn reopen(&mut self) -> Result<(), StoreError> {
        self.mode = AccessMode::Read;
        self.handle = Some(load_metadata(&self.path())?);
        Ok(())
    }

    /// Point the handle at a store that moved, reopening if it was open
    pub fn relocate(&mut self, root: &Path) -> Result<(), StoreError> {
        let was_open = self.is_open();
        self.root = root.to_path_buf();
        self.handle = None;
        if was_open {
            self.reopen()?;
        }
        Ok(())
    }

    /// `(rows, cols)` of the stored matrix
    pub fn dims(&self) -> Result<(usize, usize), StoreError> {
        let metadata = self.reader_metadata()?;
        Ok(metadata_dims(&metadata))
    }

    /// Whether the cached footer no longer describes the section file
    pub fn is_stale(&self) -> bool {
        match (&self.handle, self.mode) {
            (Some((_, stamp)), AccessMode::Read) => {
                FileStamp::of(&self.path()).map_or(true, |current| current != *stamp)
            }
            _ => false,
        }
    }

    /// Replace the stored matrix.
    ///
    /// The handle is in write mode for the duration; if it was open before,
    /// it is reopened on the new section.
    pub fn write(&mut self, matrix: &EventMatrix, config: &StoreConfig) -> Result<(), StoreError> {
        let was_open = self.is_open();
        self.mode = AccessMode::Write;
        self.handle = None;

        let result = sections::write_matrix(&self.root, matrix, config);
        self.mode = AccessMode::Read;
        result?;

        if was_open {
            self.reopen()?;
        }
        Ok(())
    }

    /// Read the whole matrix
    pub fn read_all(&self) -> Result<EventMatrix, StoreError> {
        let metadata = self.reader_metadata()?;
        let (_, n_cols) = metadata_dims(&metadata);
        let positions: Vec<usize> = (0..n_cols).collect();
        self.read_projected(&metadata, &positions)
    }

    /// Read the given 0-based columns, in the given order (repeats allowed)
    pub fn read_columns(&self, cols: &[usize]) -> Result<EventMatrix, StoreError> {
        let metadata = self.reader_metadata()?;
        let (_, n_cols) = metadata_dims(&metadata);
        check_bounds("column", cols, n_cols)?;
        self.read_projected(&metadata, cols)
    }

    fn reader_metadata(&self) -> Result<ArrowReaderMetadata, StoreError> {
        let path = self.path();
        if let (Some((metadata, stamp)), AccessMode::Read) = (&self.handle, self.mode) {
            if FileStamp::of(&path)? == *stamp {
                return Ok(metadata.clone());
            }
            log::debug!("Matrix section {} changed, reloading its footer", path.display());
        }
        Ok(load_metadata(&path)?.0)
    }

    fn read_projected(
        &self,
        metadata: &ArrowReaderMetadata,
        positions: &[usize],
    ) -> Result<EventMatrix, StoreError> {
        let (n_rows, _) = metadata_dims(metadata);
        if positions.is_empty() {
            return Ok(EventMatrix::zeros(n_rows, 0));
        }

        let names: Vec<String> = positions.iter().map(|&p| matrix_column_name(p)).collect();
        let schema = metadata.schema();
        let mut roots = names
            .iter()
            .map(|name| schema.index_of(name))
            .collect::<Result<Vec<_>, _>>()?;
        roots.sort_unstable();
        roots.dedup();
        let mask = ProjectionMask::roots(metadata.parquet_schema(), roots);

        let n_groups = metadata.metadata().num_row_groups();
        let parts = match &self.pool {
            Some(pool) if n_groups > 1 => {
                let chunks = partition(n_groups, pool.current_num_threads());
                log::debug!(
                    "Reading {} row groups in {} chunks",
                    n_groups,
                    chunks.len()
                );
                pool.install(|| {
                    chunks
                        .par_iter()
                        .map(|groups| self.read_row_groups(metadata, &mask, groups.clone(), &names))
                        .collect::<Result<Vec<_>, _>>()
                })?
            }
            _ => vec![self.read_row_groups(metadata, &mask, (0..n_groups).collect(), &names)?],
        };

        let mut columns: Vec<Vec<f64>> = names.iter().map(|_| Vec::with_capacity(n_rows)).collect();
        for part in parts {
            for (column, values) in columns.iter_mut().zip(part) {
                column.extend(values);
            }
        }
        Ok(EventMatrix::from_columns(n_rows, columns)?)
    }

    /// Read a contiguous run of row groups with a private file handle
    fn read_row_groups(
        &self,
        metadata: &ArrowReaderMetadata,
        mask: &ProjectionMask,
        groups: Vec<usize>,
        names: &[String],
    ) -> Result<Vec<Vec<f64>>, StoreError> {
        let file = File::open(self.path())?;
        let reader = ParquetRecordBatchReaderBuilder::new_with_metadata(file, metadata.clone())
            .with_projection(mask.clone())
            .with_row_groups(groups)
            .with_batch_size(self.batch_size)
            .build()?;

        let mut columns = vec![Vec::new(); names.len()];
        for batch in reader {
            let batch = batch?;
            for (column, name) in columns.iter_mut().zip(names) {
                let values = get_float32_column(&batch, name)?;
                column.extend(values.values().iter().map(|&v| f64::from(v)));
            }
        }
        Ok(columns)
    }
}

fn load_metadata(path: &Path) -> Result<(ArrowReaderMetadata, FileStamp), StoreError> {
    let file = File::open(path)?;
    let meta = file.metadata()?;
    let stamp = FileStamp {
        len: meta.len(),
        modified: meta.modified().ok(),
    };
    Ok((ArrowReaderMetadata::load(&file, ArrowReaderOptions::new())?, stamp))
}

fn metadata_dims(metadata: &ArrowReaderMetadata) -> (usize, usize) {
    let n_rows = metadata.metadata().file_metadata().num_rows().max(0) as usize;
    (n_rows, metadata.schema().fields().len())
}

/// Split `0..n` into at most `parts` contiguous, non-empty runs
fn partition(n: usize, parts: usize) -> Vec<Vec<usize>> {
    let parts = parts.clamp(1, n.max(1));
    let size = n.div_ceil(parts);
    (0..n)
        .collect::<Vec<_>>()
        .chunks(size.max(1))
        .map(<[usize]>::to_vec)
        .collect()
}
