use std::fs;
use std::path::{Path, PathBuf};

use super::{
    subset_cache, Backend, CopyOptions, CytoFrame, DirtyFlags, FrameError, FrameMessage, Internal,
    MemCytoFrame, MigrationOption,
};
use crate::matrix::EventMatrix;
use crate::metadata::{ColumnSet, MetaCache, MetaCategory};
use crate::schema::StoreManifest;
use crate::store::{self, MatrixArray, StoreConfig};

/// Frame backed by a tiled store on disk
///
/// The matrix stays on disk and is read on demand; metadata is cached and
/// written back by [`CytoFrame::flush_meta`]. Dropping a frame never
/// flushes: unflushed categories are reported with a warning.
///
/// A store must have at most one writer at a time.
#[derive(Debug)]
pub struct TileCytoFrame {
    uri: PathBuf,
    config: StoreConfig,
    matrix: MatrixArray,
    dims: (usize, usize),
    cache: MetaCache,
    readonly: bool,
    dirty: DirtyFlags,
}

impl TileCytoFrame {
    /// Open an existing store with the default client configuration
    pub fn open(uri: impl AsRef<Path>, readonly: bool) -> Result<Self, FrameError> {
        Self::open_with_config(uri, readonly, StoreConfig::default())
    }

    /// Open an existing store
    pub fn open_with_config(
        uri: impl AsRef<Path>,
        readonly: bool,
        config: StoreConfig,
    ) -> Result<Self, FrameError> {
        let uri = uri.as_ref();
        store::ensure_local(uri, &config)?;
        if !uri.is_dir() {
            return Err(FrameError::NotFound(format!("store {}", uri.display())));
        }

        let matrix = MatrixArray::open(uri, &config)?;
        let dims = matrix.dims()?;

        check_manifest(uri, dims)?;
        let cache = read_cache(uri, dims.1)?;
        log::debug!(
            "Opened store {} ({} events x {} channels, readonly={})",
            uri.display(),
            dims.0,
            dims.1,
            readonly
        );

        Ok(Self {
            uri: uri.to_path_buf(),
            config,
            matrix,
            dims,
            cache,
            readonly,
            dirty: DirtyFlags::new(),
        })
    }

    /// Write `source` to a new store at `uri` and open it
    pub fn create_from(
        source: &MemCytoFrame,
        uri: impl AsRef<Path>,
        overwrite: bool,
        config: StoreConfig,
    ) -> Result<Self, FrameError> {
        let uri = uri.as_ref();
        source.write_store(uri, overwrite, &config)?;
        Self::open_with_config(uri, false, config)
    }

    /// Store location
    pub fn uri(&self) -> &Path {
        &self.uri
    }

    /// Store client configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Cached `(rows, cols)`
    pub fn dims(&self) -> (usize, usize) {
        self.dims
    }

    /// Dirty state of every category
    pub fn dirty_flags(&self) -> DirtyFlags {
        self.dirty
    }

    /// Whether a category changed since the last flush or load
    pub fn is_dirty(&self, category: MetaCategory) -> bool {
        self.dirty.is_dirty(category)
    }

    /// Whether the matrix handle is open
    pub fn is_open(&self) -> bool {
        self.matrix.is_open()
    }

    /// Release the matrix handle; the next read reopens the section
    pub fn close(&mut self) {
        self.matrix.close();
    }

    /// Persist the column descriptors if they changed
    pub fn flush_params(&mut self) -> Result<(), FrameError> {
        self.flush_category(MetaCategory::Params)
    }

    /// Persist the keywords if they changed
    pub fn flush_keywords(&mut self) -> Result<(), FrameError> {
        self.flush_category(MetaCategory::Keywords)
    }

    /// Persist the phenotype attributes if they changed
    pub fn flush_pheno(&mut self) -> Result<(), FrameError> {
        self.flush_category(MetaCategory::PhenoData)
    }

    fn flush_category(&mut self, category: MetaCategory) -> Result<(), FrameError> {
        if !self.dirty.is_dirty(category) {
            return Ok(());
        }
        if self.readonly {
            return Err(FrameError::ReadOnly(format!(
                "cannot flush {} of {}",
                category,
                self.uri.display()
            )));
        }
        self.check_store_dims()?;

        match category {
            MetaCategory::Params => {
                store::write_params(&self.uri, self.cache.columns.params(), &self.config)?
            }
            MetaCategory::Keywords => {
                store::write_keywords(&self.uri, &self.cache.keywords, &self.config)?
            }
            MetaCategory::PhenoData => store::write_pheno(&self.uri, &self.cache.pheno, &self.config)?,
        }
        self.dirty.clear(category);
        log::debug!("Flushed {} of {}", category, self.uri.display());
        Ok(())
    }

    /// Fail unless the store still holds a matrix of the cached dimensions.
    ///
    /// The store can be replaced under an open frame, for example by an
    /// overwriting copy onto the same location. Such a frame must reload
    /// before it reads or writes again.
    fn check_store_dims(&self) -> Result<(), FrameError> {
        let on_disk = self.matrix.dims()?;
        if on_disk != self.dims {
            return Err(FrameError::SchemaInconsistency(format!(
                "store {} now holds {}x{} but the frame caches {}x{}; reload it with load_meta",
                self.uri.display(),
                on_disk.0,
                on_disk.1,
                self.dims.0,
                self.dims.1
            )));
        }
        Ok(())
    }

    /// Load the whole frame into memory
    pub fn to_mem(&self) -> Result<MemCytoFrame, FrameError> {
        MemCytoFrame::from_parts(self.cache.clone(), self.get_data()?)
    }

    fn relocate(&mut self, dest: &Path) -> Result<(), FrameError> {
        if fs::rename(&self.uri, dest).is_err() {
            // Cross-device: copy then remove
            store::copy_dir_recursive(&self.uri, dest)?;
            store::remove_location(&self.uri)?;
        }
        self.matrix.relocate(dest)?;
        log::info!("Moved store {} to {}", self.uri.display(), dest.display());
        self.uri = dest.to_path_buf();
        Ok(())
    }
}

fn check_manifest(uri: &Path, dims: (usize, usize)) -> Result<(), FrameError> {
    let manifest = store::read_manifest(uri)?;
    if manifest.dims() != (dims.0 as u64, dims.1 as u64) {
        return Err(FrameError::SchemaInconsistency(format!(
            "manifest declares {}x{} but the matrix section holds {}x{}",
            manifest.n_rows, manifest.n_cols, dims.0, dims.1
        )));
    }
    Ok(())
}

fn read_cache(uri: &Path, n_cols: usize) -> Result<MetaCache, FrameError> {
    let params = store::read_params(uri)?;
    if params.len() != n_cols {
        return Err(FrameError::SchemaInconsistency(format!(
            "params hold {} channels but the matrix has {} columns",
            params.len(),
            n_cols
        )));
    }
    Ok(MetaCache::new(
        ColumnSet::new(params)?,
        store::read_keywords(uri)?,
        store::read_pheno(uri)?,
    ))
}

impl CytoFrame for TileCytoFrame {
    fn cache(&self) -> &MetaCache {
        &self.cache
    }

    fn cache_mut(&mut self, _: Internal) -> &mut MetaCache {
        &mut self.cache
    }

    fn n_rows(&self) -> usize {
        self.dims.0
    }

    fn backend(&self) -> Backend {
        Backend::Tile
    }

    fn get_data(&self) -> Result<EventMatrix, FrameError> {
        self.check_store_dims()?;
        Ok(self.matrix.read_all()?)
    }

    fn get_data_subset(
        &self,
        rows: Option<&[usize]>,
        cols: Option<&[usize]>,
    ) -> Result<EventMatrix, FrameError> {
        self.check_store_dims()?;
        let data = match cols {
            Some(cols) => self.matrix.read_columns(cols)?,
            None => self.matrix.read_all()?,
        };
        match rows {
            Some(rows) => Ok(data.select_rows(rows)?),
            None => Ok(data),
        }
    }

    fn set_data(&mut self, matrix: EventMatrix) -> Result<(), FrameError> {
        if self.readonly {
            return Err(FrameError::ReadOnly(format!(
                "cannot replace the matrix of {}",
                self.uri.display()
            )));
        }
        if matrix.n_cols() != self.n_cols() {
            return Err(FrameError::SizeMismatch {
                expected: self.n_cols(),
                found: matrix.n_cols(),
            });
        }

        self.check_store_dims()?;

        self.matrix.write(&matrix, &self.config)?;
        store::write_manifest(&self.uri, &StoreManifest::new(matrix.n_rows(), matrix.n_cols()))?;
        self.dims = matrix.shape();

        // Ranges of the values as stored, not as passed in
        self.cache
            .columns
            .set_data_ranges(matrix.rounded_to_f32().column_ranges())?;
        self.mark_dirty(MetaCategory::Params);
        Ok(())
    }

    /// The copy is written to `options.destination`, or to a fresh location
    /// under the temp directory, and opened writable.
    ///
    /// Overwriting the frame's own store replaces it under the open frame;
    /// that frame then refuses reads and writes until [`CytoFrame::load_meta`]
    /// re-syncs it with the new store.
    fn copy_with(
        &self,
        rows: Option<&[usize]>,
        cols: Option<&[usize]>,
        options: &CopyOptions,
    ) -> Result<Self, FrameError> {
        let dest = options
            .destination
            .clone()
            .unwrap_or_else(store::unique_location);
        if store::same_location(&dest, &self.uri) && !options.overwrite {
            return Err(FrameError::AlreadyExists(format!(
                "copy destination {} is the source store",
                dest.display()
            )));
        }

        let data = self.get_data_subset(rows, cols)?;
        let copy = MemCytoFrame::from_parts(subset_cache(&self.cache, cols)?, data)?;
        Self::create_from(&copy, &dest, options.overwrite, self.config.clone())
    }

    fn to_message(
        &mut self,
        dest: &Path,
        option: MigrationOption,
    ) -> Result<FrameMessage, FrameError> {
        if option == MigrationOption::Link {
            return Err(FrameError::Unsupported(
                "hard links cannot migrate a directory store".to_string(),
            ));
        }
        if option != MigrationOption::Skip && !store::same_location(dest, &self.uri) {
            if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.is_dir() {
                    return Err(FrameError::NotFound(format!("directory {}", parent.display())));
                }
            }
            if fs::symlink_metadata(dest).is_ok() {
                return Err(FrameError::AlreadyExists(dest.display().to_string()));
            }
            if option == MigrationOption::Move && self.readonly {
                return Err(FrameError::ReadOnly(format!(
                    "cannot move the store {}",
                    self.uri.display()
                )));
            }
            if self.dirty.any() {
                log::warn!(
                    "Migrating {} with unflushed metadata; the message carries the cached state",
                    self.uri.display()
                );
            }

            match option {
                MigrationOption::Copy => store::copy_dir_recursive(&self.uri, dest)?,
                MigrationOption::Move => self.relocate(dest)?,
                MigrationOption::Symlink => symlink_store(&self.uri, dest)?,
                MigrationOption::Skip | MigrationOption::Link => {}
            }
        }

        let uri = match option {
            MigrationOption::Skip => self.uri.clone(),
            _ => dest.to_path_buf(),
        };
        Ok(FrameMessage::new(Backend::Tile, Some(uri), self.n_rows(), &self.cache))
    }

    fn mark_dirty(&mut self, category: MetaCategory) {
        self.dirty.mark(category);
    }

    fn is_readonly(&self) -> bool {
        self.readonly
    }

    fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    fn flush_meta(&mut self) -> Result<(), FrameError> {
        for category in MetaCategory::ALL {
            self.flush_category(category)?;
        }
        Ok(())
    }

    /// Re-reads every category and the matrix dimensions, clearing all flags
    fn load_meta(&mut self) -> Result<(), FrameError> {
        if self.matrix.is_stale() {
            self.matrix.reopen()?;
        }
        let dims = self.matrix.dims()?;
        check_manifest(&self.uri, dims)?;

        self.cache = read_cache(&self.uri, dims.1)?;
        if dims != self.dims {
            log::info!(
                "Store {} changed from {}x{} to {}x{}",
                self.uri.display(),
                self.dims.0,
                self.dims.1,
                dims.0,
                dims.1
            );
            self.dims = dims;
        }
        self.dirty.clear_all();
        Ok(())
    }
}

impl Drop for TileCytoFrame {
    fn drop(&mut self) {
        if self.dirty.any() {
            let categories: Vec<String> = self
                .dirty
                .dirty_categories()
                .iter()
                .map(ToString::to_string)
                .collect();
            log::warn!(
                "Dropping frame {} with unflushed metadata: {}",
                self.uri.display(),
                categories.join(", ")
            );
        }
    }
}

#[cfg(unix)]
fn symlink_store(target: &Path, link: &Path) -> Result<(), FrameError> {
    let target = fs::canonicalize(target)?;
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

#[cfg(not(unix))]
fn symlink_store(_target: &Path, _link: &Path) -> Result<(), FrameError> {
    Err(FrameError::Unsupported(
        "symbolic link migration is only available on Unix".to_string(),
    ))
}
