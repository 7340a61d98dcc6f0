//! # Tiled Store Client
//!
//! Reads and writes the directory bundle described in [`crate::schema`]:
//! one Parquet file per section plus a JSON manifest.
//!
//! Whole stores are created through a staging directory next to the
//! destination, then renamed into place, so a failed write never leaves a
//! partial store at the destination. A store being overwritten is renamed
//! aside first and removed only after the new one is in place.
//!
//! Only local directories are supported. A location with a URL scheme
//! (`s3://...`) is rejected with [`StoreError::Unsupported`]; credentials
//! in [`StoreConfig`] are carried for such locations but not used.
//!
//! One writer per store at a time is a caller precondition; no lock file is
//! taken.

mod config;
mod error;
mod matrix_array;
mod sections;
mod utils;


use std::fs;
use std::path::{Path, PathBuf};

use crate::matrix::EventMatrix;
use crate::metadata::MetaCache;
use crate::schema::{StoreManifest, TILE_EXTENSION};

pub use config::{CompressionType, ObjectStoreCredentials, StoreConfig};
pub use error::StoreError;
pub use matrix_array::{AccessMode, MatrixArray};
pub use sections::{
    read_keywords, read_manifest, read_params, read_pheno, write_keywords, write_manifest,
    write_matrix, write_params, write_pheno,
};

/// Reject locations that are not plain local paths
pub fn ensure_local(uri: &Path, config: &StoreConfig) -> Result<(), StoreError> {
    let raw = uri.to_string_lossy();
    if let Some((scheme, _)) = raw.split_once("://") {
        let region = config
            .credentials
            .as_ref()
            .map(|c| c.region.as_str())
            .unwrap_or("none");
        return Err(StoreError::Unsupported(format!(
            "{}:// locations are not supported (region {}): {}",
            scheme, region, raw
        )));
    }
    Ok(())
}

/// Whether two paths name the same existing file system entry
pub fn same_location(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Fresh store location in the system temporary directory
pub fn unique_location() -> PathBuf {
    std::env::temp_dir().join(format!("{}.{}", uuid::Uuid::new_v4(), TILE_EXTENSION))
}

/// Remove a store (or whatever else sits at `path`)
pub fn remove_location(path: &Path) -> Result<(), StoreError> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Recursively copy a directory tree
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Rename `stage` to `root`.
///
/// An existing `root` is first renamed aside and only removed once the new
/// store is in place; if the swap fails it is renamed back.
fn swap_into_place(stage: &Path, root: &Path, parent: &Path) -> Result<(), StoreError> {
    if fs::symlink_metadata(root).is_err() {
        fs::rename(stage, root)?;
        return Ok(());
    }

    let aside = tempfile::Builder::new()
        .prefix(".cytoframe-replaced-")
        .tempdir_in(parent)?;
    let old = aside.path().join("store");
    fs::rename(root, &old)?;

    if let Err(err) = fs::rename(stage, root) {
        if let Err(restore) = fs::rename(&old, root) {
            let kept = aside.into_path();
            log::error!(
                "Could not restore {} (previous store kept at {}): {}",
                root.display(),
                kept.display(),
                restore
            );
        }
        return Err(err.into());
    }
    log::debug!("Replaced store {}", root.display());
    Ok(())
}

/// Write a complete store at `root`.
///
/// Fails with [`StoreError::AlreadyExists`] when `root` exists and
/// `overwrite` is false.
pub fn write_store(
    root: &Path,
    cache: &MetaCache,
    matrix: &EventMatrix,
    config: &StoreConfig,
    overwrite: bool,
) -> Result<(), StoreError> {
    ensure_local(root, config)?;
    let exists = fs::symlink_metadata(root).is_ok();
    if exists && !overwrite {
        return Err(StoreError::AlreadyExists(root.display().to_string()));
    }

    let parent = match root.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".cytoframe-staging-")
        .tempdir_in(&parent)?;
    let stage = staging.path();

    write_matrix(stage, matrix, config)?;
    write_params(stage, cache.columns.params(), config)?;
    write_keywords(stage, &cache.keywords, config)?;
    write_pheno(stage, &cache.pheno, config)?;
    write_manifest(stage, &StoreManifest::new(matrix.n_rows(), matrix.n_cols()))?;

    // The staging guard's cleanup finds nothing left once renamed.
    swap_into_place(stage, root, &parent)?;
    drop(staging);

    log::info!(
        "Created store {} ({} events x {} channels)",
        root.display(),
        matrix.n_rows(),
        matrix.n_cols()
    );
    Ok(())
}
