//! TOML configuration file support.
//!
//! Store settings can be kept in a file instead of being set in code:
//!
//! ```toml
//! # cytoframe.toml
//! [store]
//! preset = "balanced"        # "balanced" | "max_compression" | "fast_write"
//! compression = "zstd"       # "zstd" | "snappy" | "none"
//! compression_level = 9
//! row_group_size = 131072
//! batch_size = 65536
//! num_threads = 4
//! byte_stream_split = true
//!
//! [store.credentials]
//! access_key_id = "..."
//! secret_access_key = "..."
//! region = "us-east-1"
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::store::{CompressionType, ObjectStoreCredentials, StoreConfig};

/// Errors that can occur while loading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A value parsed but is not acceptable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure for cytoframe.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Store client settings.
    #[serde(default)]
    pub store: StoreSection,
}

/// Optional overrides for [`StoreConfig`].
#[derive(Debug, Default, Deserialize)]
pub struct StoreSection {
    /// Preset the overrides apply to.
    pub preset: Option<String>,

    /// Codec name.
    pub compression: Option<String>,

    /// ZSTD compression level (1-22).
    pub compression_level: Option<i32>,

    /// Events per matrix tile.
    pub row_group_size: Option<usize>,

    /// Rows per record batch when reading.
    pub batch_size: Option<usize>,

    /// I/O concurrency hint.
    pub num_threads: Option<usize>,

    /// BYTE_STREAM_SPLIT encoding of matrix columns.
    pub byte_stream_split: Option<bool>,

    /// Object-store credentials.
    pub credentials: Option<ObjectStoreCredentials>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Build the store configuration these settings describe.
    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        let s = &self.store;
        let mut config = match s.preset.as_deref() {
            None | Some("balanced") => StoreConfig::balanced(),
            Some("max_compression") => StoreConfig::max_compression(),
            Some("fast_write") => StoreConfig::fast_write(),
            Some(other) => return Err(ConfigError::Invalid(format!("unknown preset '{}'", other))),
        };

        if let Some(level) = s.compression_level {
            if !(1..=22).contains(&level) {
                return Err(ConfigError::Invalid(format!(
                    "compression_level must be 1-22, got {}",
                    level
                )));
            }
        }

        match s.compression.as_deref() {
            None => {
                if let (Some(level), CompressionType::Zstd(_)) = (s.compression_level, config.compression) {
                    config.compression = CompressionType::Zstd(level);
                }
            }
            Some("zstd") => {
                config.compression = CompressionType::Zstd(s.compression_level.unwrap_or(3));
            }
            Some("snappy") => config.compression = CompressionType::Snappy,
            Some("none") => config.compression = CompressionType::Uncompressed,
            Some(other) => {
                return Err(ConfigError::Invalid(format!("unknown compression '{}'", other)))
            }
        }

        if let Some(n) = s.row_group_size {
            if n == 0 {
                return Err(ConfigError::Invalid("row_group_size must be positive".to_string()));
            }
            config.row_group_size = n;
        }
        if let Some(n) = s.batch_size {
            if n == 0 {
                return Err(ConfigError::Invalid("batch_size must be positive".to_string()));
            }
            config.batch_size = n;
        }
        if let Some(n) = s.num_threads {
            config = config.with_num_threads(n);
        }
        if let Some(split) = s.byte_stream_split {
            config.use_byte_stream_split = split;
        }
        if let Some(credentials) = &s.credentials {
            config.credentials = Some(credentials.clone());
        }

        Ok(config)
    }
}
