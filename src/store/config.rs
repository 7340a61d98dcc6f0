use std::fmt;

use parquet::basic::{Compression, Encoding, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;
use serde::{Deserialize, Serialize};

use crate::schema::{
    manifest::writer_info, Section, CYTOFRAME_FORMAT_VERSION, KEY_FORMAT_VERSION, KEY_SECTION,
    KEY_WRITER_INFO,
};

/// Compression options for store sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// ZSTD at the given level (1-22)
    Zstd(i32),
    /// Snappy
    Snappy,
    /// Sections are written as-is
    Uncompressed,
}

impl Default for CompressionType {
    fn default() -> Self {
        Self::Zstd(3)
    }
}

impl CompressionType {
    /// ZSTD level 22, for archived stores
    pub fn max_compression() -> Self {
        Self::Zstd(22)
    }

    /// ZSTD level 3
    pub fn balanced() -> Self {
        Self::Zstd(3)
    }

    /// Snappy, for scratch copies
    pub fn fast() -> Self {
        Self::Snappy
    }
}

/// Access credentials for object-store backed locations
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStoreCredentials {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Region of the bucket
    pub region: String,
}

impl fmt::Debug for ObjectStoreCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Configuration for the tiled store client
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Compression type to use for every section
    pub compression: CompressionType,

    /// Events per matrix tile (Parquet row group)
    /// Smaller = finer parallel reads, larger = better compression
    pub row_group_size: usize,

    /// Parquet data page limit, in bytes
    pub data_page_size: usize,

    /// Write per-chunk min/max statistics
    pub write_statistics: bool,

    /// Enable BYTE_STREAM_SPLIT encoding for the matrix's Float32 columns.
    pub use_byte_stream_split: bool,

    /// Rows per record batch when reading
    pub batch_size: usize,

    /// I/O concurrency hint: matrix reads use this many threads
    pub num_threads: usize,

    /// Credentials for object-store locations
    pub credentials: Option<ObjectStoreCredentials>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::Zstd(3),
            // 64k events per tile
            row_group_size: 65_536,
            // 1MB data pages
            data_page_size: 1024 * 1024,
            write_statistics: true,
            use_byte_stream_split: true,
            batch_size: 65_536,
            num_threads: 1,
            credentials: None,
        }
    }
}

impl StoreConfig {
    /// Large tiles and ZSTD level 22
    pub fn max_compression() -> Self {
        Self {
            compression: CompressionType::Zstd(22),
            row_group_size: 262_144,
            data_page_size: 2 * 1024 * 1024,
            ..Self::default()
        }
    }

    /// Small tiles and Snappy, used for temporary copies
    pub fn fast_write() -> Self {
        Self {
            compression: CompressionType::Snappy,
            row_group_size: 32_768,
            data_page_size: 512 * 1024,
            ..Self::default()
        }
    }

    /// Same as [`StoreConfig::default`]
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Set the I/O concurrency hint
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads.max(1);
        self
    }

    /// Set the events per matrix tile
    pub fn with_row_group_size(mut self, row_group_size: usize) -> Self {
        self.row_group_size = row_group_size.max(1);
        self
    }

    /// Attach object-store credentials
    pub fn with_credentials(mut self, credentials: ObjectStoreCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Create writer properties for one section
    pub(crate) fn to_writer_properties(
        &self,
        section: Section,
        extra_metadata: &[(&str, String)],
    ) -> WriterProperties {
        let compression = match self.compression {
            CompressionType::Zstd(level) => {
                Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or_default())
            }
            CompressionType::Snappy => Compression::SNAPPY,
            CompressionType::Uncompressed => Compression::UNCOMPRESSED,
        };

        let statistics = if self.write_statistics {
            EnabledStatistics::Chunk
        } else {
            EnabledStatistics::None
        };

        let mut builder = WriterProperties::builder()
            .set_compression(compression)
            .set_data_page_size_limit(self.data_page_size)
            .set_statistics_enabled(statistics)
            .set_max_row_group_size(self.row_group_size);

        // Matrix columns are plain floats, never dictionary encoded
        if section == Section::Matrix {
            builder = builder.set_dictionary_enabled(false);
            if self.use_byte_stream_split {
                builder = builder.set_encoding(Encoding::BYTE_STREAM_SPLIT);
            }
        }

        let mut kv_metadata = vec![
            KeyValue {
                key: KEY_FORMAT_VERSION.to_string(),
                value: Some(CYTOFRAME_FORMAT_VERSION.to_string()),
            },
            KeyValue {
                key: KEY_SECTION.to_string(),
                value: Some(section.dir_name().to_string()),
            },
            KeyValue {
                key: KEY_WRITER_INFO.to_string(),
                value: Some(writer_info()),
            },
        ];
        kv_metadata.extend(extra_metadata.iter().map(|(k, v)| KeyValue {
            key: k.to_string(),
            value: Some(v.clone()),
        }));

        builder = builder.set_key_value_metadata(Some(kv_metadata));

        builder.build()
    }
}
