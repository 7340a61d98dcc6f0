/// cytoframe store format version - follows semantic versioning
pub const CYTOFRAME_FORMAT_VERSION: &str = "1.0.0";

/// Extension used for auto-generated store directories
pub const TILE_EXTENSION: &str = "tile";

/// Manifest file at the root of every store
pub const MANIFEST_FILE: &str = "manifest.json";

/// Metadata key for format version in every section's Parquet footer
pub const KEY_FORMAT_VERSION: &str = "cytoframe:format_version";

/// Metadata key naming the section a Parquet file belongs to
pub const KEY_SECTION: &str = "cytoframe:section";

/// Metadata key declaring the number of entries in the params section
pub const KEY_PARAM_COUNT: &str = "cytoframe:param_count";

/// Metadata key for writer software info
pub const KEY_WRITER_INFO: &str = "cytoframe:writer_info";
