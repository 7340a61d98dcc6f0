//! Store column names as constants for type safety

// params section
/// Instrument channel name (variable-length string)
pub const CHANNEL: &str = "channel";
/// Marker label attached to the channel
pub const MARKER: &str = "marker";
/// Lower instrument range bound
pub const INSTRUMENT_MIN: &str = "instrument_min";
/// Upper instrument range bound
pub const INSTRUMENT_MAX: &str = "instrument_max";
/// Lower observed data bound
pub const DATA_MIN: &str = "data_min";
/// Upper observed data bound
pub const DATA_MAX: &str = "data_max";

// keywords and pdata sections
/// Entry name
pub const NAME: &str = "name";
/// Entry value
pub const VALUE: &str = "value";

/// Prefix of the matrix section's per-channel columns
pub const MATRIX_COLUMN_PREFIX: &str = "ch";

/// Store-side name of a matrix column from its 0-based frame position
///
/// The store numbers channels from 1: position 0 is `ch1`.
pub fn matrix_column_name(position: usize) -> String {
    format!("{}{}", MATRIX_COLUMN_PREFIX, position + 1)
}

/// 0-based frame position of a store-side matrix column name
pub fn matrix_column_position(name: &str) -> Option<usize> {
    let ordinal: usize = name.strip_prefix(MATRIX_COLUMN_PREFIX)?.parse().ok()?;
    ordinal.checked_sub(1)
}
