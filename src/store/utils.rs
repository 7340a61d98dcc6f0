use arrow::array::{Array, Float32Array, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;

use super::StoreError;

/// Get a required Float32 column by name.
pub(super) fn get_float32_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a Float32Array, StoreError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::InvalidFormat(format!("missing column {}", name)))?
        .as_any()
        .downcast_ref::<Float32Array>()
        .ok_or_else(|| StoreError::InvalidFormat(format!("{} is not Float32", name)))
}

/// Get a required Float64 column by name.
pub(super) fn get_float64_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a Float64Array, StoreError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::InvalidFormat(format!("missing column {}", name)))?
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| StoreError::InvalidFormat(format!("{} is not Float64", name)))
}

/// Get a required Utf8 column by name.
pub(super) fn get_string_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a StringArray, StoreError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::InvalidFormat(format!("missing column {}", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| StoreError::InvalidFormat(format!("{} is not Utf8", name)))
}

/// Null-tolerant string access.
pub(super) fn string_at(array: &StringArray, idx: usize) -> String {
    if array.is_null(idx) {
        String::new()
    } else {
        array.value(idx).to_string()
    }
}

/// Null-tolerant float access, nulls read back as 0.
pub(super) fn float64_at(array: &Float64Array, idx: usize) -> f64 {
    if array.is_null(idx) {
        0.0
    } else {
        array.value(idx)
    }
}
