use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaBuilder, SchemaRef};

use super::columns;

/// Creates the matrix section schema: one non-nullable Float32 column per channel.
///
/// Columns are named by their 1-based store ordinal (`ch1`, `ch2`, ...), so
/// the schema carries the channel count but not the channel names, which
/// live in the params section.
///
/// # Example
///
/// ```
/// use cytoframe::schema::create_matrix_schema;
///
/// let schema = create_matrix_schema(3);
/// assert_eq!(schema.fields().len(), 3);
/// assert_eq!(schema.field(0).name(), "ch1");
/// ```
pub fn create_matrix_schema(n_cols: usize) -> Schema {
    let mut builder = SchemaBuilder::with_capacity(n_cols);
    for position in 0..n_cols {
        builder.push(Field::new(
            columns::matrix_column_name(position),
            DataType::Float32,
            false,
        ));
    }
    builder.finish()
}

/// Creates the matrix section schema wrapped in an Arc
pub fn create_matrix_schema_arc(n_cols: usize) -> SchemaRef {
    Arc::new(create_matrix_schema(n_cols))
}

/// Creates the params section schema.
///
/// One row per column. The channel name is a variable-length string; the
/// marker is attached to it in the same row; ranges are fixed-width Float64.
pub fn create_params_schema() -> Schema {
    let mut builder = SchemaBuilder::new();
    builder.push(Field::new(columns::CHANNEL, DataType::Utf8, false));
    builder.push(Field::new(columns::MARKER, DataType::Utf8, false));
    builder.push(Field::new(columns::INSTRUMENT_MIN, DataType::Float64, false));
    builder.push(Field::new(columns::INSTRUMENT_MAX, DataType::Float64, false));
    builder.push(Field::new(columns::DATA_MIN, DataType::Float64, false));
    builder.push(Field::new(columns::DATA_MAX, DataType::Float64, false));
    builder.finish()
}

/// Creates the params section schema wrapped in an Arc
pub fn create_params_schema_arc() -> SchemaRef {
    Arc::new(create_params_schema())
}

/// Creates the name/value schema shared by the keywords and pdata sections.
pub fn create_key_value_schema() -> Schema {
    let mut builder = SchemaBuilder::new();
    builder.push(Field::new(columns::NAME, DataType::Utf8, false));
    builder.push(Field::new(columns::VALUE, DataType::Utf8, false));
    builder.finish()
}

/// Creates the name/value schema wrapped in an Arc
pub fn create_key_value_schema_arc() -> SchemaRef {
    Arc::new(create_key_value_schema())
}
