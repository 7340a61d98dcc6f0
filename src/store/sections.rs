//! Section readers and writers.
//!
//! Every write goes to a hidden temporary file inside the section directory
//! and is persisted over the final name, so readers never observe a
//! half-written section.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, Float64Array, StringArray};
use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use super::config::StoreConfig;
use super::utils::{float64_at, get_float64_column, get_string_column, string_at};
use super::StoreError;
use crate::matrix::EventMatrix;
use crate::metadata::{ColumnDescriptor, Keywords, PhenoData, ValueRange};
use crate::schema::{
    columns, create_key_value_schema_arc, create_matrix_schema_arc, create_params_schema_arc,
    Section, StoreManifest, KEY_PARAM_COUNT, MANIFEST_FILE,
};

fn write_section<I>(
    root: &Path,
    section: Section,
    schema: SchemaRef,
    batches: I,
    props: WriterProperties,
) -> Result<(), StoreError>
where
    I: IntoIterator<Item = Result<RecordBatch, StoreError>>,
{
    let dir = section.dir(root);
    fs::create_dir_all(&dir)?;

    let tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(&dir)?;
    let file = tmp.as_file().try_clone()?;

    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    for batch in batches {
        writer.write(&batch?)?;
    }
    writer.close()?;

    tmp.persist(section.path(root))
        .map_err(|e| StoreError::IoError(e.error))?;
    log::debug!("Wrote {} section under {}", section, root.display());
    Ok(())
}

/// Read a whole section into one batch, together with its footer metadata
fn read_section(
    root: &Path,
    section: Section,
) -> Result<(RecordBatch, HashMap<String, String>), StoreError> {
    let file = File::open(section.path(root))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let footer: HashMap<String, String> = builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .map(|kvs| {
            kvs.iter()
                .filter_map(|kv| kv.value.as_ref().map(|v| (kv.key.clone(), v.clone())))
                .collect()
        })
        .unwrap_or_default();

    let schema = builder.schema().clone();
    let batches = builder.build()?.collect::<Result<Vec<_>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;
    Ok((batch, footer))
}

/// Write the event matrix, one row group per `row_group_size` events
pub fn write_matrix(root: &Path, matrix: &EventMatrix, config: &StoreConfig) -> Result<(), StoreError> {
    if matrix.n_cols() == 0 {
        return Err(StoreError::Unsupported(
            "cannot store a matrix without channels".to_string(),
        ));
    }

    let schema = create_matrix_schema_arc(matrix.n_cols());
    let n_rows = matrix.n_rows();
    let step = config.row_group_size.max(1);

    let batches = (0..n_rows).step_by(step).map(|start| {
        let end = (start + step).min(n_rows);
        let arrays: Vec<ArrayRef> = matrix
            .columns()
            .map(|column| {
                Arc::new(Float32Array::from_iter_values(
                    column[start..end].iter().map(|&v| v as f32),
                )) as ArrayRef
            })
            .collect();
        RecordBatch::try_new(schema.clone(), arrays).map_err(StoreError::from)
    });

    write_section(
        root,
        Section::Matrix,
        schema.clone(),
        batches,
        config.to_writer_properties(Section::Matrix, &[]),
    )
}

/// Write the column descriptors
pub fn write_params(
    root: &Path,
    params: &[ColumnDescriptor],
    config: &StoreConfig,
) -> Result<(), StoreError> {
    let schema = create_params_schema_arc();

    let range_column = |f: fn(&ColumnDescriptor) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(params.iter().map(f)))
    };
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(params.iter().map(|p| p.channel.as_str()))),
        Arc::new(StringArray::from_iter_values(params.iter().map(|p| p.marker.as_str()))),
        range_column(|p| p.instrument_range.min),
        range_column(|p| p.instrument_range.max),
        range_column(|p| p.data_range.min),
        range_column(|p| p.data_range.max),
    ];
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let props = config.to_writer_properties(
        Section::Params,
        &[(KEY_PARAM_COUNT, params.len().to_string())],
    );
    write_section(root, Section::Params, schema, [Ok(batch)], props)
}

fn write_pairs<'a, I>(
    root: &Path,
    section: Section,
    pairs: I,
    config: &StoreConfig,
) -> Result<(), StoreError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let (names, values): (Vec<&str>, Vec<&str>) = pairs.into_iter().unzip();
    let schema = create_key_value_schema_arc();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(names)) as ArrayRef,
            Arc::new(StringArray::from_iter_values(values)) as ArrayRef,
        ],
    )?;
    let props = config.to_writer_properties(section, &[]);
    write_section(root, section, schema, [Ok(batch)], props)
}

/// Write the keyword pairs in order
pub fn write_keywords(root: &Path, keywords: &Keywords, config: &StoreConfig) -> Result<(), StoreError> {
    write_pairs(root, Section::Keywords, keywords.iter(), config)
}

/// Write the phenotype attributes
pub fn write_pheno(root: &Path, pheno: &PhenoData, config: &StoreConfig) -> Result<(), StoreError> {
    write_pairs(root, Section::PhenoData, pheno.iter(), config)
}

/// Read the column descriptors.
///
/// The footer's declared parameter count is checked against the number of
/// channel names actually stored; a disagreement is a
/// [`StoreError::SchemaInconsistency`].
pub fn read_params(root: &Path) -> Result<Vec<ColumnDescriptor>, StoreError> {
    let (batch, footer) = read_section(root, Section::Params)?;

    let channels = get_string_column(&batch, columns::CHANNEL)?;
    let markers = get_string_column(&batch, columns::MARKER)?;
    let instrument_min = get_float64_column(&batch, columns::INSTRUMENT_MIN)?;
    let instrument_max = get_float64_column(&batch, columns::INSTRUMENT_MAX)?;
    let data_min = get_float64_column(&batch, columns::DATA_MIN)?;
    let data_max = get_float64_column(&batch, columns::DATA_MAX)?;

    let stored = channels.value_offsets().len().saturating_sub(1);
    let declared = match footer.get(KEY_PARAM_COUNT) {
        Some(raw) => raw.parse::<usize>().map_err(|_| {
            StoreError::InvalidFormat(format!("{} is not a count: {}", KEY_PARAM_COUNT, raw))
        })?,
        None => stored,
    };
    if declared != stored {
        return Err(StoreError::SchemaInconsistency(format!(
            "params declare {} channels but {} are stored",
            declared, stored
        )));
    }

    Ok((0..stored)
        .map(|i| ColumnDescriptor {
            channel: string_at(channels, i),
            marker: string_at(markers, i),
            instrument_range: ValueRange::new(
                float64_at(instrument_min, i),
                float64_at(instrument_max, i),
            ),
            data_range: ValueRange::new(float64_at(data_min, i), float64_at(data_max, i)),
        })
        .collect())
}

fn read_pairs(root: &Path, section: Section) -> Result<Vec<(String, String)>, StoreError> {
    let (batch, _) = read_section(root, section)?;
    let names = get_string_column(&batch, columns::NAME)?;
    let values = get_string_column(&batch, columns::VALUE)?;
    Ok((0..batch.num_rows())
        .map(|i| (string_at(names, i), string_at(values, i)))
        .collect())
}

/// Read the keyword pairs in stored order
pub fn read_keywords(root: &Path) -> Result<Keywords, StoreError> {
    Ok(Keywords::from(read_pairs(root, Section::Keywords)?))
}

/// Read the phenotype attributes
pub fn read_pheno(root: &Path) -> Result<PhenoData, StoreError> {
    Ok(read_pairs(root, Section::PhenoData)?.into_iter().collect())
}

/// Write `manifest.json` atomically
pub fn write_manifest(root: &Path, manifest: &StoreManifest) -> Result<(), StoreError> {
    fs::create_dir_all(root)?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".manifest")
        .suffix(".tmp")
        .tempfile_in(root)?;
    std::io::Write::write_all(&mut tmp, manifest.to_json()?.as_bytes())?;
    tmp.persist(root.join(MANIFEST_FILE))
        .map_err(|e| StoreError::IoError(e.error))?;
    Ok(())
}

/// Read `manifest.json`
pub fn read_manifest(root: &Path) -> Result<StoreManifest, StoreError> {
    let json = fs::read_to_string(root.join(MANIFEST_FILE))?;
    Ok(StoreManifest::from_json(&json)?)
}
