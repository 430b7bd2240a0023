//! Read tabular input files into Arrow RecordBatches.

use std::fs::File;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::info;

use crate::error::StoreError;

/// Records sampled when sniffing CSV headers.
const CSV_SCHEMA_SAMPLE: usize = 1024;

/// A loaded table. The schema is kept even when there are no rows, so callers
/// can validate columns of a header-only file.
#[derive(Debug, Clone)]
pub struct Table {
    pub schema: SchemaRef,
    pub batches: Vec<RecordBatch>,
}

impl Table {
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }
}

/// Read a `.csv` or `.parquet` file.
///
/// CSV columns are all read as text, with a leading byte-order mark stripped
/// from the first header.
pub fn read_table(path: &Path) -> Result<Table, StoreError> {
    if !path.exists() {
        return Err(StoreError::FileNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let table = match extension.as_deref() {
        Some("csv") => read_csv(path)?,
        Some("parquet") => read_parquet(path)?,
        _ => return Err(StoreError::UnsupportedFormat(path.to_path_buf())),
    };

    info!(
        path = %path.display(),
        columns = table.schema.fields().len(),
        rows = table.num_rows(),
        "loaded table"
    );
    Ok(table)
}

fn read_csv(path: &Path) -> Result<Table, StoreError> {
    let mut file = File::open(path)?;
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, Some(CSV_SCHEMA_SAMPLE))?;
    file.rewind()?;

    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|f| Field::new(f.name().trim_start_matches('\u{feff}'), DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    if schema.fields().is_empty() {
        return Ok(Table {
            schema,
            batches: Vec::new(),
        });
    }

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .build(file)?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok(Table { schema, batches })
}

fn read_parquet(path: &Path) -> Result<Table, StoreError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    Ok(Table { schema, batches })
}
