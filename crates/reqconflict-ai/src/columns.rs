//! Arrow cell extraction shared by the corpus and label loaders.

use arrow::array::{Array, ArrayRef, LargeStringArray, StringArray};
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};

/// First of `candidates` present in `schema`, compared after trimming header whitespace.
pub(crate) fn find_column<'a>(schema: &Schema, candidates: &[&'a str]) -> Option<&'a str> {
    candidates.iter().copied().find(|name| {
        schema
            .fields()
            .iter()
            .any(|f| f.name().trim() == *name)
    })
}

/// Look up a column by trimmed header name.
pub(crate) fn column<'b>(batch: &'b RecordBatch, name: &str) -> Option<&'b ArrayRef> {
    let idx = batch
        .schema()
        .fields()
        .iter()
        .position(|f| f.name().trim() == name)?;
    Some(batch.column(idx))
}

pub(crate) fn column_names(schema: &Schema) -> Vec<String> {
    schema.fields().iter().map(|f| f.name().to_string()).collect()
}

/// Extract a cell as text (Utf8 and LargeUtf8 directly, other types via display).
///
/// Nulls and whitespace-only cells yield `None`. Text is otherwise returned
/// exactly as stored.
pub(crate) fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    let value = col
        .as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
        .or_else(|| {
            ArrayFormatter::try_new(col, &FormatOptions::default())
                .ok()
                .map(|f| f.value(row).to_string())
        })?;

    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
