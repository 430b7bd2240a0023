//! Result sink: persists classification results and category weights.
//!
//! Every result table has the columns `Requirement_1, Requirement_2,
//! Conflict_Type, Conflict_Reason`. Bulk results are written as CSV and XLSX
//! side by side; incremental results get a timestamped CSV each.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::csv::WriterBuilder;
use chrono::Local;
use reqconflict_core::{CategoryWeights, ClassificationResult, results};
use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::error::StoreError;

const SHEET_NAME: &str = "Conflicts";
const TEXT_COLUMN_WIDTH: f64 = 60.0;
const TYPE_COLUMN_WIDTH: f64 = 24.0;

/// Files written by [`ResultSink::write_results`].
#[derive(Debug, Clone, PartialEq)]
pub struct SinkPaths {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
}

/// Writes result artifacts under one output directory.
#[derive(Debug, Clone)]
pub struct ResultSink {
    dir: PathBuf,
}

impl ResultSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `<name>.csv` and `<name>.xlsx` concurrently.
    ///
    /// A trailing `.csv` or `.xlsx` on `name` is ignored.
    pub async fn write_results(
        &self,
        name: &str,
        rows: &[ClassificationResult],
    ) -> Result<SinkPaths, StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let base = base_name(name);
        let paths = SinkPaths {
            csv: self.dir.join(format!("{base}.csv")),
            xlsx: self.dir.join(format!("{base}.xlsx")),
        };

        let csv_task = {
            let path = paths.csv.clone();
            let rows = rows.to_vec();
            tokio::task::spawn_blocking(move || write_csv(&path, &rows))
        };
        let xlsx_task = {
            let path = paths.xlsx.clone();
            let rows = rows.to_vec();
            tokio::task::spawn_blocking(move || write_xlsx(&path, &rows))
        };

        let (csv, xlsx) = tokio::try_join!(csv_task, xlsx_task)?;
        csv?;
        xlsx?;

        info!(
            rows = rows.len(),
            csv = %paths.csv.display(),
            xlsx = %paths.xlsx.display(),
            "results written"
        );
        Ok(paths)
    }

    /// Write `<name>_<suffix>.csv`.
    pub fn write_csv_named(
        &self,
        name: &str,
        suffix: &str,
        rows: &[ClassificationResult],
    ) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}_{suffix}.csv", base_name(name)));
        write_csv(&path, rows)?;
        info!(rows = rows.len(), path = %path.display(), "table written");
        Ok(path)
    }

    /// Write `<name>_incremental_<YYYYMMDD_HHMMSS>.csv`.
    ///
    /// A numeric suffix is appended if a file from the same second exists.
    pub fn write_incremental(
        &self,
        name: &str,
        rows: &[ClassificationResult],
    ) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let stem = format!(
            "{}_incremental_{}",
            base_name(name),
            Local::now().format("%Y%m%d_%H%M%S")
        );

        let mut path = self.dir.join(format!("{stem}.csv"));
        let mut n = 1;
        while path.exists() {
            n += 1;
            path = self.dir.join(format!("{stem}_{n}.csv"));
        }

        write_csv(&path, rows)?;
        info!(rows = rows.len(), path = %path.display(), "incremental results written");
        Ok(path)
    }

    /// Write `<name>_weights.json`.
    pub fn write_weights(&self, name: &str, weights: &CategoryWeights) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}_weights.json", base_name(name)));
        std::fs::write(&path, weights.to_json()?)?;
        info!(path = %path.display(), "category weights written");
        Ok(path)
    }
}

/// Load weights saved by [`ResultSink::write_weights`].
pub fn read_weights(path: &Path) -> Result<CategoryWeights, StoreError> {
    if !path.exists() {
        return Err(StoreError::FileNotFound(path.to_path_buf()));
    }
    let json = std::fs::read_to_string(path)?;
    Ok(CategoryWeights::from_json(&json)?)
}

fn base_name(name: &str) -> &str {
    name.strip_suffix(".csv")
        .or_else(|| name.strip_suffix(".xlsx"))
        .unwrap_or(name)
}

fn write_csv(path: &Path, rows: &[ClassificationResult]) -> Result<(), StoreError> {
    let batch = results::to_batch(rows)?;
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(&batch)?;
    Ok(())
}

fn write_xlsx(path: &Path, rows: &[ClassificationResult]) -> Result<(), StoreError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in (0u16..).zip(results::COLUMNS) {
        sheet.write_string_with_format(0, col, name, &header)?;
    }
    sheet.set_column_width(0, TEXT_COLUMN_WIDTH)?;
    sheet.set_column_width(1, TEXT_COLUMN_WIDTH)?;
    sheet.set_column_width(2, TYPE_COLUMN_WIDTH)?;
    sheet.set_column_width(3, TEXT_COLUMN_WIDTH)?;

    for (idx, r) in rows.iter().enumerate() {
        let row = u32::try_from(idx + 1)
            .map_err(|_| StoreError::Other(format!("too many rows for a worksheet: {}", rows.len())))?;
        sheet.write_string(row, 0, &r.requirement_1)?;
        sheet.write_string(row, 1, &r.requirement_2)?;
        sheet.write_string(row, 2, r.category.label())?;
        sheet.write_string(row, 3, &r.reason)?;
    }

    workbook.save(path)?;
    Ok(())
}
