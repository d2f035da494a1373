//! CSV encoding of frames and atomic file writes.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use fitpanel_common::{bool_column, column_strings, f64_column, parse_f64};
use fitpanel_model::{ColumnKind, Dataset};
use polars::prelude::{
    Column, CsvReadOptions, CsvWriter, DataFrame, PlSmallStr, SerReader, SerWriter,
};

use crate::error::{Result, StoreError};

/// Encodes `df` as CSV with a header row.
pub fn frame_to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut df = df.clone();
    let mut bytes = Vec::new();
    CsvWriter::new(&mut bytes)
        .include_header(true)
        .finish(&mut df)?;
    Ok(bytes)
}

/// Writes `bytes` to `<path>.tmp`, then renames it over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io("create directory", parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!("{file_name}.tmp"));
    let mut file = File::create(&temp_path).map_err(|e| StoreError::io("create", &temp_path, e))?;
    file.write_all(bytes)
        .map_err(|e| StoreError::io("write", &temp_path, e))?;
    file.sync_all()
        .map_err(|e| StoreError::io("sync", &temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| StoreError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })
}

/// Reads a CSV file with every column as a string.
pub fn read_string_frame(path: &Path) -> Result<DataFrame> {
    read_strings(path, None)
}

/// Reads only `columns` of a CSV file, each as a string.
///
/// Every listed column must be in the header.
pub fn read_string_columns(path: &Path, columns: &[&str]) -> Result<DataFrame> {
    read_strings(path, Some(columns.iter().map(|c| PlSmallStr::from(*c)).collect()))
}

fn read_strings(path: &Path, columns: Option<Arc<[PlSmallStr]>>) -> Result<DataFrame> {
    let len = fs::metadata(path)
        .map_err(|e| StoreError::io("read", path, e))?
        .len();
    if len == 0 {
        return Ok(DataFrame::empty());
    }

    let csv_error = |e: polars::prelude::PolarsError| StoreError::Csv {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_columns(columns)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(csv_error)?
        .finish()
        .map_err(csv_error)
}

/// Restores column types of a string frame from `dataset`'s column kinds.
pub fn restore_types(dataset: Dataset, df: &DataFrame, path: &Path) -> Result<DataFrame> {
    let mut restored: Vec<Column> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let name = column.name().as_str();
        match dataset.column_kind(name) {
            ColumnKind::Text | ColumnKind::Time => restored.push(column.clone()),
            ColumnKind::Numeric => {
                let values = column_strings(df, name)?
                    .into_iter()
                    .map(|value| parse_cell(value, path, name, parse_f64))
                    .collect::<Result<Vec<_>>>()?;
                restored.push(f64_column(name, values));
            }
            ColumnKind::Boolean => {
                let values = column_strings(df, name)?
                    .into_iter()
                    .map(|value| parse_cell(value, path, name, |text| text.trim().parse::<bool>().ok()))
                    .collect::<Result<Vec<_>>>()?;
                restored.push(bool_column(name, values));
            }
        }
    }
    Ok(DataFrame::new(restored)?)
}

fn parse_cell<T>(
    value: Option<String>,
    path: &Path,
    column: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>> {
    match value {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => parse(&text).map(Some).ok_or_else(|| StoreError::InvalidValue {
            path: path.to_path_buf(),
            column: column.to_string(),
            value: text,
        }),
    }
}
