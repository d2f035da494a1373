use std::path::{Path, PathBuf};

use csv::{ByteRecord, ReaderBuilder};
use tracing::debug;

use crate::error::{IngestError, Result};

/// A raw CSV file as trimmed strings.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub path: PathBuf,
    /// Headers as they appear in the file, trimmed and without a BOM.
    pub headers: Vec<String>,
    /// Data rows, padded or truncated to the header width.
    pub rows: Vec<Vec<String>>,
    /// Data rows skipped because a cell was not valid UTF-8.
    pub undecodable_rows: usize,
}

/// Normalizes a raw header to a snake-case key.
///
/// Splits camelCase where an uppercase letter follows a lowercase letter or a
/// digit, lowercases, turns whitespace and punctuation into single
/// underscores and trims leading and trailing separators.
///
/// ```
/// use fitpanel_ingest::normalize_header;
///
/// assert_eq!(normalize_header("TotalSteps"), "total_steps");
/// assert_eq!(normalize_header("\u{feff}Id"), "id");
/// assert_eq!(normalize_header("METs"), "mets");
/// ```
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}').trim();
    let mut normalized = String::with_capacity(trimmed.len() + 4);
    let mut previous: Option<char> = None;
    for ch in trimmed.chars() {
        if ch.is_alphanumeric() {
            let boundary = ch.is_uppercase()
                && previous.is_some_and(|prev| prev.is_lowercase() || prev.is_ascii_digit());
            if boundary {
                push_separator(&mut normalized);
            }
            normalized.extend(ch.to_lowercase());
        } else {
            push_separator(&mut normalized);
        }
        previous = Some(ch);
    }
    normalized.trim_end_matches('_').to_string()
}

fn push_separator(normalized: &mut String) {
    if !normalized.is_empty() && !normalized.ends_with('_') {
        normalized.push('_');
    }
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').trim().to_string()
}

/// Reads a CSV file whose first non-blank row is the header.
///
/// Blank rows are skipped. A file with no rows at all is an error; a file with
/// only a header yields an empty table.
pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| IngestError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    let mut undecodable_rows = 0;
    for record in reader.byte_records() {
        let record = record.map_err(|source| IngestError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?;
        match &headers {
            None => {
                let row: Vec<String> = record
                    .iter()
                    .map(|field| normalize_cell(&String::from_utf8_lossy(field)))
                    .collect();
                if !row.iter().all(String::is_empty) {
                    headers = Some(row);
                }
            }
            Some(header_row) => {
                let Some(mut row) = decode_row(&record) else {
                    undecodable_rows += 1;
                    continue;
                };
                if row.iter().all(String::is_empty) {
                    continue;
                }
                row.resize(header_row.len(), String::new());
                rows.push(row);
            }
        }
    }
    if undecodable_rows > 0 {
        debug!(path = %path.display(), undecodable_rows, "skipped rows with invalid UTF-8");
    }

    let headers = headers.ok_or_else(|| IngestError::EmptyCsv {
        path: path.to_path_buf(),
    })?;
    Ok(CsvTable {
        path: path.to_path_buf(),
        headers,
        rows,
        undecodable_rows,
    })
}

/// Decodes every cell of a data row, `None` when any cell is not UTF-8.
fn decode_row(record: &ByteRecord) -> Option<Vec<String>> {
    record
        .iter()
        .map(|field| std::str::from_utf8(field).ok().map(normalize_cell))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_export_headers() {
        assert_eq!(normalize_header("ActivityDate"), "activity_date");
        assert_eq!(normalize_header("VeryActiveMinutes"), "very_active_minutes");
        assert_eq!(normalize_header("LogId"), "log_id");
        assert_eq!(normalize_header("WeightKg"), "weight_kg");
        assert_eq!(normalize_header("BMI"), "bmi");
        assert_eq!(normalize_header("IsManualReport"), "is_manual_report");
        assert_eq!(normalize_header("Steps00"), "steps00");
        assert_eq!(normalize_header("  Total   Steps "), "total_steps");
        assert_eq!(normalize_header("total__steps"), "total_steps");
        assert_eq!(normalize_header("-Total.Distance-"), "total_distance");
    }

    #[test]
    fn reads_table_with_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sleepDay_merged.csv");
        std::fs::write(
            &path,
            "\u{feff}Id,SleepDay,TotalMinutesAsleep\n\n1503960366, 4/12/2016 ,327\n1503960366,4/13/2016\n",
        )
        .unwrap();

        let table = read_csv_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Id", "SleepDay", "TotalMinutesAsleep"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "4/12/2016");
        assert_eq!(table.rows[1], vec!["1503960366", "4/13/2016", ""]);
    }

    #[test]
    fn rows_with_invalid_utf8_are_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dailyActivity_merged.csv");
        let mut bytes = b"Id,ActivityDate,Calories\n1,4/12/2016,1985\n2,4/12/2016,19".to_vec();
        bytes.push(0xFF);
        bytes.extend_from_slice(b"\n3,4/12/2016,1432\n");
        std::fs::write(&path, bytes).unwrap();

        let table = read_csv_table(&path).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.undecodable_rows, 1);
        assert_eq!(table.rows[1][0], "3");
    }

    #[test]
    fn empty_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "\n\n").unwrap();
        assert!(matches!(
            read_csv_table(&path),
            Err(IngestError::EmptyCsv { .. })
        ));
    }
}
