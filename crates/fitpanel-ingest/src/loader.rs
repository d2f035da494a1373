//! Raw table loading.
//!
//! [`TableLoader`] turns one raw [`CsvTable`] into a typed frame: headers are
//! normalized and aliased, the time column is parsed and rendered in canonical
//! form, ids stay strings and every other column is coerced by its kind. Rows
//! that fail any coercion are dropped and counted.

use std::path::Path;

use fitpanel_common::{bool_column, f64_column, string_column};
use fitpanel_model::{
    ColumnKind, Dataset, DatasetRegistry, DatasetSpec, DropReason, PipelineConfig, TableReport,
    TimeKind, columns,
};
use fitpanel_transform::{DateTimeNormalizer, format_date, format_instant, parse_flag, parse_numeric};
use polars::prelude::{Column, DataFrame};
use tracing::{debug, warn};

use crate::csv_table::{CsvTable, normalize_header, read_csv_table};
use crate::error::{IngestError, Result};

/// A loaded table plus its parse-stage row accounting.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub dataset: Dataset,
    pub frame: DataFrame,
    pub report: TableReport,
}

/// Loads raw tables using a dataset registry and a datetime normalizer.
#[derive(Debug, Clone)]
pub struct TableLoader {
    registry: DatasetRegistry,
    normalizer: DateTimeNormalizer,
}

impl TableLoader {
    pub fn new(registry: DatasetRegistry, normalizer: DateTimeNormalizer) -> Self {
        Self {
            registry,
            normalizer,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            DatasetRegistry::standard(),
            DateTimeNormalizer::from_config(&config.datetime),
        )
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    /// Reads and coerces the raw file at `path`.
    pub fn load(&self, dataset: Dataset, path: &Path) -> Result<LoadedTable> {
        let table = read_csv_table(path)?;
        debug!(dataset = %dataset, path = %path.display(), rows = table.rows.len(), "read raw table");
        self.load_table(dataset, &table)
    }

    /// Coerces an already-read raw table.
    pub fn load_table(&self, dataset: Dataset, table: &CsvTable) -> Result<LoadedTable> {
        let spec = self
            .registry
            .get(dataset)
            .ok_or_else(|| IngestError::DataFrame {
                message: format!("dataset {dataset} is not registered"),
            })?;
        let names = canonical_headers(spec, &table.headers);
        for required in dataset.required_columns() {
            if !names.iter().any(|name| name == required) {
                return Err(IngestError::MissingColumn {
                    column: required.to_string(),
                    path: table.path.clone(),
                });
            }
        }

        let mut buffers: Vec<ColumnBuffer> = names
            .iter()
            .map(|name| ColumnBuffer::new(dataset.column_kind(name), table.rows.len()))
            .collect();

        let mut report = TableReport::new(dataset);
        report.source = Some(table.path.clone());
        report.input_rows = table.rows.len() + table.undecodable_rows;
        report.record_drops(DropReason::InvalidEncoding, table.undecodable_rows);

        let mut staged: Vec<Cell> = Vec::with_capacity(names.len());
        for row in &table.rows {
            staged.clear();
            match self.coerce_row(dataset, &names, row, &mut staged) {
                Ok(()) => {
                    for (buffer, cell) in buffers.iter_mut().zip(staged.drain(..)) {
                        buffer.push(cell);
                    }
                }
                Err(reason) => report.record_drops(reason, 1),
            }
        }

        let frame_columns: Vec<Column> = names
            .iter()
            .zip(buffers)
            .map(|(name, buffer)| buffer.into_column(name))
            .collect();
        let frame = DataFrame::new(frame_columns)?;
        report.output_rows = frame.height();

        if report.total_dropped() > 0 {
            warn!(
                dataset = %dataset,
                dropped = report.total_dropped(),
                kept = report.output_rows,
                "dropped unparseable rows"
            );
        }

        Ok(LoadedTable {
            dataset,
            frame,
            report,
        })
    }

    fn coerce_row(
        &self,
        dataset: Dataset,
        names: &[String],
        row: &[String],
        staged: &mut Vec<Cell>,
    ) -> std::result::Result<(), DropReason> {
        let time_column = dataset.time_column();
        for (name, raw) in names.iter().zip(row) {
            let cell = if name == columns::ID {
                let id = raw.trim_matches(|c| c == '"' || c == '\'').trim();
                if id.is_empty() {
                    return Err(DropReason::MissingId);
                }
                Cell::Text(Some(id.to_string()))
            } else if name == time_column {
                let instant = self
                    .normalizer
                    .parse(raw)
                    .map_err(|_| DropReason::UnparseableTimestamp)?;
                let canonical = match dataset.time_kind() {
                    TimeKind::Date => format_date(instant.date_naive()),
                    TimeKind::DateTime => format_instant(instant),
                };
                Cell::Text(Some(canonical))
            } else {
                coerce_value(dataset.column_kind(name), raw)?
            };
            staged.push(cell);
        }
        Ok(())
    }
}

/// Normalizes and aliases headers, suffixing repeats so names stay unique.
fn canonical_headers(spec: &DatasetSpec, headers: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(headers.len());
    for (idx, header) in headers.iter().enumerate() {
        let normalized = normalize_header(header);
        let base = if normalized.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            spec.canonical_column(&normalized)
        };
        let mut name = base.clone();
        let mut suffix = 2;
        while names.contains(&name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        names.push(name);
    }
    names
}

fn coerce_value(kind: ColumnKind, raw: &str) -> std::result::Result<Cell, DropReason> {
    let trimmed = raw.trim();
    match kind {
        ColumnKind::Text | ColumnKind::Time => {
            Ok(Cell::Text((!trimmed.is_empty()).then(|| trimmed.to_string())))
        }
        ColumnKind::Boolean if trimmed.is_empty() => Ok(Cell::Flag(None)),
        ColumnKind::Boolean => parse_flag(trimmed)
            .map(|flag| Cell::Flag(Some(flag)))
            .ok_or(DropReason::InvalidBoolean),
        ColumnKind::Numeric if trimmed.is_empty() => Ok(Cell::Number(None)),
        ColumnKind::Numeric => parse_numeric(trimmed)
            .map(|value| Cell::Number(Some(value)))
            .ok_or(DropReason::NonNumericValue),
    }
}

enum Cell {
    Text(Option<String>),
    Flag(Option<bool>),
    Number(Option<f64>),
}

enum ColumnBuffer {
    Text(Vec<Option<String>>),
    Flag(Vec<Option<bool>>),
    Number(Vec<Option<f64>>),
}

impl ColumnBuffer {
    fn new(kind: ColumnKind, capacity: usize) -> Self {
        match kind {
            ColumnKind::Text | ColumnKind::Time => Self::Text(Vec::with_capacity(capacity)),
            ColumnKind::Boolean => Self::Flag(Vec::with_capacity(capacity)),
            ColumnKind::Numeric => Self::Number(Vec::with_capacity(capacity)),
        }
    }

    fn push(&mut self, cell: Cell) {
        match (self, cell) {
            (Self::Text(values), Cell::Text(value)) => values.push(value),
            (Self::Flag(values), Cell::Flag(value)) => values.push(value),
            (Self::Number(values), Cell::Number(value)) => values.push(value),
            (Self::Text(values), _) => values.push(None),
            (Self::Flag(values), _) => values.push(None),
            (Self::Number(values), _) => values.push(None),
        }
    }

    fn into_column(self, name: &str) -> Column {
        match self {
            Self::Text(values) => string_column(name, values),
            Self::Flag(values) => bool_column(name, values),
            Self::Number(values) => f64_column(name, values),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use fitpanel_common::{column_bools, column_f64s, column_strings};
    use fitpanel_model::DropCategory;

    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> CsvTable {
        CsvTable {
            path: PathBuf::from("raw.csv"),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
            undecodable_rows: 0,
        }
    }

    fn loader() -> TableLoader {
        TableLoader::from_config(&PipelineConfig::default())
    }

    #[test]
    fn loads_sleep_with_aliases_and_canonical_dates() {
        let raw = table(
            &["Id", "SleepDay", "TotalSleepRecords", "TotalMinutesAsleep", "TotalTimeInBed"],
            &[
                &["1503960366", "4/12/2016 12:00:00 AM", "1", "327", "346"],
                &["1503960366", "4/13/2016 12:00:00 AM", "2", "384", "407"],
            ],
        );
        let loaded = loader().load_table(Dataset::SleepDay, &raw).unwrap();
        assert_eq!(
            loaded
                .frame
                .get_column_names()
                .iter()
                .map(|name| name.as_str())
                .collect::<Vec<_>>(),
            vec!["id", "date", "total_sleep_records", "minutes_asleep", "minutes_in_bed"]
        );
        assert_eq!(
            column_strings(&loaded.frame, "date").unwrap(),
            vec![Some("2016-04-12".to_string()), Some("2016-04-13".to_string())]
        );
        assert_eq!(
            column_f64s(&loaded.frame, "minutes_asleep").unwrap(),
            vec![Some(327.0), Some(384.0)]
        );
        assert!(loaded.report.is_balanced());
    }

    #[test]
    fn ids_stay_opaque_strings() {
        let raw = table(
            &["Id", "Time", "Value"],
            &[&["\"0015036960\"", "4/12/2016 7:21:00 AM", "97"]],
        );
        let loaded = loader().load_table(Dataset::HeartRateSeconds, &raw).unwrap();
        assert_eq!(
            column_strings(&loaded.frame, "id").unwrap(),
            vec![Some("0015036960".to_string())]
        );
        assert_eq!(
            column_strings(&loaded.frame, "timestamp").unwrap(),
            vec![Some("2016-04-12 07:21:00".to_string())]
        );
        assert_eq!(column_f64s(&loaded.frame, "bpm").unwrap(), vec![Some(97.0)]);
    }

    #[test]
    fn counts_parse_failures_per_reason() {
        let raw = table(
            &["Id", "Date", "WeightKg", "IsManualReport", "LogId"],
            &[
                &["1", "5/2/2016 11:59:59 PM", "52.6", "True", "1462233599000"],
                &["", "5/2/2016 11:59:59 PM", "52.6", "True", "1"],
                &["2", "someday", "52.6", "True", "2"],
                &["3", "5/3/2016 11:59:59 PM", "heavy", "True", "3"],
                &["4", "5/3/2016 11:59:59 PM", "60", "perhaps", "4"],
                &["5", "5/3/2016 11:59:59 PM", "1,060", "", ""],
            ],
        );
        let loaded = loader().load_table(Dataset::WeightLog, &raw).unwrap();
        let report = &loaded.report;
        assert_eq!(report.input_rows, 6);
        assert_eq!(report.output_rows, 2);
        assert_eq!(report.dropped[&DropReason::MissingId], 1);
        assert_eq!(report.dropped[&DropReason::UnparseableTimestamp], 1);
        assert_eq!(report.dropped[&DropReason::NonNumericValue], 1);
        assert_eq!(report.dropped[&DropReason::InvalidBoolean], 1);
        assert_eq!(report.dropped_in(DropCategory::ParseFailure), 4);

        assert_eq!(
            column_f64s(&loaded.frame, "weight_kg").unwrap(),
            vec![Some(52.6), Some(1060.0)]
        );
        assert_eq!(
            column_bools(&loaded.frame, "is_manual_report").unwrap(),
            vec![Some(true), None]
        );
        assert_eq!(
            column_strings(&loaded.frame, "log_id").unwrap(),
            vec![Some("1462233599000".to_string()), None]
        );
    }

    #[test]
    fn invalid_utf8_row_is_dropped_and_counted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hourlySteps_merged.csv");
        let mut bytes = b"Id,ActivityHour,StepTotal\n1,4/12/2016 1:00:00 AM,160\n".to_vec();
        bytes.extend_from_slice(b"1,4/12/2016 2:00:00 AM,1");
        bytes.push(0xFF);
        bytes.extend_from_slice(b"\n1,4/12/2016 3:00:00 AM,0\n");
        std::fs::write(&path, bytes).unwrap();

        let loaded = loader().load(Dataset::HourlySteps, &path).unwrap();
        let report = &loaded.report;
        assert_eq!(report.input_rows, 3);
        assert_eq!(report.output_rows, 2);
        assert_eq!(report.dropped[&DropReason::InvalidEncoding], 1);
        assert_eq!(report.dropped_in(DropCategory::ParseFailure), 1);
        assert!(report.is_balanced());
        assert_eq!(
            column_f64s(&loaded.frame, "steps").unwrap(),
            vec![Some(160.0), Some(0.0)]
        );
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let raw = table(&["Id", "SleepDay", "TotalMinutesAsleep"], &[]);
        let err = loader().load_table(Dataset::SleepDay, &raw).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn { ref column, .. } if column == "minutes_in_bed"));
    }

    #[test]
    fn header_only_file_loads_empty() {
        let raw = table(&["Id", "ActivityHour", "StepTotal"], &[]);
        let loaded = loader().load_table(Dataset::HourlySteps, &raw).unwrap();
        assert_eq!(loaded.frame.height(), 0);
        assert_eq!(loaded.frame.width(), 3);
    }

    #[test]
    fn repeated_headers_get_suffixes() {
        let spec = DatasetRegistry::standard();
        let spec = spec.get(Dataset::HourlySteps).unwrap();
        let names = canonical_headers(
            spec,
            &["Id".to_string(), "Steps".to_string(), "steps".to_string(), "".to_string()],
        );
        assert_eq!(names, vec!["id", "steps", "steps_2", "column_4"]);
    }
}
