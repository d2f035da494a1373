//! Cleaning and aggregation pipeline with explicit stages.
//!
//! 1. **Discover**: match raw CSV files to datasets
//! 2. **Clean**: load, validate and derive each table (in parallel)
//! 3. **Store**: hand cleaned tables to a [`CleanedStore`]
//! 4. **Aggregate**: compute result tables from the store
//! 5. **Report**: write result tables and `run_report.json`
//!
//! Each stage takes the output of the previous one and returns typed results.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use fitpanel_analysis::{AggregateOutput, Aggregator};
use fitpanel_ingest::{Discovery, LoadedTable, TableLoader, discover_datasets};
use fitpanel_model::{
    Dataset, DatasetFamily, FailedDataset, PipelineConfig, QualityNote, RunReport, TableReport,
};
use fitpanel_store::{CleanedStore, CsvStore, MemoryStore, ResultWriter, write_atomic};
use fitpanel_transform::derive_metrics;
use fitpanel_validate::{Validator, sleep_efficiency_outliers};
use polars::prelude::DataFrame;
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, error, info, info_span, warn};

pub const CLEANED_DIR: &str = "cleaned";
pub const ANALYSIS_DIR: &str = "analysis";
pub const RUN_REPORT_FILE: &str = "run_report.json";

// ============================================================================
// Stage 1: Discover
// ============================================================================

pub fn discover(raw_dir: &Path, loader: &TableLoader) -> Result<Discovery> {
    let discovery = discover_datasets(raw_dir, loader.registry())
        .with_context(|| format!("discover raw files in {}", raw_dir.display()))?;
    for path in &discovery.unmatched {
        debug!(path = %path.display(), "file matches no dataset");
    }
    for path in &discovery.duplicates {
        warn!(path = %path.display(), "ignoring second file for an already matched dataset");
    }
    Ok(discovery)
}

// ============================================================================
// Stage 2: Clean
// ============================================================================

/// A table after loading, validation and derivation.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    pub dataset: Dataset,
    pub frame: DataFrame,
    pub report: TableReport,
}

#[derive(Debug, Default)]
pub struct CleanOutcome {
    /// Cleaned tables in registry order.
    pub tables: Vec<CleanedTable>,
    pub failed: Vec<FailedDataset>,
}

impl CleanOutcome {
    pub fn contains(&self, dataset: Dataset) -> bool {
        self.tables.iter().any(|table| table.dataset == dataset)
    }

    pub fn reports(&self) -> Vec<TableReport> {
        self.tables.iter().map(|table| table.report.clone()).collect()
    }
}

/// Loads, validates and derives one table.
pub fn clean_table(
    loader: &TableLoader,
    validator: &Validator,
    dataset: Dataset,
    path: &Path,
) -> Result<CleanedTable> {
    let span = info_span!("clean", dataset = %dataset);
    let _guard = span.enter();
    let started = Instant::now();

    let LoadedTable {
        frame, mut report, ..
    } = loader
        .load(dataset, path)
        .with_context(|| format!("load {}", path.display()))?;
    let frame = validator
        .validate(dataset, frame, &mut report)
        .with_context(|| format!("validate {dataset}"))?;
    let frame = derive_metrics(dataset, frame).with_context(|| format!("derive {dataset}"))?;

    info!(
        input_rows = report.input_rows,
        dropped = report.total_dropped(),
        output_rows = report.output_rows,
        duration_ms = started.elapsed().as_millis() as u64,
        "cleaned table"
    );
    Ok(CleanedTable {
        dataset,
        frame,
        report,
    })
}

/// Cleans every discovered table in parallel.
///
/// A table that fails to load is recorded in `failed` and left out.
pub fn clean_tables(
    loader: &TableLoader,
    validator: &Validator,
    discovery: &Discovery,
) -> CleanOutcome {
    let results: Vec<(Dataset, Result<CleanedTable>)> = discovery
        .files
        .par_iter()
        .map(|(dataset, path)| (*dataset, clean_table(loader, validator, *dataset, path)))
        .collect();

    let mut outcome = CleanOutcome::default();
    for (dataset, result) in results {
        match result {
            Ok(table) => outcome.tables.push(table),
            Err(error) => {
                warn!(dataset = %dataset, error = %format!("{error:#}"), "dataset could not be cleaned");
                outcome.failed.push(FailedDataset {
                    dataset,
                    message: format!("{error:#}"),
                });
            }
        }
    }
    outcome.tables.sort_by_key(|table| table.dataset);
    outcome
}

/// Kept-but-suspicious observations worth surfacing in the run report.
pub fn quality_notes(tables: &[CleanedTable]) -> Result<Vec<QualityNote>> {
    let mut notes = Vec::new();
    for table in tables {
        if table.dataset.family() == DatasetFamily::Sleep {
            let count = sleep_efficiency_outliers(&table.frame)?;
            if count > 0 {
                warn!(dataset = %table.dataset, count, "sleep efficiency above 1");
                notes.push(QualityNote {
                    dataset: table.dataset,
                    message: "nights with sleep efficiency above 1 (asleep longer than in bed)"
                        .to_string(),
                    count,
                });
            }
        }
    }
    Ok(notes)
}

/// Fails when the mandatory dataset was not discovered or could not be cleaned.
pub fn ensure_mandatory(raw_dir: &Path, outcome: &CleanOutcome) -> Result<()> {
    for dataset in Dataset::ALL.into_iter().filter(|dataset| dataset.is_mandatory()) {
        if outcome.contains(dataset) {
            continue;
        }
        if let Some(failed) = outcome.failed.iter().find(|failed| failed.dataset == dataset) {
            bail!(
                "mandatory dataset '{dataset}' could not be cleaned: {}",
                failed.message
            );
        }
        bail!(
            "mandatory dataset '{dataset}' not found in {} (expected a file matching the daily activity export)",
            raw_dir.display()
        );
    }
    Ok(())
}

// ============================================================================
// Stage 3: Store
// ============================================================================

pub fn store_tables(store: &mut dyn CleanedStore, tables: Vec<CleanedTable>) -> Result<()> {
    for table in tables {
        store
            .put(table.dataset, table.frame)
            .with_context(|| format!("store {}", table.dataset))?;
    }
    Ok(())
}

// ============================================================================
// Stage 4-5: Aggregate and report
// ============================================================================

pub fn aggregate(store: &dyn CleanedStore, config: &PipelineConfig) -> Result<AggregateOutput> {
    Aggregator::new(config).run(store).context("aggregate")
}

pub fn write_results(dir: &Path, output: &AggregateOutput) -> Result<Vec<PathBuf>> {
    let writer = ResultWriter::create(dir).context("create analysis directory")?;
    let mut paths = Vec::with_capacity(output.tables.len());
    for table in &output.tables {
        let path = writer
            .write(table.name, &table.frame)
            .with_context(|| format!("write {}", table.name))?;
        paths.push(path);
    }
    info!(dir = %dir.display(), tables = paths.len(), "wrote result tables");
    Ok(paths)
}

pub fn write_run_report(path: &Path, report: &RunReport) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(report).context("serialize run report")?;
    bytes.push(b'\n');
    write_atomic(path, &bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

// ============================================================================
// Whole runs
// ============================================================================

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub raw_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config: PipelineConfig,
    /// Run every stage in memory and write nothing.
    pub dry_run: bool,
    /// Run the aggregate stage after cleaning.
    pub analyze: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub report: RunReport,
    pub cleaned_dir: Option<PathBuf>,
    pub analysis_dir: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
}

/// Raw directory to cleaned tables, and optionally to result tables.
pub fn run_pipeline(options: &PipelineOptions) -> Result<PipelineOutcome> {
    let config = &options.config;
    let loader = TableLoader::from_config(config);
    let validator = Validator::new(config.validation.clone());

    let started = Instant::now();
    let discovery = info_span!("discover", raw_dir = %options.raw_dir.display())
        .in_scope(|| discover(&options.raw_dir, &loader))?;
    let missing = discovery.missing(loader.registry());
    for dataset in &missing {
        warn!(dataset = %dataset, "dataset not found, treated as absent");
    }

    let outcome = clean_tables(&loader, &validator, &discovery);
    ensure_mandatory(&options.raw_dir, &outcome)?;
    let mut report = RunReport {
        tables: outcome.reports(),
        missing_datasets: missing,
        failed_datasets: outcome.failed.clone(),
        quality_notes: quality_notes(&outcome.tables)?,
        results: Vec::new(),
    };
    info!(
        tables = outcome.tables.len(),
        failed = outcome.failed.len(),
        dropped = report.total_dropped(),
        duration_ms = started.elapsed().as_millis() as u64,
        "cleaning complete"
    );

    if options.dry_run {
        let mut store = MemoryStore::new();
        store_tables(&mut store, outcome.tables)?;
        if options.analyze {
            report.results = aggregate(&store, config)?.summaries();
        }
        return Ok(PipelineOutcome {
            report,
            cleaned_dir: None,
            analysis_dir: None,
            report_path: None,
        });
    }

    let cleaned_dir = options.output_dir.join(CLEANED_DIR);
    let mut store = CsvStore::create(&cleaned_dir)
        .with_context(|| format!("prepare {}", cleaned_dir.display()))?;
    store_tables(&mut store, outcome.tables)?;
    store.write_manifest().context("write manifest")?;

    let analysis_dir = if options.analyze {
        let output = aggregate(&store, config)?;
        let dir = options.output_dir.join(ANALYSIS_DIR);
        write_results(&dir, &output)?;
        report.results = output.summaries();
        Some(dir)
    } else {
        None
    };

    let report_path = options.output_dir.join(RUN_REPORT_FILE);
    write_run_report(&report_path, &report)?;
    Ok(PipelineOutcome {
        report,
        cleaned_dir: Some(cleaned_dir),
        analysis_dir,
        report_path: Some(report_path),
    })
}

/// Aggregates an existing cleaned directory.
///
/// Returns the output and, unless `dry_run`, the directory results were
/// written to.
pub fn run_analysis(
    cleaned_dir: &Path,
    analysis_dir: &Path,
    config: &PipelineConfig,
    dry_run: bool,
) -> Result<(AggregateOutput, Option<PathBuf>)> {
    let store = CsvStore::open(cleaned_dir)
        .with_context(|| format!("open cleaned directory {}", cleaned_dir.display()))?;
    let output = aggregate(&store, config).inspect_err(|error| {
        error!(error = %format!("{error:#}"), "aggregation failed");
    })?;
    if dry_run {
        return Ok((output, None));
    }
    write_results(analysis_dir, &output)?;
    Ok((output, Some(analysis_dir.to_path_buf())))
}
