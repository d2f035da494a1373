use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::Table;
use fitpanel_cli::pipeline::{
    ANALYSIS_DIR, PipelineOptions, PipelineOutcome, run_analysis, run_pipeline,
};
use fitpanel_model::{DatasetRegistry, PipelineConfig, ResultSummary};
use tracing::{info, info_span};

use crate::cli::{AnalyzeArgs, PipelineArgs};
use crate::summary::apply_table_style;

/// Result of the `analyze` command.
pub struct AnalyzeResult {
    pub cleaned_dir: PathBuf,
    pub analysis_dir: Option<PathBuf>,
    pub results: Vec<ResultSummary>,
}

pub fn run_datasets() -> Result<()> {
    let registry = DatasetRegistry::standard();
    let mut table = Table::new();
    table.set_header(vec!["Dataset", "File pattern", "Time column", "Description"]);
    apply_table_style(&mut table);
    for spec in registry.specs() {
        let name = if spec.dataset.is_mandatory() {
            format!("{} *", spec.dataset)
        } else {
            spec.dataset.to_string()
        };
        table.add_row(vec![
            name,
            spec.file_pattern.clone(),
            spec.dataset.time_column().to_string(),
            spec.dataset.description().to_string(),
        ]);
    }
    println!("{table}");
    println!("* mandatory");
    Ok(())
}

pub fn run_pipeline_command(args: &PipelineArgs, analyze: bool) -> Result<PipelineOutcome> {
    let span = info_span!("run", raw_dir = %args.raw_dir.display(), analyze);
    let _guard = span.enter();
    let options = PipelineOptions {
        raw_dir: args.raw_dir.clone(),
        output_dir: args
            .output_dir
            .clone()
            .unwrap_or_else(|| args.raw_dir.join("output")),
        config: load_config(args.config.as_deref())?,
        dry_run: args.dry_run,
        analyze,
    };
    let outcome = run_pipeline(&options)?;
    if let Some(path) = &outcome.report_path {
        info!(path = %path.display(), "wrote run report");
    }
    Ok(outcome)
}

pub fn run_analyze(args: &AnalyzeArgs) -> Result<AnalyzeResult> {
    let span = info_span!("analyze", cleaned_dir = %args.cleaned_dir.display());
    let _guard = span.enter();
    let config = load_config(args.config.as_deref())?;
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => args
            .cleaned_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let analysis_dir = output_dir.join(ANALYSIS_DIR);
    let (output, written) =
        run_analysis(&args.cleaned_dir, &analysis_dir, &config, args.dry_run)?;
    Ok(AnalyzeResult {
        cleaned_dir: args.cleaned_dir.clone(),
        analysis_dir: written,
        results: output.summaries(),
    })
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let config = PipelineConfig::load(path)
        .with_context(|| format!("load config {}", path.display()))?;
    info!(path = %path.display(), "loaded config");
    Ok(config)
}
