//! Library side of the `fitpanel` binary: logging setup and the staged pipeline.

pub mod logging;
pub mod pipeline;

pub use pipeline::{PipelineOptions, PipelineOutcome, run_analysis, run_pipeline};
