use fitpanel_model::{Dataset, DropReason, TableReport, ValidationConfig};
use polars::prelude::{BooleanChunked, DataFrame, NewChunkedArray, PolarsResult};
use tracing::{debug, warn};

use crate::dedupe::{exact_duplicate_mask, key_duplicate_mask};
use crate::rules::rules_for;

/// Applies bound rules and duplicate removal to loaded tables.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validates `df`, recording drops in `report`.
    ///
    /// Order: bound rules, exact duplicates, then `(id, time)` key duplicates.
    /// The first row of any duplicate group is kept. `report.output_rows` is
    /// set to the returned height.
    pub fn validate(
        &self,
        dataset: Dataset,
        df: DataFrame,
        report: &mut TableReport,
    ) -> PolarsResult<DataFrame> {
        let mut df = df;
        for rule in rules_for(dataset, &self.config) {
            let keep: Vec<bool> = rule
                .violations(&df)?
                .into_iter()
                .map(|violated| !violated)
                .collect();
            df = drop_rows(df, &keep, rule.reason(), dataset, report)?;
        }

        let keep = exact_duplicate_mask(&df)?;
        df = drop_rows(df, &keep, DropReason::ExactDuplicate, dataset, report)?;

        let keep = key_duplicate_mask(&df, &dataset.key_columns())?;
        df = drop_rows(df, &keep, DropReason::DuplicateKey, dataset, report)?;

        report.output_rows = df.height();
        debug!(dataset = %dataset, rows = df.height(), "validated table");
        Ok(df)
    }
}

fn drop_rows(
    df: DataFrame,
    keep: &[bool],
    reason: DropReason,
    dataset: Dataset,
    report: &mut TableReport,
) -> PolarsResult<DataFrame> {
    let dropped = keep.iter().filter(|kept| !**kept).count();
    if dropped == 0 {
        return Ok(df);
    }
    warn!(dataset = %dataset, reason = %reason, dropped, "dropped rows");
    report.record_drops(reason, dropped);
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    df.filter(&mask)
}
