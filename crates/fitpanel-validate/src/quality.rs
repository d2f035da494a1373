use fitpanel_common::optional_f64s;
use fitpanel_model::columns;
use polars::prelude::{DataFrame, PolarsResult};

/// Counts nights with sleep efficiency above 1.
///
/// Such rows are legal and kept; they are reported as a data-quality note.
pub fn sleep_efficiency_outliers(df: &DataFrame) -> PolarsResult<usize> {
    Ok(optional_f64s(df, columns::SLEEP_EFFICIENCY)?
        .map(|values| {
            values
                .into_iter()
                .filter(|value| value.is_some_and(|value| value > 1.0))
                .count()
        })
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use fitpanel_common::f64_column;

    use super::*;

    #[test]
    fn counts_only_values_above_one() {
        let df = DataFrame::new(vec![f64_column(
            "sleep_efficiency",
            vec![Some(0.9), Some(1.0), Some(1.05), None],
        )])
        .unwrap();
        assert_eq!(sleep_efficiency_outliers(&df).unwrap(), 1);
        assert_eq!(sleep_efficiency_outliers(&DataFrame::empty()).unwrap(), 0);
    }
}
