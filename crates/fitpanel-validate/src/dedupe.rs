use std::collections::HashSet;

use fitpanel_common::{any_to_string, row_key};
use polars::prelude::{DataFrame, PolarsResult};

/// Keep-mask dropping rows whose every cell equals an earlier row's.
pub fn exact_duplicate_mask(df: &DataFrame) -> PolarsResult<Vec<bool>> {
    let mut seen = HashSet::with_capacity(df.height());
    let mut keep = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        keep.push(seen.insert(row_key(df, idx)?));
    }
    Ok(keep)
}

/// Keep-mask dropping rows whose `keys` repeat an earlier row's.
pub fn key_duplicate_mask(df: &DataFrame, keys: &[&str]) -> PolarsResult<Vec<bool>> {
    let key_columns = keys
        .iter()
        .map(|name| df.column(name))
        .collect::<PolarsResult<Vec<_>>>()?;
    let mut seen = HashSet::with_capacity(df.height());
    let mut keep = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let mut composite = String::new();
        for (pos, column) in key_columns.iter().enumerate() {
            if pos > 0 {
                composite.push('|');
            }
            composite.push_str(&any_to_string(column.get(idx)?));
        }
        keep.push(seen.insert(composite));
    }
    Ok(keep)
}

#[cfg(test)]
mod tests {
    use fitpanel_common::{f64_column, string_column};

    use super::*;

    fn frame() -> DataFrame {
        let ids = ["1", "1", "1", "2"];
        let dates = ["2016-04-12", "2016-04-12", "2016-04-12", "2016-04-12"];
        DataFrame::new(vec![
            string_column("id", ids.iter().map(|v| Some(v.to_string())).collect()),
            string_column("date", dates.iter().map(|v| Some(v.to_string())).collect()),
            f64_column("steps", vec![Some(10.0), Some(10.0), Some(11.0), Some(10.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn exact_duplicates_keep_first() {
        assert_eq!(
            exact_duplicate_mask(&frame()).unwrap(),
            vec![true, false, true, true]
        );
    }

    #[test]
    fn key_duplicates_keep_first() {
        assert_eq!(
            key_duplicate_mask(&frame(), &["id", "date"]).unwrap(),
            vec![true, false, false, true]
        );
    }

    #[test]
    fn missing_key_column_is_an_error() {
        assert!(key_duplicate_mask(&frame(), &["id", "timestamp"]).is_err());
    }
}
