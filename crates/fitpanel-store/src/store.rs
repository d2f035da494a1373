use fitpanel_common::has_column;
use fitpanel_model::Dataset;
use polars::prelude::{DataFrame, PolarsResult};

use crate::error::Result;

/// Whole-table storage for cleaned datasets.
///
/// `put` replaces a table wholesale; there are no partial updates and no
/// cross-table transactions. `get` on an absent table yields an empty frame.
pub trait CleanedStore {
    fn put(&mut self, dataset: Dataset, frame: DataFrame) -> Result<()>;

    fn get(&self, dataset: Dataset) -> Result<DataFrame>;

    /// Only the id and time columns of `dataset`.
    fn get_keys(&self, dataset: Dataset) -> Result<DataFrame> {
        Ok(select_keys(dataset, &self.get(dataset)?)?)
    }

    fn contains(&self, dataset: Dataset) -> bool;

    /// Datasets currently held, in registry order.
    fn datasets(&self) -> Vec<Dataset>;
}

/// Projects `df` onto whichever of `dataset`'s key columns it has.
pub fn select_keys(dataset: Dataset, df: &DataFrame) -> PolarsResult<DataFrame> {
    let present: Vec<&str> = dataset
        .key_columns()
        .into_iter()
        .filter(|column| has_column(df, column))
        .collect();
    df.select(present)
}
