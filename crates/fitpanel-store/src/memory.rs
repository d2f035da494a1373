use std::collections::BTreeMap;

use fitpanel_model::Dataset;
use polars::prelude::DataFrame;

use crate::error::Result;
use crate::store::CleanedStore;

/// In-process store used by dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: BTreeMap<Dataset, DataFrame>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CleanedStore for MemoryStore {
    fn put(&mut self, dataset: Dataset, frame: DataFrame) -> Result<()> {
        self.tables.insert(dataset, frame);
        Ok(())
    }

    fn get(&self, dataset: Dataset) -> Result<DataFrame> {
        Ok(self
            .tables
            .get(&dataset)
            .cloned()
            .unwrap_or_else(DataFrame::empty))
    }

    fn contains(&self, dataset: Dataset) -> bool {
        self.tables.contains_key(&dataset)
    }

    fn datasets(&self) -> Vec<Dataset> {
        self.tables.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use fitpanel_common::f64_column;

    use super::*;

    #[test]
    fn put_replaces_and_absent_reads_empty() {
        let mut store = MemoryStore::new();
        assert!(!store.contains(Dataset::SleepDay));
        assert_eq!(store.get(Dataset::SleepDay).unwrap().height(), 0);

        let first = DataFrame::new(vec![f64_column("minutes_asleep", vec![Some(1.0)])]).unwrap();
        let second =
            DataFrame::new(vec![f64_column("minutes_asleep", vec![Some(2.0), Some(3.0)])]).unwrap();
        store.put(Dataset::SleepDay, first).unwrap();
        store.put(Dataset::SleepDay, second).unwrap();
        assert!(store.contains(Dataset::SleepDay));
        assert_eq!(store.get(Dataset::SleepDay).unwrap().height(), 2);
        assert_eq!(store.datasets(), vec![Dataset::SleepDay]);
    }
}
