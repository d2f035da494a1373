//! The analysis contract and the inputs every analysis reads.

use std::collections::{BTreeMap, BTreeSet};

use fitpanel_model::{DailyActivityRecord, Dataset, SleepRecord};
use fitpanel_store::{CleanedStore, select_keys};
use polars::prelude::DataFrame;
use tracing::debug;

use crate::error::Result;
use crate::extract::{activity_records, sleep_records};

/// One result table computed from cleaned tables.
///
/// The aggregator checks [`requires`](Analysis::requires) before calling
/// [`compute`](Analysis::compute); when a required dataset is absent it
/// writes [`empty`](Analysis::empty) instead.
pub trait Analysis: Send + Sync {
    /// Result table name, also the output file stem.
    fn name(&self) -> &'static str;

    /// Cleaned datasets that must be present.
    fn requires(&self) -> &'static [Dataset];

    /// Datasets whose whole table [`compute`](Analysis::compute) reads
    /// through [`AnalysisInputs::frame`]. Every other present table is only
    /// available as its key columns.
    fn reads(&self) -> &'static [Dataset] {
        self.requires()
    }

    fn compute(&self, inputs: &AnalysisInputs) -> Result<DataFrame>;

    /// The result schema with no rows.
    fn empty(&self) -> Result<DataFrame>;
}

/// Datasets always fetched whole, because the shared records come from them.
const RECORD_DATASETS: [Dataset; 2] = [Dataset::DailyActivity, Dataset::SleepDay];

/// Cleaned tables fetched once per run, plus the typed records most
/// analyses share.
///
/// Whole tables are held only for datasets some analysis reads; the rest
/// keep just their id and time columns.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInputs {
    frames: BTreeMap<Dataset, DataFrame>,
    keys: BTreeMap<Dataset, DataFrame>,
    activity: Vec<DailyActivityRecord>,
    sleep: Vec<SleepRecord>,
}

impl AnalysisInputs {
    /// Fetches `reads` whole and every other present dataset as key columns.
    pub fn from_store(store: &dyn CleanedStore, reads: &BTreeSet<Dataset>) -> Result<Self> {
        let mut frames = BTreeMap::new();
        let mut keys = BTreeMap::new();
        for dataset in store.datasets() {
            if reads.contains(&dataset) || RECORD_DATASETS.contains(&dataset) {
                let frame = store.get(dataset)?;
                debug!(dataset = %dataset, rows = frame.height(), "fetched cleaned table");
                keys.insert(dataset, select_keys(dataset, &frame)?);
                frames.insert(dataset, frame);
            } else {
                let frame = store.get_keys(dataset)?;
                debug!(dataset = %dataset, rows = frame.height(), "fetched key columns");
                keys.insert(dataset, frame);
            }
        }
        Self::new(frames, keys)
    }

    /// Holds every frame whole.
    pub fn from_frames(frames: BTreeMap<Dataset, DataFrame>) -> Result<Self> {
        let keys = frames
            .iter()
            .map(|(dataset, frame)| -> Result<(Dataset, DataFrame)> {
                Ok((*dataset, select_keys(*dataset, frame)?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Self::new(frames, keys)
    }

    fn new(
        frames: BTreeMap<Dataset, DataFrame>,
        keys: BTreeMap<Dataset, DataFrame>,
    ) -> Result<Self> {
        let activity = match frames.get(&Dataset::DailyActivity) {
            Some(frame) => activity_records(frame)?,
            None => Vec::new(),
        };
        let sleep = match frames.get(&Dataset::SleepDay) {
            Some(frame) => sleep_records(frame)?,
            None => Vec::new(),
        };
        Ok(Self {
            frames,
            keys,
            activity,
            sleep,
        })
    }

    pub fn contains(&self, dataset: Dataset) -> bool {
        self.keys.contains_key(&dataset)
    }

    /// The whole table, when `dataset` was fetched whole.
    pub fn frame(&self, dataset: Dataset) -> Option<&DataFrame> {
        self.frames.get(&dataset)
    }

    /// Id and time columns of any present dataset.
    pub fn keys(&self, dataset: Dataset) -> Option<&DataFrame> {
        self.keys.get(&dataset)
    }

    /// Key columns of every present dataset, in registry order.
    pub fn datasets(&self) -> impl Iterator<Item = (Dataset, &DataFrame)> {
        self.keys.iter().map(|(dataset, frame)| (*dataset, frame))
    }

    pub fn activity(&self) -> &[DailyActivityRecord] {
        &self.activity
    }

    pub fn sleep(&self) -> &[SleepRecord] {
        &self.sleep
    }
}
