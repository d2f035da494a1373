use fitpanel_model::Dataset;
use fitpanel_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The table every analysis anchors on is absent.
    #[error("mandatory table '{dataset}' is missing from the cleaned store")]
    MissingMandatoryTable { dataset: Dataset },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for AnalysisError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
