//! Error types for the evaluation harness.

use data_loader::DataError;
use recommenders::AlgorithmError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    /// The dataset could not be split or validated
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Too few ratings to give both the train and the test set one
    #[error("Dataset has {count} rating(s); a train/test split needs at least 2")]
    TooFewRatings { count: usize },

    /// An algorithm failed while fitting or predicting; the run is aborted
    #[error("Algorithm '{name}' failed: {source}")]
    Algorithm {
        name: String,
        #[source]
        source: AlgorithmError,
    },

    /// A configuration value is out of range
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EvalError>;
