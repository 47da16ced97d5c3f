//! Error types for fitting and querying recommenders.

use data_loader::{MovieId, UserId};
use thiserror::Error;

/// Fatal failures raised by an algorithm while fitting or predicting
#[derive(Error, Debug)]
pub enum AlgorithmError {
    /// Nothing to learn from
    #[error("Cannot fit on an empty train set")]
    EmptyTrainSet,

    /// A hyper-parameter is out of its valid range
    #[error("Invalid value for parameter {name}: {value}")]
    InvalidParameter { name: String, value: String },

    /// The model produced NaN or infinity
    #[error("Non-finite estimate for user {user_id}, movie {movie_id}")]
    NonFiniteEstimate { user_id: UserId, movie_id: MovieId },

    /// A sampling distribution could not be built
    #[error("Distribution error: {0}")]
    Distribution(String),

    /// A tensor operation failed while training a network
    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),
}

/// Non-fatal signal that a model has no estimate for a pair
///
/// [`Model::predict`](crate::Model::predict) replaces it with the train set's
/// global mean and flags the prediction.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Prediction impossible: {reason}")]
pub struct PredictionImpossible {
    pub reason: &'static str,
}

impl PredictionImpossible {
    pub const UNKNOWN: PredictionImpossible = PredictionImpossible {
        reason: "user and/or item is unknown",
    };

    pub const NO_NEIGHBORS: PredictionImpossible = PredictionImpossible {
        reason: "not enough neighbors",
    };
}

pub type Result<T> = std::result::Result<T, AlgorithmError>;
