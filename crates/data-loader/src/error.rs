//! Error types for the data-loader crate.
//!
//! Every failure that comes from malformed or empty input data ends up here,
//! whether it was raised while parsing a `.dat` file or while checking the
//! invariants of a [`RatingsDataset`](crate::RatingsDataset).

use crate::types::{MovieId, UserId};
use thiserror::Error;

/// Errors that can occur while loading or validating ratings data
#[derive(Error, Debug)]
pub enum DataError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// A dataset needs at least one rating
    #[error("Dataset contains no ratings")]
    EmptyDataset,

    /// The same user rated the same movie twice
    #[error("Duplicate rating by user {user_id} for movie {movie_id}")]
    DuplicateRating { user_id: UserId, movie_id: MovieId },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataError>;
