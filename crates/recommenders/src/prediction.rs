//! Prediction output types.

use data_loader::{MovieId, UserId};
use serde::Serialize;
use std::collections::BTreeMap;

/// An estimated rating for a (user, movie) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Known rating, `None` for anti-test pairs
    pub actual: Option<f32>,
    pub estimate: f32,
    /// The model had no estimate and the global mean was used
    pub was_impossible: bool,
}

/// A recommended movie with its estimated rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredItem {
    pub movie_id: MovieId,
    pub estimate: f32,
}

impl ScoredItem {
    pub fn new(movie_id: MovieId, estimate: f32) -> Self {
        Self { movie_id, estimate }
    }
}

/// Per-user recommendation lists, best first
pub type TopNLists = BTreeMap<UserId, Vec<ScoredItem>>;
