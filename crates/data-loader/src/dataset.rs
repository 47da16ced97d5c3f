//! The immutable in-memory ratings table.
//!
//! A [`RatingsDataset`] is the leaf dependency of the whole workspace: every
//! split, every train set and every metric starts from it. Its invariants are
//! checked once in [`RatingsDataset::new`] and never re-checked afterwards.

use crate::error::{DataError, Result};
use crate::trainset::TrainSet;
use crate::types::{MovieId, Rating, RatingScale, UserId};
use std::collections::{HashMap, HashSet};

/// Set of ratings plus the popularity ranking derived from it.
///
/// Ratings keep their load order; anything that needs a deterministic
/// traversal (splits, train set indices) relies on it.
#[derive(Debug, Clone)]
pub struct RatingsDataset {
    ratings: Vec<Rating>,
    rating_scale: RatingScale,
    /// 1 = most rated movie
    popularity_ranks: HashMap<MovieId, u32>,
}

impl RatingsDataset {
    /// Build a dataset, validating that:
    /// - there is at least one rating
    /// - no (user, movie) pair is rated twice
    /// - every rating lies within `rating_scale`
    pub fn new(ratings: Vec<Rating>, rating_scale: RatingScale) -> Result<Self> {
        if ratings.is_empty() {
            return Err(DataError::EmptyDataset);
        }

        let mut seen: HashSet<(UserId, MovieId)> = HashSet::with_capacity(ratings.len());
        for rating in &ratings {
            if !seen.insert((rating.user_id, rating.movie_id)) {
                return Err(DataError::DuplicateRating {
                    user_id: rating.user_id,
                    movie_id: rating.movie_id,
                });
            }
            if !rating.rating.is_finite() || !rating_scale.contains(rating.rating) {
                return Err(DataError::InvalidValue {
                    field: "rating".to_string(),
                    value: rating.rating.to_string(),
                });
            }
        }

        let popularity_ranks = compute_popularity_ranks(&ratings);

        Ok(Self {
            ratings,
            rating_scale,
            popularity_ranks,
        })
    }

    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn rating_scale(&self) -> RatingScale {
        self.rating_scale
    }

    /// Popularity rank of every rated movie (1 = most popular)
    pub fn popularity_ranks(&self) -> &HashMap<MovieId, u32> {
        &self.popularity_ranks
    }

    pub fn popularity_rank(&self, movie_id: MovieId) -> Option<u32> {
        self.popularity_ranks.get(&movie_id).copied()
    }

    /// Number of distinct users
    pub fn num_users(&self) -> usize {
        self.ratings
            .iter()
            .map(|r| r.user_id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Train set over every rating in the dataset
    pub fn build_full_trainset(&self) -> TrainSet {
        TrainSet::from_ratings(&self.ratings, self.rating_scale)
    }
}

/// Rank movies by number of ratings, most rated first.
///
/// The sort is stable, so movies with the same count keep the order in which
/// they first appear in the ratings.
fn compute_popularity_ranks(ratings: &[Rating]) -> HashMap<MovieId, u32> {
    let mut counts: Vec<(MovieId, u32)> = Vec::new();
    let mut position: HashMap<MovieId, usize> = HashMap::new();

    for rating in ratings {
        let idx = *position.entry(rating.movie_id).or_insert_with(|| {
            counts.push((rating.movie_id, 0));
            counts.len() - 1
        });
        counts[idx].1 += 1;
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .enumerate()
        .map(|(rank, (movie_id, _))| (movie_id, rank as u32 + 1))
        .collect()
}
