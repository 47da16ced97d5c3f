//! Neighborhood (KNN) collaborative filtering.
//!
//! ## Algorithm
//! Item-based: to estimate how user `u` rates item `i`, take the items `u`
//! has rated, keep the `k` most similar to `i`, and average their ratings
//! weighted by similarity. User-based does the same with the users who rated
//! `i`. Only neighbors with a positive similarity are used.

use crate::error::{AlgorithmError, PredictionImpossible, Result};
use crate::similarity::{CosineSimilarity, SimilarityMatrix, SimilaritySource};
use crate::traits::{Algorithm, Model};
use data_loader::{MovieId, TrainSet, UserId};
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct KnnBasic {
    /// Maximum number of neighbors (default: 40)
    k: usize,
    /// Minimum number of usable neighbors, below it the estimate is impossible (default: 1)
    min_k: usize,
    user_based: bool,
}

impl KnnBasic {
    /// Item-based KNN with default parameters
    pub fn new() -> Self {
        Self {
            k: 40,
            min_k: 1,
            user_based: false,
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_min_k(mut self, min_k: usize) -> Self {
        self.min_k = min_k;
        self
    }

    pub fn user_based(mut self, user_based: bool) -> Self {
        self.user_based = user_based;
        self
    }
}

impl Default for KnnBasic {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for KnnBasic {
    fn name(&self) -> &str {
        if self.user_based { "UserKNN" } else { "ItemKNN" }
    }

    fn fit(&self, trainset: Arc<TrainSet>, _rng: &mut StdRng) -> Result<Box<dyn Model>> {
        if trainset.is_empty() {
            return Err(AlgorithmError::EmptyTrainSet);
        }
        if self.k == 0 {
            return Err(AlgorithmError::InvalidParameter {
                name: "k".to_string(),
                value: self.k.to_string(),
            });
        }

        let sims = CosineSimilarity {
            user_based: self.user_based,
        }
        .similarities(&trainset)?;
        debug!("{} fitted with {} similarity rows", self.name(), sims.len());

        Ok(Box::new(KnnModel {
            trainset,
            sims,
            k: self.k,
            min_k: self.min_k,
            user_based: self.user_based,
        }))
    }
}

struct KnnModel {
    trainset: Arc<TrainSet>,
    sims: SimilarityMatrix,
    k: usize,
    min_k: usize,
    user_based: bool,
}

impl Model for KnnModel {
    fn trainset(&self) -> &TrainSet {
        &self.trainset
    }

    fn estimate(
        &mut self,
        user_id: UserId,
        movie_id: MovieId,
    ) -> std::result::Result<f32, PredictionImpossible> {
        let (Some(uid), Some(iid)) = (
            self.trainset.to_inner_uid(user_id),
            self.trainset.to_inner_iid(movie_id),
        ) else {
            return Err(PredictionImpossible::UNKNOWN);
        };

        // x is the entity we look for neighbors of, the ratings come through y
        let (x, y_ratings) = if self.user_based {
            (uid, self.trainset.item_ratings(iid))
        } else {
            (iid, self.trainset.user_ratings(uid))
        };

        let mut neighbors: Vec<(f32, f32)> = y_ratings
            .iter()
            .map(|&(other, rating)| (self.sims.by_inner(x, other), rating))
            .collect();
        neighbors.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut sum_sim = 0.0f32;
        let mut sum_ratings = 0.0f32;
        let mut actual_k = 0;
        for &(sim, rating) in neighbors.iter().take(self.k) {
            if sim > 0.0 {
                sum_sim += sim;
                sum_ratings += sim * rating;
                actual_k += 1;
            }
        }

        if actual_k < self.min_k || sum_sim == 0.0 {
            return Err(PredictionImpossible::NO_NEIGHBORS);
        }
        Ok(sum_ratings / sum_sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Rating, RatingScale};
    use rand::SeedableRng;

    fn trainset() -> Arc<TrainSet> {
        let ratings = vec![
            Rating::new(1, 10, 5.0),
            Rating::new(1, 20, 4.0),
            Rating::new(2, 10, 4.0),
            Rating::new(2, 20, 4.0),
            Rating::new(2, 30, 2.0),
            Rating::new(3, 30, 1.0),
            Rating::new(3, 40, 1.0),
        ];
        Arc::new(TrainSet::from_ratings(&ratings, RatingScale::MOVIELENS))
    }

    #[test]
    fn test_item_based_estimate_is_weighted_average() {
        let mut model = KnnBasic::new()
            .fit(trainset(), &mut StdRng::seed_from_u64(0))
            .unwrap();

        // User 1 rated 10 and 20; item 30 is similar to both through user 2
        let est = model.estimate(1, 30).unwrap();
        assert!(est >= 4.0 && est <= 5.0);
    }

    #[test]
    fn test_unknown_user_is_impossible() {
        let mut model = KnnBasic::new()
            .fit(trainset(), &mut StdRng::seed_from_u64(0))
            .unwrap();

        assert_eq!(model.estimate(99, 10), Err(PredictionImpossible::UNKNOWN));
        let p = model.predict(99, 10, None).unwrap();
        assert!(p.was_impossible);
    }

    #[test]
    fn test_no_positive_neighbor_is_impossible() {
        let mut model = KnnBasic::new()
            .fit(trainset(), &mut StdRng::seed_from_u64(0))
            .unwrap();

        // User 1 never co-rated anything with item 40's raters
        assert_eq!(model.estimate(1, 40), Err(PredictionImpossible::NO_NEIGHBORS));
    }

    #[test]
    fn test_user_based() {
        let mut model = KnnBasic::new()
            .user_based(true)
            .fit(trainset(), &mut StdRng::seed_from_u64(0))
            .unwrap();

        // User 1's only neighbor who rated 30 is user 2, who gave it 2.0
        let est = model.estimate(1, 30).unwrap();
        assert!((est - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_k_rejected() {
        let result = KnnBasic::new()
            .with_k(0)
            .fit(trainset(), &mut StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(AlgorithmError::InvalidParameter { .. })));
    }
}
