//! Core traits every recommender implements.
//!
//! An [`Algorithm`] is a recipe with hyper-parameters; fitting it on a
//! [`TrainSet`] produces a [`Model`] that can estimate ratings. The evaluation
//! harness only ever talks to these two traits.

use crate::error::{AlgorithmError, PredictionImpossible, Result};
use crate::prediction::Prediction;
use data_loader::{MovieId, Rating, TrainSet, UserId, UserItemPair};
use rand::rngs::StdRng;
use std::sync::Arc;

/// A trainable rating predictor.
///
/// `fit` may be called any number of times; each call returns an independent
/// model and leaves `self` untouched. Stochastic algorithms draw all their
/// randomness from `rng`, so a fixed seed gives a reproducible model.
pub trait Algorithm {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn fit(&self, trainset: Arc<TrainSet>, rng: &mut StdRng) -> Result<Box<dyn Model>>;
}

/// A fitted model.
pub trait Model {
    /// The train set this model was fitted on
    fn trainset(&self) -> &TrainSet;

    /// Raw estimate for a pair, before clipping.
    ///
    /// Takes `&mut self` so models that sample (the random baseline) can
    /// advance their own generator.
    fn estimate(
        &mut self,
        user_id: UserId,
        movie_id: MovieId,
    ) -> std::result::Result<f32, PredictionImpossible>;

    /// Estimate clipped to the rating scale, falling back to the global mean
    fn predict(
        &mut self,
        user_id: UserId,
        movie_id: MovieId,
        actual: Option<f32>,
    ) -> Result<Prediction> {
        let (estimate, was_impossible) = match self.estimate(user_id, movie_id) {
            Ok(est) => (est, false),
            Err(_) => (self.trainset().global_mean(), true),
        };

        if !estimate.is_finite() {
            return Err(AlgorithmError::NonFiniteEstimate { user_id, movie_id });
        }

        Ok(Prediction {
            user_id,
            movie_id,
            actual,
            estimate: self.trainset().rating_scale().clip(estimate),
            was_impossible,
        })
    }

    /// Predict every rating of a test set
    fn predict_ratings(&mut self, ratings: &[Rating]) -> Result<Vec<Prediction>> {
        ratings
            .iter()
            .map(|r| self.predict(r.user_id, r.movie_id, Some(r.rating)))
            .collect()
    }

    /// Predict every pair of an anti-test set
    fn predict_pairs(&mut self, pairs: &[UserItemPair]) -> Result<Vec<Prediction>> {
        pairs
            .iter()
            .map(|&(user_id, movie_id)| self.predict(user_id, movie_id, None))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::RatingScale;

    /// Returns a fixed estimate for known users, nothing otherwise
    struct FixedModel {
        trainset: TrainSet,
        value: f32,
    }

    impl Model for FixedModel {
        fn trainset(&self) -> &TrainSet {
            &self.trainset
        }

        fn estimate(
            &mut self,
            user_id: UserId,
            _movie_id: MovieId,
        ) -> std::result::Result<f32, PredictionImpossible> {
            self.trainset
                .to_inner_uid(user_id)
                .map(|_| self.value)
                .ok_or(PredictionImpossible::UNKNOWN)
        }
    }

    fn model(value: f32) -> FixedModel {
        let ratings = vec![Rating::new(1, 1, 2.0), Rating::new(1, 2, 4.0)];
        FixedModel {
            trainset: TrainSet::from_ratings(&ratings, RatingScale::MOVIELENS),
            value,
        }
    }

    #[test]
    fn test_predict_clips_to_scale() {
        let mut model = model(9.0);
        let prediction = model.predict(1, 3, Some(4.0)).unwrap();
        assert_eq!(prediction.estimate, 5.0);
        assert!(!prediction.was_impossible);
        assert_eq!(prediction.actual, Some(4.0));
    }

    #[test]
    fn test_impossible_falls_back_to_global_mean() {
        let mut model = model(4.5);
        let prediction = model.predict(42, 1, None).unwrap();
        assert_eq!(prediction.estimate, 3.0);
        assert!(prediction.was_impossible);
    }

    #[test]
    fn test_non_finite_is_an_error() {
        let mut model = model(f32::NAN);
        let result = model.predict(1, 1, None);
        assert!(matches!(
            result,
            Err(AlgorithmError::NonFiniteEstimate { user_id: 1, movie_id: 1 })
        ));
    }

    #[test]
    fn test_predict_pairs_keeps_order() {
        let mut model = model(3.5);
        let predictions = model.predict_pairs(&[(1, 5), (1, 3), (1, 4)]).unwrap();
        let movies: Vec<MovieId> = predictions.iter().map(|p| p.movie_id).collect();
        assert_eq!(movies, vec![5, 3, 4]);
        assert!(predictions.iter().all(|p| p.actual.is_none()));
    }
}
