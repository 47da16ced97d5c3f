//! Random baseline.
//!
//! Predicts a rating drawn from a normal distribution fitted to the train
//! set. Any real algorithm should beat it; it is also the sanity check for
//! the ranking metrics, since its hit rate should sit near `N / |catalog|`.

use crate::error::{AlgorithmError, PredictionImpossible, Result};
use crate::traits::{Algorithm, Model};
use data_loader::{MovieId, TrainSet, UserId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct NormalPredictor;

impl NormalPredictor {
    pub fn new() -> Self {
        Self
    }
}

impl Algorithm for NormalPredictor {
    fn name(&self) -> &str {
        "NormalPredictor"
    }

    fn fit(&self, trainset: Arc<TrainSet>, rng: &mut StdRng) -> Result<Box<dyn Model>> {
        if trainset.is_empty() {
            return Err(AlgorithmError::EmptyTrainSet);
        }

        let mean = trainset.global_mean() as f64;
        let variance = trainset
            .all_ratings()
            .map(|(_, _, r)| (r as f64 - mean).powi(2))
            .sum::<f64>()
            / trainset.n_ratings() as f64;

        let distribution = Normal::new(mean as f32, variance.sqrt() as f32)
            .map_err(|e| AlgorithmError::Distribution(e.to_string()))?;

        Ok(Box::new(NormalModel {
            trainset,
            distribution,
            rng: StdRng::seed_from_u64(rng.random()),
        }))
    }
}

struct NormalModel {
    trainset: Arc<TrainSet>,
    distribution: Normal<f32>,
    rng: StdRng,
}

impl Model for NormalModel {
    fn trainset(&self) -> &TrainSet {
        &self.trainset
    }

    fn estimate(
        &mut self,
        _user_id: UserId,
        _movie_id: MovieId,
    ) -> std::result::Result<f32, PredictionImpossible> {
        Ok(self.distribution.sample(&mut self.rng))
    }
}
