//! Matrix factorization (Funk SVD with biases).
//!
//! ## Algorithm
//! `est(u, i) = mu + b_u + b_i + q_i . p_u`, learned by stochastic gradient
//! descent over the train ratings:
//!
//! ```text
//! err  = r_ui - est(u, i)
//! b_u += lr * (err - reg * b_u)
//! b_i += lr * (err - reg * b_i)
//! p_u += lr * (err * q_i - reg * p_u)
//! q_i += lr * (err * p_u - reg * q_i)
//! ```
//!
//! Unknown users or items simply drop the terms they cannot provide.

use crate::error::{AlgorithmError, PredictionImpossible, Result};
use crate::traits::{Algorithm, Model};
use data_loader::{MovieId, TrainSet, UserId};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Svd {
    n_factors: usize,
    n_epochs: usize,
    init_std: f32,
    learning_rate: f32,
    regularization: f32,
}

impl Svd {
    pub fn new() -> Self {
        Self {
            n_factors: 100,
            n_epochs: 20,
            init_std: 0.1,
            learning_rate: 0.005,
            regularization: 0.02,
        }
    }

    pub fn with_factors(mut self, n_factors: usize) -> Self {
        self.n_factors = n_factors;
        self
    }

    pub fn with_epochs(mut self, n_epochs: usize) -> Self {
        self.n_epochs = n_epochs;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_regularization(mut self, regularization: f32) -> Self {
        self.regularization = regularization;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.n_factors == 0 {
            return Err(AlgorithmError::InvalidParameter {
                name: "n_factors".to_string(),
                value: self.n_factors.to_string(),
            });
        }
        if !(self.learning_rate > 0.0) {
            return Err(AlgorithmError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: self.learning_rate.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Svd {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for Svd {
    fn name(&self) -> &str {
        "SVD"
    }

    fn fit(&self, trainset: Arc<TrainSet>, rng: &mut StdRng) -> Result<Box<dyn Model>> {
        self.validate()?;
        if trainset.is_empty() {
            return Err(AlgorithmError::EmptyTrainSet);
        }

        let f = self.n_factors;
        let init = Normal::new(0.0f32, self.init_std)
            .map_err(|e| AlgorithmError::Distribution(e.to_string()))?;

        let mut pu: Vec<f32> = (0..trainset.n_users() * f).map(|_| init.sample(rng)).collect();
        let mut qi: Vec<f32> = (0..trainset.n_items() * f).map(|_| init.sample(rng)).collect();
        let mut bu = vec![0.0f32; trainset.n_users()];
        let mut bi = vec![0.0f32; trainset.n_items()];
        let mu = trainset.global_mean();
        let (lr, reg) = (self.learning_rate, self.regularization);

        info!(
            "Training SVD: {} factors, {} epochs on {} ratings",
            f,
            self.n_epochs,
            trainset.n_ratings()
        );

        for epoch in 0..self.n_epochs {
            let mut squared_error = 0.0f64;
            for (u, i, r) in trainset.all_ratings() {
                let p = &mut pu[u * f..(u + 1) * f];
                let q = &mut qi[i * f..(i + 1) * f];

                let dot: f32 = p.iter().zip(q.iter()).map(|(a, b)| a * b).sum();
                let err = r - (mu + bu[u] + bi[i] + dot);
                squared_error += (err * err) as f64;

                bu[u] += lr * (err - reg * bu[u]);
                bi[i] += lr * (err - reg * bi[i]);

                for (puf, qif) in p.iter_mut().zip(q.iter_mut()) {
                    let (old_p, old_q) = (*puf, *qif);
                    *puf += lr * (err * old_q - reg * old_p);
                    *qif += lr * (err * old_p - reg * old_q);
                }
            }
            debug!(
                "SVD epoch {} train RMSE {:.4}",
                epoch,
                (squared_error / trainset.n_ratings() as f64).sqrt()
            );
        }

        Ok(Box::new(SvdModel {
            trainset,
            n_factors: f,
            pu,
            qi,
            bu,
            bi,
        }))
    }
}

struct SvdModel {
    trainset: Arc<TrainSet>,
    n_factors: usize,
    pu: Vec<f32>,
    qi: Vec<f32>,
    bu: Vec<f32>,
    bi: Vec<f32>,
}

impl Model for SvdModel {
    fn trainset(&self) -> &TrainSet {
        &self.trainset
    }

    fn estimate(
        &mut self,
        user_id: UserId,
        movie_id: MovieId,
    ) -> std::result::Result<f32, PredictionImpossible> {
        let f = self.n_factors;
        let uid = self.trainset.to_inner_uid(user_id);
        let iid = self.trainset.to_inner_iid(movie_id);

        let mut est = self.trainset.global_mean();
        if let Some(u) = uid {
            est += self.bu[u];
        }
        if let Some(i) = iid {
            est += self.bi[i];
        }
        if let (Some(u), Some(i)) = (uid, iid) {
            est += self.pu[u * f..(u + 1) * f]
                .iter()
                .zip(&self.qi[i * f..(i + 1) * f])
                .map(|(a, b)| a * b)
                .sum::<f32>();
        }
        Ok(est)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Rating, RatingScale};
    use rand::SeedableRng;

    /// Two user "tastes": odd users love movies 1-5, even users love 6-10
    fn trainset() -> Arc<TrainSet> {
        let mut ratings = Vec::new();
        for user in 1..=30u32 {
            for movie in 1..=10u32 {
                if (user + movie) % 3 == 0 {
                    continue; // leave holes to predict
                }
                let likes = (user % 2 == 1) == (movie <= 5);
                ratings.push(Rating::new(user, movie, if likes { 5.0 } else { 1.0 }));
            }
        }
        Arc::new(TrainSet::from_ratings(&ratings, RatingScale::MOVIELENS))
    }

    #[test]
    fn test_learns_taste_groups() {
        let svd = Svd::new().with_factors(5).with_epochs(100).with_learning_rate(0.02);
        let mut model = svd.fit(trainset(), &mut StdRng::seed_from_u64(10)).unwrap();

        // user 1 + movie 2 is a hole; user 1 is odd and movie 2 <= 5
        let liked = model.predict(1, 2, None).unwrap().estimate;
        // user 1 + movie 8 is a hole too
        let disliked = model.predict(1, 8, None).unwrap().estimate;
        assert!(liked > disliked, "liked {} vs disliked {}", liked, disliked);
    }

    #[test]
    fn test_unknown_user_uses_item_bias() {
        let mut model = Svd::new()
            .with_epochs(5)
            .fit(trainset(), &mut StdRng::seed_from_u64(10))
            .unwrap();

        let p = model.predict(999, 1, None).unwrap();
        assert!(!p.was_impossible);
        assert!((1.0..=5.0).contains(&p.estimate));
    }

    #[test]
    fn test_deterministic_with_seed() {
        let svd = Svd::new().with_epochs(3);
        let mut a = svd.fit(trainset(), &mut StdRng::seed_from_u64(4)).unwrap();
        let mut b = svd.fit(trainset(), &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(a.estimate(3, 7), b.estimate(3, 7));
    }

    #[test]
    fn test_invalid_parameters() {
        let trainset = trainset();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Svd::new().with_factors(0).fit(trainset.clone(), &mut rng).is_err());
        assert!(Svd::new().with_learning_rate(0.0).fit(trainset, &mut rng).is_err());
    }
}
