//! Evaluation splits derived from a ratings dataset.
//!
//! [`EvaluationData`] builds, once and deterministically from the configured
//! seed:
//! - the full train set (all ratings) for coverage/diversity/novelty
//! - a random train/test split for RMSE and MAE
//! - a leave-one-out split (one held-out rating per user) for hit rates
//! - the item similarity matrix used by the diversity metric
//!
//! Anti-test sets are derived on demand from the train sets and never cached.

use crate::config::EvaluationConfig;
use crate::error::{EvalError, Result};
use data_loader::{MovieId, Rating, RatingsDataset, TrainSet, UserId, UserItemPair};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use recommenders::{CosineSimilarity, SimilarityMatrix, SimilaritySource};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Shuffle `ratings` and split off `ceil(test_fraction * n)` as the test set.
///
/// With at least two ratings, both sides keep at least one rating.
/// Returns `(train, test)`.
pub fn split_train_test(
    ratings: &[Rating],
    test_fraction: f64,
    rng: &mut StdRng,
) -> (Vec<Rating>, Vec<Rating>) {
    let n = ratings.len();
    let mut n_test = (test_fraction * n as f64).ceil() as usize;
    if n >= 2 {
        n_test = n_test.clamp(1, n - 1);
    } else {
        n_test = n_test.min(n);
    }

    let mut shuffled = ratings.to_vec();
    shuffled.shuffle(rng);
    let train = shuffled.split_off(n_test);
    (train, shuffled)
}

/// Hold out one random rating of every user who has at least two.
///
/// Users are visited in order of first appearance, so the same generator
/// state always picks the same ratings. Users with a single rating keep it in
/// the train set and have no test rating. Returns `(train, test)`.
pub fn leave_one_out(ratings: &[Rating], rng: &mut StdRng) -> (Vec<Rating>, Vec<Rating>) {
    let mut order: Vec<UserId> = Vec::new();
    let mut by_user: HashMap<UserId, Vec<usize>> = HashMap::new();
    for (idx, rating) in ratings.iter().enumerate() {
        by_user
            .entry(rating.user_id)
            .or_insert_with(|| {
                order.push(rating.user_id);
                Vec::new()
            })
            .push(idx);
    }

    let mut held_out = vec![false; ratings.len()];
    for user in &order {
        let indices = &by_user[user];
        if indices.len() < 2 {
            continue;
        }
        held_out[indices[rng.random_range(0..indices.len())]] = true;
    }

    let mut train = Vec::with_capacity(ratings.len());
    let mut test = Vec::with_capacity(order.len());
    for (rating, &out) in ratings.iter().zip(&held_out) {
        if out {
            test.push(*rating);
        } else {
            train.push(*rating);
        }
    }
    (train, test)
}

/// All the views of a dataset the harness evaluates against
#[derive(Debug, Clone)]
pub struct EvaluationData {
    popularity_ranks: HashMap<MovieId, u32>,
    full_trainset: Arc<TrainSet>,
    trainset: Arc<TrainSet>,
    testset: Vec<Rating>,
    loocv_trainset: Arc<TrainSet>,
    loocv_testset: Vec<Rating>,
    similarities: Option<SimilarityMatrix>,
}

impl EvaluationData {
    /// Splits plus item cosine similarities on the full train set
    pub fn new(dataset: &RatingsDataset, config: &EvaluationConfig) -> Result<Self> {
        Self::with_similarity_source(dataset, config, Some(&CosineSimilarity::item_based()))
    }

    /// Splits with a custom similarity source, or none at all
    ///
    /// Without a source, diversity cannot be measured and is reported as
    /// unavailable.
    pub fn with_similarity_source(
        dataset: &RatingsDataset,
        config: &EvaluationConfig,
        source: Option<&dyn SimilaritySource>,
    ) -> Result<Self> {
        config.validate()?;
        if dataset.len() < 2 {
            return Err(EvalError::TooFewRatings {
                count: dataset.len(),
            });
        }
        let scale = dataset.rating_scale();
        let mut rng = StdRng::seed_from_u64(config.seed);

        let full_trainset = Arc::new(dataset.build_full_trainset());

        let (train, testset) = split_train_test(dataset.ratings(), config.test_fraction, &mut rng);
        let trainset = Arc::new(TrainSet::from_ratings(&train, scale));
        info!("Train/test split: {} / {} ratings", train.len(), testset.len());

        let (loocv_train, loocv_testset) = leave_one_out(dataset.ratings(), &mut rng);
        let loocv_trainset = Arc::new(TrainSet::from_ratings(&loocv_train, scale));
        info!(
            "Leave-one-out split: {} train ratings, {} held out",
            loocv_train.len(),
            loocv_testset.len()
        );

        let similarities = match source {
            Some(source) => {
                debug!("Computing item similarities with {}", source.name());
                let sims = source
                    .similarities(&full_trainset)
                    .map_err(|e| EvalError::Algorithm {
                        name: source.name().to_string(),
                        source: e,
                    })?;
                Some(sims)
            }
            None => None,
        };

        Ok(Self {
            popularity_ranks: dataset.popularity_ranks().clone(),
            full_trainset,
            trainset,
            testset,
            loocv_trainset,
            loocv_testset,
            similarities,
        })
    }

    pub fn full_trainset(&self) -> Arc<TrainSet> {
        Arc::clone(&self.full_trainset)
    }

    pub fn full_anti_testset(&self) -> Vec<UserItemPair> {
        self.full_trainset.build_anti_testset()
    }

    /// Unrated movies of one user in the full train set
    pub fn anti_testset_for_user(&self, user_id: UserId) -> Vec<UserItemPair> {
        self.full_trainset.anti_testset_for_user(user_id)
    }

    pub fn trainset(&self) -> Arc<TrainSet> {
        Arc::clone(&self.trainset)
    }

    pub fn testset(&self) -> &[Rating] {
        &self.testset
    }

    pub fn loocv_trainset(&self) -> Arc<TrainSet> {
        Arc::clone(&self.loocv_trainset)
    }

    pub fn loocv_testset(&self) -> &[Rating] {
        &self.loocv_testset
    }

    pub fn loocv_anti_testset(&self) -> Vec<UserItemPair> {
        self.loocv_trainset.build_anti_testset()
    }

    pub fn similarities(&self) -> Option<&SimilarityMatrix> {
        self.similarities.as_ref()
    }

    pub fn popularity_rankings(&self) -> &HashMap<MovieId, u32> {
        &self.popularity_ranks
    }
}
