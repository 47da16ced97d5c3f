//! The evaluation harness.
//!
//! [`Evaluator`] owns the dataset splits and an ordered registry of named
//! algorithms. Evaluating runs every algorithm through up to three phases:
//! 1. Accuracy: fit on the train split, predict the test split (RMSE, MAE)
//! 2. Leave-one-out: fit on the LOOCV train set, rank its anti-test set and
//!    look for each user's held-out movie (HR, cHR, ARHR)
//! 3. Full data: fit on all ratings, rank every unrated movie (coverage,
//!    diversity, novelty)
//!
//! Every phase fits a fresh model. The generator handed to `fit` is reseeded
//! per algorithm, so results do not depend on registration order.

use crate::config::EvaluationConfig;
use crate::error::{EvalError, Result};
use crate::metrics;
use crate::report::{AlgorithmMetrics, EvaluationReport, TopNMetrics};
use crate::splitter::EvaluationData;
use data_loader::{RatingsDataset, UserId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use recommenders::{Algorithm, AlgorithmError, Prediction, ScoredItem, TopNLists};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// A registered algorithm and the name it is reported under
pub struct EvaluatedAlgorithm {
    algorithm: Box<dyn Algorithm>,
    name: String,
}

impl EvaluatedAlgorithm {
    pub fn new(algorithm: impl Algorithm + 'static, name: impl Into<String>) -> Self {
        Self {
            algorithm: Box::new(algorithm),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn algorithm(&self) -> &dyn Algorithm {
        self.algorithm.as_ref()
    }

    fn failed(&self, source: AlgorithmError) -> EvalError {
        EvalError::Algorithm {
            name: self.name.clone(),
            source,
        }
    }

    /// Run the accuracy phase and, if `compute_top_n`, the two top-N phases
    #[instrument(skip(self, data, config), fields(algorithm = %self.name))]
    pub fn evaluate(
        &self,
        data: &EvaluationData,
        config: &EvaluationConfig,
        compute_top_n: bool,
        n: usize,
    ) -> Result<AlgorithmMetrics> {
        let mut rng = StdRng::seed_from_u64(config.algorithm_seed);

        info!("Evaluating accuracy...");
        let mut model = self
            .algorithm
            .fit(data.trainset(), &mut rng)
            .map_err(|e| self.failed(e))?;
        let predictions = model
            .predict_ratings(data.testset())
            .map_err(|e| self.failed(e))?;
        let rmse = metrics::rmse(&predictions);
        let mae = metrics::mae(&predictions);
        debug!("Predicted {} test ratings", predictions.len());

        let top_n = if compute_top_n {
            Some(self.evaluate_top_n(data, config, n, &mut rng)?)
        } else {
            None
        };

        Ok(AlgorithmMetrics {
            name: self.name.clone(),
            rmse,
            mae,
            top_n,
        })
    }

    fn evaluate_top_n(
        &self,
        data: &EvaluationData,
        config: &EvaluationConfig,
        n: usize,
        rng: &mut StdRng,
    ) -> Result<TopNMetrics> {
        info!("Evaluating top-{} with leave-one-out...", n);
        let mut model = self
            .algorithm
            .fit(data.loocv_trainset(), rng)
            .map_err(|e| self.failed(e))?;
        let left_out = model
            .predict_ratings(data.loocv_testset())
            .map_err(|e| self.failed(e))?;
        let anti_testset = data.loocv_anti_testset();
        let candidates = model
            .predict_pairs(&anti_testset)
            .map_err(|e| self.failed(e))?;
        debug!(
            "Ranked {} candidates for {} held-out ratings",
            candidates.len(),
            left_out.len()
        );
        let loocv_top_n = build_top_n(&candidates, n, config);

        let hit_rate = metrics::hit_rate(&loocv_top_n, &left_out);
        let cumulative_hit_rate =
            metrics::cumulative_hit_rate(&loocv_top_n, &left_out, config.hit_rating_cutoff);
        let average_reciprocal_hit_rank =
            metrics::average_reciprocal_hit_rank(&loocv_top_n, &left_out);
        let rating_hit_rate = metrics::rating_hit_rate(&loocv_top_n, &left_out);

        info!("Computing recommendations with full data set...");
        let full_trainset = data.full_trainset();
        let mut model = self
            .algorithm
            .fit(full_trainset.clone(), rng)
            .map_err(|e| self.failed(e))?;
        let predictions = model
            .predict_pairs(&data.full_anti_testset())
            .map_err(|e| self.failed(e))?;
        let full_top_n = build_top_n(&predictions, n, config);

        let user_coverage = metrics::user_coverage(
            &full_top_n,
            full_trainset.n_users(),
            config.coverage_threshold,
        );
        let diversity = data
            .similarities()
            .and_then(|sims| metrics::diversity(&full_top_n, sims));
        let novelty = metrics::novelty(&full_top_n, data.popularity_rankings());

        Ok(TopNMetrics {
            hit_rate,
            cumulative_hit_rate,
            average_reciprocal_hit_rank,
            rating_hit_rate,
            user_coverage,
            diversity,
            novelty,
        })
    }
}

fn build_top_n(predictions: &[Prediction], n: usize, config: &EvaluationConfig) -> TopNLists {
    match config.top_n_minimum_rating {
        Some(minimum) => metrics::get_top_n_above(predictions, n, minimum),
        None => metrics::get_top_n(predictions, n),
    }
}

/// Runs registered algorithms against shared splits.
///
/// ## Usage
/// ```ignore
/// let report = Evaluator::new(movielens.dataset(), EvaluationConfig::default())?
///     .add_algorithm(Svd::new(), "SVD")
///     .add_algorithm(NormalPredictor::new(), "Random")
///     .evaluate(true)?;
/// println!("{report}");
/// ```
pub struct Evaluator {
    data: EvaluationData,
    config: EvaluationConfig,
    algorithms: Vec<EvaluatedAlgorithm>,
}

impl Evaluator {
    /// Split `dataset` and compute item cosine similarities
    pub fn new(dataset: &RatingsDataset, config: EvaluationConfig) -> Result<Self> {
        let start = Instant::now();
        let data = EvaluationData::new(dataset, &config)?;
        info!("Prepared evaluation data in {:?}", start.elapsed());
        Self::with_data(data, config)
    }

    /// Use splits built elsewhere, e.g. with a custom similarity source
    pub fn with_data(data: EvaluationData, config: EvaluationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            data,
            config,
            algorithms: Vec::new(),
        })
    }

    /// Register an algorithm (builder pattern). Names need not be unique.
    pub fn add_algorithm(
        mut self,
        algorithm: impl Algorithm + 'static,
        name: impl Into<String>,
    ) -> Self {
        self.algorithms.push(EvaluatedAlgorithm::new(algorithm, name));
        self
    }

    pub fn algorithms(&self) -> &[EvaluatedAlgorithm] {
        &self.algorithms
    }

    pub fn data(&self) -> &EvaluationData {
        &self.data
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluate with lists of `config.top_n` items
    pub fn evaluate(&self, compute_top_n: bool) -> Result<EvaluationReport> {
        self.evaluate_with_n(compute_top_n, self.config.top_n)
    }

    /// Evaluate every registered algorithm in registration order.
    ///
    /// The first algorithm failure aborts the run.
    pub fn evaluate_with_n(&self, compute_top_n: bool, n: usize) -> Result<EvaluationReport> {
        if n == 0 {
            return Err(EvalError::InvalidConfig {
                field: "top_n".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let mut results = Vec::with_capacity(self.algorithms.len());
        for algorithm in &self.algorithms {
            let start = Instant::now();
            info!("Evaluating {}...", algorithm.name());
            results.push(algorithm.evaluate(&self.data, &self.config, compute_top_n, n)?);
            info!("Evaluated {} in {:?}", algorithm.name(), start.elapsed());
        }

        Ok(EvaluationReport {
            n,
            algorithms: results,
        })
    }

    /// Top `k` unrated movies for one user from each algorithm fitted on the
    /// full data set. Unknown users get empty lists.
    pub fn sample_top_n_recs(
        &self,
        user_id: UserId,
        k: usize,
    ) -> Result<Vec<(String, Vec<ScoredItem>)>> {
        let anti_testset = self.data.anti_testset_for_user(user_id);
        debug!("User {} has {} unrated movies", user_id, anti_testset.len());

        let mut samples = Vec::with_capacity(self.algorithms.len());
        for algorithm in &self.algorithms {
            info!("Sampling recommendations from {}...", algorithm.name());
            let mut rng = StdRng::seed_from_u64(self.config.algorithm_seed);
            let mut model = algorithm
                .algorithm()
                .fit(self.data.full_trainset(), &mut rng)
                .map_err(|e| algorithm.failed(e))?;
            let predictions = model
                .predict_pairs(&anti_testset)
                .map_err(|e| algorithm.failed(e))?;

            let recs = metrics::get_top_n(&predictions, k)
                .remove(&user_id)
                .unwrap_or_default();
            samples.push((algorithm.name().to_string(), recs));
        }
        Ok(samples)
    }
}
