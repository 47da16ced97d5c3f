//! # Evaluation Crate
//!
//! Offline evaluation of rating predictors on a ratings dataset.
//!
//! ## Components
//!
//! - [`EvaluationConfig`]: seeds, split fraction, list length and thresholds
//! - [`EvaluationData`]: train/test, leave-one-out and full-data splits plus
//!   the similarity matrix used for diversity
//! - [`metrics`]: RMSE, MAE, hit rates, coverage, diversity, novelty
//! - [`Evaluator`]: registers algorithms and produces an [`EvaluationReport`]
//!
//! ## Example Usage
//!
//! ```ignore
//! use evaluation::{EvaluationConfig, Evaluator};
//! use recommenders::{NormalPredictor, Svd};
//!
//! let report = Evaluator::new(movielens.dataset(), EvaluationConfig::default())?
//!     .add_algorithm(Svd::new(), "SVD")
//!     .add_algorithm(NormalPredictor::new(), "Random")
//!     .evaluate(true)?;
//! println!("{report}");
//! ```

pub mod config;
pub mod error;
pub mod harness;
pub mod metrics;
pub mod report;
pub mod splitter;

pub use config::EvaluationConfig;
pub use error::{EvalError, Result};
pub use harness::{EvaluatedAlgorithm, Evaluator};
pub use report::{AlgorithmMetrics, EvaluationReport, TopNMetrics};
pub use splitter::{EvaluationData, leave_one_out, split_train_test};
