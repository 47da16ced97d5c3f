//! Evaluation settings.
//!
//! Everything has a default matching the classic bake-off setup; a JSON file
//! can override any subset of fields.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Seed of the generator used for the train/test and leave-one-out splits
    pub seed: u64,
    /// Seed of the generator handed to each algorithm's `fit`
    pub algorithm_seed: u64,
    /// Share of ratings held out for accuracy metrics, in (0, 1)
    pub test_fraction: f64,
    /// Length of the recommendation lists
    pub top_n: usize,
    /// Minimum held-out rating counted by the cumulative hit rate
    pub hit_rating_cutoff: f32,
    /// Minimum predicted rating for a user to count as covered
    pub coverage_threshold: f32,
    /// Drop predictions below this estimate before building top-N lists
    pub top_n_minimum_rating: Option<f32>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            algorithm_seed: 10,
            test_fraction: 0.25,
            top_n: 10,
            hit_rating_cutoff: 4.0,
            coverage_threshold: 4.0,
            top_n_minimum_rating: None,
        }
    }
}

impl EvaluationConfig {
    /// Load a JSON config; missing fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_algorithm_seed(mut self, seed: u64) -> Self {
        self.algorithm_seed = seed;
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    pub fn with_hit_rating_cutoff(mut self, cutoff: f32) -> Self {
        self.hit_rating_cutoff = cutoff;
        self
    }

    pub fn with_coverage_threshold(mut self, threshold: f32) -> Self {
        self.coverage_threshold = threshold;
        self
    }

    pub fn with_top_n_minimum_rating(mut self, minimum: Option<f32>) -> Self {
        self.top_n_minimum_rating = minimum;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(EvalError::InvalidConfig {
                field: "test_fraction".to_string(),
                reason: format!("{} is not in (0, 1)", self.test_fraction),
            });
        }
        if self.top_n == 0 {
            return Err(EvalError::InvalidConfig {
                field: "top_n".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EvaluationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.top_n, 10);
        assert_eq!(config.hit_rating_cutoff, 4.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: EvaluationConfig =
            serde_json::from_str(r#"{ "top_n": 5, "seed": 42 }"#).unwrap();
        assert_eq!(config.top_n, 5);
        assert_eq!(config.seed, 42);
        assert_eq!(config.test_fraction, 0.25);
        assert_eq!(config.top_n_minimum_rating, None);
    }

    #[test]
    fn test_invalid_values() {
        assert!(EvaluationConfig::default().with_test_fraction(1.0).validate().is_err());
        assert!(EvaluationConfig::default().with_test_fraction(f64::NAN).validate().is_err());
        assert!(EvaluationConfig::default().with_top_n(0).validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = EvaluationConfig::from_json_file(Path::new("/no/such/config.json"));
        assert!(matches!(result, Err(EvalError::ConfigIo(_))));
    }
}
