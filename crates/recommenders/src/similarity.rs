//! Similarity matrices between users or between items.
//!
//! A [`SimilarityMatrix`] is dense and indexed by the inner IDs of the train
//! set it was computed on, with a raw-ID lookup for callers (like the
//! diversity metric) that only know raw movie IDs.
//!
//! Rows are computed in parallel with Rayon; each row only depends on the
//! train set, so the result is identical to a sequential computation.

use crate::error::{AlgorithmError, Result};
use data_loader::TrainSet;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    /// Raw IDs in row order
    ids: Vec<u32>,
    index: HashMap<u32, usize>,
    /// Row-major `ids.len() x ids.len()`
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Build from raw IDs and row-major values
    ///
    /// Fails when `values` is not `ids.len()` squared.
    pub fn new(ids: Vec<u32>, values: Vec<f32>) -> Result<Self> {
        if values.len() != ids.len() * ids.len() {
            return Err(AlgorithmError::InvalidParameter {
                name: "similarity values".to_string(),
                value: format!("{} entries for {} ids", values.len(), ids.len()),
            });
        }
        let index = ids.iter().enumerate().map(|(pos, &id)| (id, pos)).collect();
        Ok(Self { ids, index, values })
    }

    /// Build from per-row vectors
    pub fn from_rows(ids: Vec<u32>, rows: Vec<Vec<f32>>) -> Result<Self> {
        let values = rows.into_iter().flatten().collect();
        Self::new(ids, values)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Similarity by inner position. Panics when out of range.
    pub fn by_inner(&self, a: usize, b: usize) -> f32 {
        self.values[a * self.ids.len() + b]
    }

    /// One row by inner position
    pub fn row(&self, a: usize) -> &[f32] {
        let n = self.ids.len();
        &self.values[a * n..(a + 1) * n]
    }

    /// Similarity by raw ID, `None` if either ID is unknown
    pub fn get(&self, a: u32, b: u32) -> Option<f32> {
        let a = *self.index.get(&a)?;
        let b = *self.index.get(&b)?;
        Some(self.by_inner(a, b))
    }
}

/// Anything that can produce a similarity matrix for a train set.
///
/// The evaluation harness uses one to measure the diversity of
/// recommendations, independently of the algorithm under test.
pub trait SimilaritySource {
    fn name(&self) -> &str;

    fn similarities(&self, trainset: &TrainSet) -> Result<SimilarityMatrix>;
}

/// Cosine similarity over co-rated entries
///
/// For two items (or users) only the ratings they have in common contribute:
/// `sum(x*y) / sqrt(sum(x^2) * sum(y^2))`, 0 when nothing is shared.
#[derive(Debug, Clone, Copy)]
pub struct CosineSimilarity {
    pub user_based: bool,
}

impl CosineSimilarity {
    pub fn item_based() -> Self {
        Self { user_based: false }
    }

    pub fn user_based() -> Self {
        Self { user_based: true }
    }
}

impl SimilaritySource for CosineSimilarity {
    fn name(&self) -> &str {
        if self.user_based { "cosine (user)" } else { "cosine (item)" }
    }

    #[instrument(skip(self, trainset), fields(user_based = self.user_based))]
    fn similarities(&self, trainset: &TrainSet) -> Result<SimilarityMatrix> {
        let (n, ids) = if self.user_based {
            (trainset.n_users(), trainset.raw_users().to_vec())
        } else {
            (trainset.n_items(), trainset.raw_items().to_vec())
        };
        debug!("Computing {}x{} cosine similarities", n, n);

        // x = the entity we compare, y = the entity the ratings are shared through
        let x_ratings = |x: usize| {
            if self.user_based { trainset.user_ratings(x) } else { trainset.item_ratings(x) }
        };
        let y_ratings = |y: usize| {
            if self.user_based { trainset.item_ratings(y) } else { trainset.user_ratings(y) }
        };

        let rows: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|x| {
                let mut prods = vec![0.0f64; n];
                let mut sq_x = vec![0.0f64; n];
                let mut sq_other = vec![0.0f64; n];

                for &(y, r_xy) in x_ratings(x) {
                    let r_xy = r_xy as f64;
                    for &(other, r_oy) in y_ratings(y) {
                        let r_oy = r_oy as f64;
                        prods[other] += r_xy * r_oy;
                        sq_x[other] += r_xy * r_xy;
                        sq_other[other] += r_oy * r_oy;
                    }
                }

                (0..n)
                    .map(|other| {
                        let denom = (sq_x[other] * sq_other[other]).sqrt();
                        if denom == 0.0 { 0.0 } else { (prods[other] / denom) as f32 }
                    })
                    .collect()
            })
            .collect();

        SimilarityMatrix::from_rows(ids, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Rating, RatingScale};

    fn trainset() -> TrainSet {
        let ratings = vec![
            Rating::new(1, 10, 5.0),
            Rating::new(1, 20, 5.0),
            Rating::new(2, 10, 1.0),
            Rating::new(2, 20, 1.0),
            Rating::new(2, 30, 4.0),
            Rating::new(3, 40, 2.0),
        ];
        TrainSet::from_ratings(&ratings, RatingScale::MOVIELENS)
    }

    #[test]
    fn test_matrix_shape_is_checked() {
        assert!(SimilarityMatrix::new(vec![1, 2], vec![1.0; 3]).is_err());
        let matrix = SimilarityMatrix::new(vec![1, 2], vec![1.0, 0.5, 0.5, 1.0]).unwrap();
        assert_eq!(matrix.get(1, 2), Some(0.5));
        assert_eq!(matrix.get(1, 3), None);
        assert_eq!(matrix.row(1), &[0.5, 1.0]);
    }

    #[test]
    fn test_item_cosine() {
        let trainset = trainset();
        let sims = CosineSimilarity::item_based().similarities(&trainset).unwrap();

        assert_eq!(sims.len(), 4);
        // Items 10 and 20 have proportional ratings from the same users
        assert!((sims.get(10, 20).unwrap() - 1.0).abs() < 1e-6);
        // Item 10 and 30 share only user 2, a single co-rating is always collinear
        assert!((sims.get(10, 30).unwrap() - 1.0).abs() < 1e-6);
        // Item 40 shares no user with anyone
        assert_eq!(sims.get(10, 40), Some(0.0));
        assert!((sims.get(40, 40).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_user_cosine_is_symmetric() {
        let trainset = trainset();
        let sims = CosineSimilarity::user_based().similarities(&trainset).unwrap();

        assert_eq!(sims.len(), 3);
        assert_eq!(sims.get(1, 2), sims.get(2, 1));
        // Users 1 and 2 co-rated 10 and 20 with proportional values
        assert!((sims.get(1, 2).unwrap() - 1.0).abs() < 1e-6);
        assert_eq!(sims.get(1, 3), Some(0.0));
    }
}
