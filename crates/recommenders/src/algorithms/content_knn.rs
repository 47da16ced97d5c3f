//! Content-based KNN.
//!
//! Items are compared by their metadata instead of by who rated them:
//! - genre similarity: cosine between the binary genre vectors,
//!   `|A ∩ B| / sqrt(|A| * |B|)`
//! - year similarity: `exp(-|year_a - year_b| / 10)`, neutral 0.5 when a year
//!   is unknown
//!
//! The item similarity is the product of the two. Estimates are the
//! similarity-weighted average of the `k` rated items most similar to the
//! target.

use crate::error::{AlgorithmError, PredictionImpossible, Result};
use crate::similarity::{SimilarityMatrix, SimilaritySource};
use crate::traits::{Algorithm, Model};
use data_loader::{Genre, Movie, MovieCatalog, MovieId, TrainSet, UserId};
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Genre and year similarity between catalog movies
#[derive(Debug, Clone)]
pub struct ContentSimilarity {
    catalog: Arc<MovieCatalog>,
}

impl ContentSimilarity {
    pub fn new(catalog: Arc<MovieCatalog>) -> Self {
        Self { catalog }
    }

    /// Similarity of two movies; 0 when either is missing from the catalog
    pub fn movie_similarity(&self, a: MovieId, b: MovieId) -> f32 {
        match (self.catalog.get(&a), self.catalog.get(&b)) {
            (Some(a), Some(b)) => genre_similarity(a, b) * year_similarity(a.year, b.year),
            _ => 0.0,
        }
    }
}

impl SimilaritySource for ContentSimilarity {
    fn name(&self) -> &str {
        "content (genre x year)"
    }

    #[instrument(skip(self, trainset))]
    fn similarities(&self, trainset: &TrainSet) -> Result<SimilarityMatrix> {
        let items = trainset.raw_items();
        debug!("Computing content similarity for {} items", items.len());

        let rows: Vec<Vec<f32>> = items
            .par_iter()
            .map(|&a| items.iter().map(|&b| self.movie_similarity(a, b)).collect())
            .collect();

        SimilarityMatrix::from_rows(items.to_vec(), rows)
    }
}

fn genre_similarity(a: &Movie, b: &Movie) -> f32 {
    let genres_a: HashSet<Genre> = a.genres.iter().copied().collect();
    let genres_b: HashSet<Genre> = b.genres.iter().copied().collect();

    let denom = ((genres_a.len() * genres_b.len()) as f32).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    genres_a.intersection(&genres_b).count() as f32 / denom
}

fn year_similarity(a: Option<u16>, b: Option<u16>) -> f32 {
    match (a, b) {
        (Some(a), Some(b)) => {
            let diff = (a as i32 - b as i32).abs() as f32;
            (-diff / 10.0).exp()
        }
        _ => 0.5,
    }
}

#[derive(Debug, Clone)]
pub struct ContentKnn {
    similarity: ContentSimilarity,
    /// Maximum number of neighbors (default: 40)
    k: usize,
}

impl ContentKnn {
    pub fn new(catalog: Arc<MovieCatalog>) -> Self {
        Self {
            similarity: ContentSimilarity::new(catalog),
            k: 40,
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }
}

impl Algorithm for ContentKnn {
    fn name(&self) -> &str {
        "ContentKNN"
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

        let sims = self.similarity.similarities(&trainset)?;
        Ok(Box::new(ContentKnnModel {
            trainset,
            sims,
            k: self.k,
        }))
    }
}

struct ContentKnnModel {
    trainset: Arc<TrainSet>,
    sims: SimilarityMatrix,
    k: usize,
}

impl Model for ContentKnnModel {
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

        let mut neighbors: Vec<(f32, f32)> = self
            .trainset
            .user_ratings(uid)
            .iter()
            .map(|&(rated, rating)| (self.sims.by_inner(iid, rated), rating))
            .collect();
        neighbors.sort_by(|a, b| b.0.total_cmp(&a.0));

        let (sim_total, weighted_sum) = neighbors
            .iter()
            .take(self.k)
            .filter(|(sim, _)| *sim > 0.0)
            .fold((0.0f32, 0.0f32), |(total, sum), &(sim, rating)| {
                (total + sim, sum + sim * rating)
            });

        if sim_total == 0.0 {
            return Err(PredictionImpossible::NO_NEIGHBORS);
        }
        Ok(weighted_sum / sim_total)
    }
}
