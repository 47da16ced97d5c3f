//! The closed set of algorithm variants shipped with the workspace.

use crate::algorithms::{AutoRec, ContentKnn, KnnBasic, NormalPredictor, Svd};
use crate::error::Result;
use crate::traits::{Algorithm, Model};
use data_loader::TrainSet;
use rand::rngs::StdRng;
use std::sync::Arc;

/// Any of the built-in algorithms
#[derive(Debug, Clone)]
pub enum Recommender {
    /// Random ratings from a fitted normal distribution
    Baseline(NormalPredictor),
    /// User- or item-based KNN collaborative filtering
    Neighborhood(KnnBasic),
    /// Biased matrix factorization
    Factorization(Svd),
    /// KNN over movie metadata
    ContentSimilarity(ContentKnn),
    /// Neural autoencoder
    Autoencoder(AutoRec),
}

impl Recommender {
    fn inner(&self) -> &dyn Algorithm {
        match self {
            Recommender::Baseline(a) => a,
            Recommender::Neighborhood(a) => a,
            Recommender::Factorization(a) => a,
            Recommender::ContentSimilarity(a) => a,
            Recommender::Autoencoder(a) => a,
        }
    }
}

impl Algorithm for Recommender {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn fit(&self, trainset: Arc<TrainSet>, rng: &mut StdRng) -> Result<Box<dyn Model>> {
        self.inner().fit(trainset, rng)
    }
}

impl From<NormalPredictor> for Recommender {
    fn from(a: NormalPredictor) -> Self {
        Recommender::Baseline(a)
    }
}

impl From<KnnBasic> for Recommender {
    fn from(a: KnnBasic) -> Self {
        Recommender::Neighborhood(a)
    }
}

impl From<Svd> for Recommender {
    fn from(a: Svd) -> Self {
        Recommender::Factorization(a)
    }
}

impl From<ContentKnn> for Recommender {
    fn from(a: ContentKnn) -> Self {
        Recommender::ContentSimilarity(a)
    }
}

impl From<AutoRec> for Recommender {
    fn from(a: AutoRec) -> Self {
        Recommender::Autoencoder(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_dispatch() {
        let variants: Vec<Recommender> = vec![
            NormalPredictor::new().into(),
            KnnBasic::new().user_based(true).into(),
            Svd::new().into(),
            AutoRec::new().into(),
        ];
        let names: Vec<&str> = variants.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["NormalPredictor", "UserKNN", "SVD", "AutoRec"]);
    }
}
