//! # Recommenders Crate
//!
//! Rating-prediction algorithms behind one uniform interface.
//!
//! ## Components
//!
//! - [`Algorithm`] / [`Model`]: fit on a train set, then predict ratings for
//!   arbitrary (user, movie) pairs
//! - [`algorithms`]: the concrete variants
//!   - [`NormalPredictor`]: random baseline
//!   - [`KnnBasic`]: user- or item-based neighborhood CF
//!   - [`Svd`]: biased matrix factorization
//!   - [`ContentKnn`]: KNN over genres and release years
//!   - [`AutoRec`]: autoencoder
//! - [`Recommender`]: enum over the variants above
//! - [`similarity`]: similarity matrices and the [`SimilaritySource`] plug-in
//! - [`neighborhood`]: top-N lists straight from a similarity matrix
//!
//! ## Example Usage
//!
//! ```ignore
//! use recommenders::{Algorithm, Svd};
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::sync::Arc;
//!
//! let trainset = Arc::new(dataset.build_full_trainset());
//! let mut model = Svd::new().fit(trainset, &mut StdRng::seed_from_u64(10))?;
//! let prediction = model.predict(1, 1193, None)?;
//! ```

pub mod algorithms;
pub mod error;
pub mod neighborhood;
pub mod prediction;
pub mod recommender;
pub mod similarity;
pub mod traits;

// Re-export commonly used types
pub use algorithms::{AutoRec, ContentKnn, ContentSimilarity, KnnBasic, NormalPredictor, Svd};
pub use error::{AlgorithmError, PredictionImpossible, Result};
pub use neighborhood::{CfMode, NeighborhoodTopN};
pub use prediction::{Prediction, ScoredItem, TopNLists};
pub use recommender::Recommender;
pub use similarity::{CosineSimilarity, SimilarityMatrix, SimilaritySource};
pub use traits::{Algorithm, Model};
