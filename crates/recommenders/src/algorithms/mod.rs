//! Algorithm implementations.
//!
//! Each type implements [`Algorithm`](crate::Algorithm) on its own and can
//! also be wrapped in the [`Recommender`](crate::Recommender) enum.

pub mod autorec;
pub mod content_knn;
pub mod knn;
pub mod random;
pub mod svd;

// Re-export for convenience
pub use autorec::AutoRec;
pub use content_knn::{ContentKnn, ContentSimilarity};
pub use knn::KnnBasic;
pub use random::NormalPredictor;
pub use svd::Svd;
