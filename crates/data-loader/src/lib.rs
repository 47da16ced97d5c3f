//! # Data Loader Crate
//!
//! Ratings data for the recommender bake-off.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Rating, Movie, Genre, RatingScale)
//! - **dataset**: The validated, immutable [`RatingsDataset`] with popularity ranks
//! - **trainset**: [`TrainSet`], the indexed view algorithms are fitted on
//! - **parser**: Parse MovieLens `.dat` files into Rust structs
//! - **loader**: [`MovieLens`], which loads a dataset directory
//! - **error**: Error types for data loading and validation
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::MovieLens;
//! use std::path::Path;
//!
//! let ml = MovieLens::load_from_files(Path::new("data/ml-1m"))?;
//! let dataset = ml.dataset();
//! let full = dataset.build_full_trainset();
//!
//! println!("{} users rated {} movies", full.n_users(), full.n_items());
//! ```

pub mod error;
pub mod types;
pub mod dataset;
pub mod trainset;
pub mod parser;
pub mod loader;

// Re-export commonly used types for convenience
pub use error::{DataError, Result};
pub use types::{Genre, Movie, MovieId, Rating, RatingScale, UserId};
pub use dataset::RatingsDataset;
pub use trainset::{TrainSet, UserItemPair};
pub use loader::{MovieCatalog, MovieLens};
