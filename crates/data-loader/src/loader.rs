//! Loading a MovieLens dataset from disk.
//!
//! [`MovieLens`] is the ratings loader used by the CLI: it parses the ratings
//! and the movie catalog, builds the validated [`RatingsDataset`] (which
//! derives the popularity ranks) and keeps the movie metadata around for
//! content-based algorithms and for printing titles.

use crate::dataset::RatingsDataset;
use crate::error::Result;
use crate::parser;
use crate::types::*;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Movie metadata indexed by ID
pub type MovieCatalog = HashMap<MovieId, Movie>;

/// A loaded MovieLens dataset
#[derive(Debug, Clone)]
pub struct MovieLens {
    dataset: RatingsDataset,
    movies: Arc<MovieCatalog>,
}

impl MovieLens {
    /// Load `ratings.dat` and `movies.dat` from a directory
    ///
    /// Both files are parsed in parallel.
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading MovieLens dataset from {:?}", data_dir);

        let ratings_path = data_dir.join("ratings.dat");
        let movies_path = data_dir.join("movies.dat");

        let (ratings, movies) = rayon::join(
            || parser::parse_ratings(&ratings_path),
            || parser::parse_movies(&movies_path),
        );
        let ratings = ratings?;
        let movies = movies?;

        info!("Loaded {} movies, {} ratings", movies.len(), ratings.len());

        Self::from_parts(ratings, movies, RatingScale::MOVIELENS)
    }

    /// Build from already-parsed ratings and movies
    pub fn from_parts(
        ratings: Vec<Rating>,
        movies: Vec<Movie>,
        scale: RatingScale,
    ) -> Result<Self> {
        let dataset = RatingsDataset::new(ratings, scale)?;
        let movies = movies.into_iter().map(|m| (m.id, m)).collect();
        Ok(Self {
            dataset,
            movies: Arc::new(movies),
        })
    }

    pub fn dataset(&self) -> &RatingsDataset {
        &self.dataset
    }

    pub fn popularity_ranks(&self) -> &HashMap<MovieId, u32> {
        self.dataset.popularity_ranks()
    }

    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// Title of a movie, empty when the movie is not in the catalog
    pub fn movie_title(&self, id: MovieId) -> &str {
        self.movies.get(&id).map(|m| m.title.as_str()).unwrap_or("")
    }

    /// Shared handle to the movie metadata
    pub fn catalog(&self) -> Arc<MovieCatalog> {
        Arc::clone(&self.movies)
    }

    /// Get counts for debugging/validation: (users, movies, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.dataset.num_users(), self.movies.len(), self.dataset.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts() {
        let movies = parser::parse_movies_str(
            "1::Toy Story (1995)::Animation|Children's|Comedy\n2::Heat (1995)::Action|Crime|Thriller\n",
        )
        .unwrap();
        let ratings = parser::parse_ratings_str("1::1::5::0\n1::2::3::0\n2::1::4::0\n").unwrap();

        let ml = MovieLens::from_parts(ratings, movies, RatingScale::MOVIELENS).unwrap();

        assert_eq!(ml.counts(), (2, 2, 3));
        assert_eq!(ml.movie_title(2), "Heat (1995)");
        assert_eq!(ml.movie_title(99), "");
        assert_eq!(ml.popularity_ranks()[&1], 1);
        assert_eq!(ml.catalog().len(), 2);
    }

    #[test]
    fn test_load_dataset() {
        // This test requires the actual dataset files
        // Place ml-1m data in ../../data/ml-1m/
        let data_dir = Path::new("../../data/ml-1m");

        if data_dir.exists() {
            let ml = MovieLens::load_from_files(data_dir).unwrap();
            let (users, movies, ratings) = ml.counts();

            // MovieLens 1M expected counts
            assert_eq!(users, 6040);
            assert_eq!(movies, 3883);
            assert_eq!(ratings, 1000209);
        }
    }

    #[test]
    fn test_missing_directory() {
        let result = MovieLens::load_from_files(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(crate::DataError::FileNotFound { .. })));
    }
}
