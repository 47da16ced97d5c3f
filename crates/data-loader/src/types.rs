//! Core domain types for the MovieLens dataset.
//!
//! This module defines the fundamental data structures shared by the loader,
//! the recommenders and the evaluation harness.

use serde::{Deserialize, Serialize};

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with movie IDs

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

// =============================================================================
// Movie-related Types
// =============================================================================

/// Represents a movie in the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Year extracted from title (e.g., "Toy Story (1995)")
    pub year: Option<u16>,
    pub genres: Vec<Genre>,
}

/// Movie genres from MovieLens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Children,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Fantasy,
    FilmNoir,
    Horror,
    Musical,
    Mystery,
    Romance,
    SciFi,
    Thriller,
    War,
    Western,
}

// =============================================================================
// Rating Types
// =============================================================================

/// Represents a single rating from a user for a movie
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f32,
    /// Unix timestamp when rating was made
    pub timestamp: i64,
}

impl Rating {
    /// Rating without a timestamp, handy for synthetic datasets
    pub fn new(user_id: UserId, movie_id: MovieId, rating: f32) -> Self {
        Self {
            user_id,
            movie_id,
            rating,
            timestamp: 0,
        }
    }
}

/// Inclusive range of valid rating values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingScale {
    pub min: f32,
    pub max: f32,
}

impl RatingScale {
    /// MovieLens 1M uses whole stars from 1 to 5
    pub const MOVIELENS: RatingScale = RatingScale { min: 1.0, max: 5.0 };

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp an estimate into the scale
    pub fn clip(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

impl Default for RatingScale {
    fn default() -> Self {
        Self::MOVIELENS
    }
}
