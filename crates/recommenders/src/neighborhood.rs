//! Direct top-N generation from a similarity matrix.
//!
//! Unlike the rating predictors, this produces recommendation lists without
//! estimating individual ratings: candidates are scored by accumulating
//! similarity-weighted ratings, and the best unseen ones are kept.
//!
//! ## Algorithm
//! - **User mode**: take the `k` users most similar to the target user; every
//!   item they rated scores `(rating / max_rating) * user_similarity`.
//! - **Item mode**: take the target user's `k` highest ratings; every item
//!   scores `item_similarity * (rating / max_rating)` for each of them.
//!
//! Items the user already rated are skipped. Ties are broken by movie ID so
//! the lists are reproducible.

use crate::prediction::{ScoredItem, TopNLists};
use crate::similarity::SimilarityMatrix;
use data_loader::{MovieId, TrainSet, UserId};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfMode {
    User,
    Item,
}

#[derive(Debug, Clone)]
pub struct NeighborhoodTopN {
    mode: CfMode,
    /// Neighbors (user mode) or seed ratings (item mode) to use (default: 10)
    k: usize,
    /// Maximum list length per user (default: 40)
    max_results: usize,
}

impl NeighborhoodTopN {
    pub fn new(mode: CfMode) -> Self {
        Self {
            mode,
            k: 10,
            max_results: 40,
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn mode(&self) -> CfMode {
        self.mode
    }

    /// Recommendation lists for every user of `trainset`.
    ///
    /// `sims` must have been computed on the same train set, over users in
    /// user mode and over items in item mode.
    #[instrument(skip(self, trainset, sims), fields(mode = ?self.mode))]
    pub fn top_n(&self, trainset: &TrainSet, sims: &SimilarityMatrix) -> TopNLists {
        let lists: Vec<(UserId, Vec<ScoredItem>)> = (0..trainset.n_users())
            .into_par_iter()
            .map(|uid| {
                let candidates = match self.mode {
                    CfMode::User => self.user_candidates(trainset, sims, uid),
                    CfMode::Item => self.item_candidates(trainset, sims, uid),
                };
                (trainset.to_raw_uid(uid), self.select(trainset, uid, candidates))
            })
            .collect();

        debug!("Built neighborhood top-N lists for {} users", lists.len());
        lists.into_iter().collect()
    }

    fn user_candidates(
        &self,
        trainset: &TrainSet,
        sims: &SimilarityMatrix,
        uid: usize,
    ) -> HashMap<usize, f32> {
        let scale_max = trainset.rating_scale().max;

        let mut similar_users: Vec<(usize, f32)> = sims
            .row(uid)
            .iter()
            .enumerate()
            .filter(|&(other, _)| other != uid)
            .map(|(other, &score)| (other, score))
            .collect();
        similar_users.sort_by(|a, b| b.1.total_cmp(&a.1));
        similar_users.truncate(self.k);

        let mut candidates: HashMap<usize, f32> = HashMap::new();
        for (other, similarity) in similar_users {
            for &(iid, rating) in trainset.user_ratings(other) {
                *candidates.entry(iid).or_insert(0.0) += (rating / scale_max) * similarity;
            }
        }
        candidates
    }

    fn item_candidates(
        &self,
        trainset: &TrainSet,
        sims: &SimilarityMatrix,
        uid: usize,
    ) -> HashMap<usize, f32> {
        let scale_max = trainset.rating_scale().max;

        let mut seeds: Vec<(usize, f32)> = trainset.user_ratings(uid).to_vec();
        seeds.sort_by(|a, b| b.1.total_cmp(&a.1));
        seeds.truncate(self.k);

        let mut candidates: HashMap<usize, f32> = HashMap::new();
        for (seed, rating) in seeds {
            for (iid, &score) in sims.row(seed).iter().enumerate() {
                *candidates.entry(iid).or_insert(0.0) += score * (rating / scale_max);
            }
        }
        candidates
    }

    fn select(
        &self,
        trainset: &TrainSet,
        uid: usize,
        candidates: HashMap<usize, f32>,
    ) -> Vec<ScoredItem> {
        let watched: HashSet<usize> = trainset
            .user_ratings(uid)
            .iter()
            .map(|&(iid, _)| iid)
            .collect();

        let mut ranked: Vec<(MovieId, f32)> = candidates
            .into_iter()
            .filter(|(iid, _)| !watched.contains(iid))
            .map(|(iid, score)| (trainset.to_raw_iid(iid), score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        ranked
            .into_iter()
            .take(self.max_results)
            .map(|(movie_id, score)| ScoredItem::new(movie_id, score))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::{CosineSimilarity, SimilaritySource};
    use data_loader::{Rating, RatingScale};

    fn trainset() -> TrainSet {
        let ratings = vec![
            Rating::new(1, 10, 5.0),
            Rating::new(1, 20, 5.0),
            Rating::new(2, 10, 5.0),
            Rating::new(2, 20, 4.0),
            Rating::new(2, 30, 5.0),
            Rating::new(3, 40, 3.0),
            Rating::new(3, 50, 3.0),
        ];
        TrainSet::from_ratings(&ratings, RatingScale::MOVIELENS)
    }

    #[test]
    fn test_user_mode_recommends_neighbor_items() {
        let trainset = trainset();
        let sims = CosineSimilarity::user_based().similarities(&trainset).unwrap();
        let lists = NeighborhoodTopN::new(CfMode::User).top_n(&trainset, &sims);

        let user1 = &lists[&1];
        // User 2 is user 1's best neighbor and rated 30, which user 1 has not seen
        assert_eq!(user1[0].movie_id, 30);
        assert!(user1.iter().all(|s| s.movie_id != 10 && s.movie_id != 20));
    }

    #[test]
    fn test_item_mode_skips_watched() {
        let trainset = trainset();
        let sims = CosineSimilarity::item_based().similarities(&trainset).unwrap();
        let lists = NeighborhoodTopN::new(CfMode::Item).top_n(&trainset, &sims);

        assert_eq!(lists.len(), 3);
        let user1: Vec<MovieId> = lists[&1].iter().map(|s| s.movie_id).collect();
        assert_eq!(user1[0], 30);
        assert!(!user1.contains(&10));
        for window in lists[&1].windows(2) {
            assert!(window[0].estimate >= window[1].estimate);
        }
    }

    #[test]
    fn test_max_results_truncates() {
        let trainset = trainset();
        let sims = CosineSimilarity::item_based().similarities(&trainset).unwrap();
        let lists = NeighborhoodTopN::new(CfMode::Item)
            .with_max_results(1)
            .top_n(&trainset, &sims);

        assert!(lists.values().all(|items| items.len() <= 1));
    }
}
