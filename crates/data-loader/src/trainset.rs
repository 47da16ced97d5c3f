//! Indexed view over a set of ratings, used to fit algorithms.
//!
//! Raw user and movie IDs are mapped to dense inner IDs (`0..n`) in the order
//! they first appear, so algorithms can use plain vectors and matrices. Both
//! directions of the rating relation are kept:
//! - `ur`: inner user -> [(inner item, rating)]
//! - `ir`: inner item -> [(inner user, rating)]

use crate::types::{MovieId, Rating, RatingScale, UserId};
use std::collections::{HashMap, HashSet};

/// A (user, movie) pair with no known rating
pub type UserItemPair = (UserId, MovieId);

#[derive(Debug, Clone)]
pub struct TrainSet {
    ur: Vec<Vec<(usize, f32)>>,
    ir: Vec<Vec<(usize, f32)>>,
    raw_users: Vec<UserId>,
    raw_items: Vec<MovieId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<MovieId, usize>,
    rating_scale: RatingScale,
    global_mean: f32,
    n_ratings: usize,
}

impl TrainSet {
    /// Build the indices for `ratings`
    pub fn from_ratings(ratings: &[Rating], rating_scale: RatingScale) -> Self {
        let mut trainset = Self {
            ur: Vec::new(),
            ir: Vec::new(),
            raw_users: Vec::new(),
            raw_items: Vec::new(),
            user_index: HashMap::new(),
            item_index: HashMap::new(),
            rating_scale,
            global_mean: 0.0,
            n_ratings: ratings.len(),
        };

        let mut total = 0.0f64;
        for rating in ratings {
            let uid = trainset.inner_user_or_insert(rating.user_id);
            let iid = trainset.inner_item_or_insert(rating.movie_id);
            trainset.ur[uid].push((iid, rating.rating));
            trainset.ir[iid].push((uid, rating.rating));
            total += rating.rating as f64;
        }

        if !ratings.is_empty() {
            trainset.global_mean = (total / ratings.len() as f64) as f32;
        }
        trainset
    }

    fn inner_user_or_insert(&mut self, user_id: UserId) -> usize {
        if let Some(&uid) = self.user_index.get(&user_id) {
            return uid;
        }
        let uid = self.raw_users.len();
        self.raw_users.push(user_id);
        self.user_index.insert(user_id, uid);
        self.ur.push(Vec::new());
        uid
    }

    fn inner_item_or_insert(&mut self, movie_id: MovieId) -> usize {
        if let Some(&iid) = self.item_index.get(&movie_id) {
            return iid;
        }
        let iid = self.raw_items.len();
        self.raw_items.push(movie_id);
        self.item_index.insert(movie_id, iid);
        self.ir.push(Vec::new());
        iid
    }

    pub fn n_users(&self) -> usize {
        self.raw_users.len()
    }

    pub fn n_items(&self) -> usize {
        self.raw_items.len()
    }

    pub fn n_ratings(&self) -> usize {
        self.n_ratings
    }

    pub fn is_empty(&self) -> bool {
        self.n_ratings == 0
    }

    pub fn global_mean(&self) -> f32 {
        self.global_mean
    }

    pub fn rating_scale(&self) -> RatingScale {
        self.rating_scale
    }

    pub fn to_inner_uid(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn to_inner_iid(&self, movie_id: MovieId) -> Option<usize> {
        self.item_index.get(&movie_id).copied()
    }

    /// Panics if `uid` is out of range
    pub fn to_raw_uid(&self, uid: usize) -> UserId {
        self.raw_users[uid]
    }

    /// Panics if `iid` is out of range
    pub fn to_raw_iid(&self, iid: usize) -> MovieId {
        self.raw_items[iid]
    }

    /// Raw user IDs in inner order
    pub fn raw_users(&self) -> &[UserId] {
        &self.raw_users
    }

    /// Raw movie IDs in inner order
    pub fn raw_items(&self) -> &[MovieId] {
        &self.raw_items
    }

    /// Ratings made by an inner user
    pub fn user_ratings(&self, uid: usize) -> &[(usize, f32)] {
        self.ur.get(uid).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Ratings received by an inner item
    pub fn item_ratings(&self, iid: usize) -> &[(usize, f32)] {
        self.ir.get(iid).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// All ratings as (inner user, inner item, rating), grouped by user
    pub fn all_ratings(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        self.ur
            .iter()
            .enumerate()
            .flat_map(|(uid, ratings)| ratings.iter().map(move |&(iid, r)| (uid, iid, r)))
    }

    /// Every (user, movie) pair that is not rated in this train set
    pub fn build_anti_testset(&self) -> Vec<UserItemPair> {
        let mut pairs = Vec::new();
        for uid in 0..self.n_users() {
            self.push_unrated(uid, &mut pairs);
        }
        pairs
    }

    /// Unrated pairs for a single user; empty when the user is unknown
    pub fn anti_testset_for_user(&self, user_id: UserId) -> Vec<UserItemPair> {
        let mut pairs = Vec::new();
        if let Some(uid) = self.to_inner_uid(user_id) {
            self.push_unrated(uid, &mut pairs);
        }
        pairs
    }

    fn push_unrated(&self, uid: usize, pairs: &mut Vec<UserItemPair>) {
        let rated: HashSet<usize> = self.ur[uid].iter().map(|&(iid, _)| iid).collect();
        let user_id = self.raw_users[uid];
        pairs.extend(
            (0..self.n_items())
                .filter(|iid| !rated.contains(iid))
                .map(|iid| (user_id, self.raw_items[iid])),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ratings() -> Vec<Rating> {
        vec![
            Rating::new(7, 100, 4.0),
            Rating::new(7, 200, 2.0),
            Rating::new(9, 200, 5.0),
            Rating::new(9, 300, 3.0),
        ]
    }

    #[test]
    fn test_inner_ids_follow_first_appearance() {
        let trainset = TrainSet::from_ratings(&sample_ratings(), RatingScale::MOVIELENS);

        assert_eq!(trainset.n_users(), 2);
        assert_eq!(trainset.n_items(), 3);
        assert_eq!(trainset.to_inner_uid(7), Some(0));
        assert_eq!(trainset.to_inner_uid(9), Some(1));
        assert_eq!(trainset.to_inner_iid(300), Some(2));
        assert_eq!(trainset.to_raw_iid(1), 200);
        assert_eq!(trainset.to_inner_uid(42), None);
    }

    #[test]
    fn test_global_mean_and_indices() {
        let trainset = TrainSet::from_ratings(&sample_ratings(), RatingScale::MOVIELENS);

        assert!((trainset.global_mean() - 3.5).abs() < 1e-6);
        assert_eq!(trainset.user_ratings(1), &[(1, 5.0), (2, 3.0)]);
        assert_eq!(trainset.item_ratings(1), &[(0, 2.0), (1, 5.0)]);
        assert_eq!(trainset.all_ratings().count(), 4);
    }

    #[test]
    fn test_anti_testset() {
        let trainset = TrainSet::from_ratings(&sample_ratings(), RatingScale::MOVIELENS);

        let anti = trainset.build_anti_testset();
        assert_eq!(anti, vec![(7, 300), (9, 100)]);

        assert_eq!(trainset.anti_testset_for_user(9), vec![(9, 100)]);
        assert!(trainset.anti_testset_for_user(42).is_empty());
    }
}
