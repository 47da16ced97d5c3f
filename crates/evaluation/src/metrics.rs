//! Accuracy and top-N quality metrics.
//!
//! All functions are pure. Ratio metrics return `None` when their
//! denominator would be zero (no predictions, no qualifying users, ...).

use data_loader::{MovieId, UserId};
use recommenders::{Prediction, ScoredItem, SimilarityMatrix, TopNLists};
use std::collections::HashMap;

/// Root mean squared error over predictions with a known rating
pub fn rmse(predictions: &[Prediction]) -> Option<f64> {
    let (sum, count) = errors(predictions)
        .fold((0.0, 0usize), |(sum, count), err| (sum + err * err, count + 1));
    ratio(sum, count).map(f64::sqrt)
}

/// Mean absolute error over predictions with a known rating
pub fn mae(predictions: &[Prediction]) -> Option<f64> {
    let (sum, count) = errors(predictions)
        .fold((0.0, 0usize), |(sum, count), err| (sum + err.abs(), count + 1));
    ratio(sum, count)
}

fn errors(predictions: &[Prediction]) -> impl Iterator<Item = f64> + '_ {
    predictions
        .iter()
        .filter_map(|p| p.actual.map(|actual| actual as f64 - p.estimate as f64))
}

fn ratio(numerator: f64, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator / denominator as f64)
}

/// Best `n` predictions per user, highest estimate first.
///
/// The sort is stable: equal estimates keep their input order.
pub fn get_top_n(predictions: &[Prediction], n: usize) -> TopNLists {
    collect_top_n(predictions.iter(), n)
}

/// Like [`get_top_n`], ignoring predictions estimated below `minimum_rating`
pub fn get_top_n_above(predictions: &[Prediction], n: usize, minimum_rating: f32) -> TopNLists {
    collect_top_n(predictions.iter().filter(|p| p.estimate >= minimum_rating), n)
}

fn collect_top_n<'a>(predictions: impl Iterator<Item = &'a Prediction>, n: usize) -> TopNLists {
    let mut lists = TopNLists::new();
    for p in predictions {
        lists
            .entry(p.user_id)
            .or_default()
            .push(ScoredItem::new(p.movie_id, p.estimate));
    }
    for items in lists.values_mut() {
        items.sort_by(|a, b| b.estimate.total_cmp(&a.estimate));
        items.truncate(n);
    }
    lists
}

/// Rank (0-based) of `movie_id` in the user's list, if recommended
fn hit_rank(top_n: &TopNLists, user_id: UserId, movie_id: MovieId) -> Option<usize> {
    top_n
        .get(&user_id)?
        .iter()
        .position(|item| item.movie_id == movie_id)
}

/// Share of left-out ratings whose movie made it into the user's list
pub fn hit_rate(top_n: &TopNLists, left_out: &[Prediction]) -> Option<f64> {
    let hits = left_out
        .iter()
        .filter(|p| hit_rank(top_n, p.user_id, p.movie_id).is_some())
        .count();
    ratio(hits as f64, left_out.len())
}

/// Hit rate counting only left-out ratings of at least `rating_cutoff`
pub fn cumulative_hit_rate(
    top_n: &TopNLists,
    left_out: &[Prediction],
    rating_cutoff: f32,
) -> Option<f64> {
    let qualifying: Vec<&Prediction> = left_out
        .iter()
        .filter(|p| p.actual.is_some_and(|actual| actual >= rating_cutoff))
        .collect();
    let hits = qualifying
        .iter()
        .filter(|p| hit_rank(top_n, p.user_id, p.movie_id).is_some())
        .count();
    ratio(hits as f64, qualifying.len())
}

/// Hit rate per left-out rating value, in ascending rating order
pub fn rating_hit_rate(top_n: &TopNLists, left_out: &[Prediction]) -> Vec<(f32, f64)> {
    let mut by_rating: Vec<(f32, usize, usize)> = Vec::new();
    for p in left_out {
        let Some(actual) = p.actual else {
            continue;
        };
        let hit = hit_rank(top_n, p.user_id, p.movie_id).is_some() as usize;
        match by_rating.iter_mut().find(|(rating, _, _)| *rating == actual) {
            Some(entry) => {
                entry.1 += hit;
                entry.2 += 1;
            }
            None => by_rating.push((actual, hit, 1)),
        }
    }
    by_rating.sort_by(|a, b| a.0.total_cmp(&b.0));
    by_rating
        .into_iter()
        .map(|(rating, hits, total)| (rating, hits as f64 / total as f64))
        .collect()
}

/// Mean of `1 / (rank + 1)` over left-out ratings, 0 for misses
pub fn average_reciprocal_hit_rank(top_n: &TopNLists, left_out: &[Prediction]) -> Option<f64> {
    let sum: f64 = left_out
        .iter()
        .filter_map(|p| hit_rank(top_n, p.user_id, p.movie_id))
        .map(|rank| 1.0 / (rank + 1) as f64)
        .sum();
    ratio(sum, left_out.len())
}

/// Share of `num_users` having at least one recommendation estimated at or
/// above `threshold`
pub fn user_coverage(top_n: &TopNLists, num_users: usize, threshold: f32) -> Option<f64> {
    let covered = top_n
        .values()
        .filter(|items| items.iter().any(|item| item.estimate >= threshold))
        .count();
    ratio(covered as f64, num_users)
}

/// Mean per-user dissimilarity `1 - sim` between recommended pairs.
///
/// Pairs involving a movie unknown to `similarities` are skipped; users
/// without any usable pair are left out of the mean.
pub fn diversity(top_n: &TopNLists, similarities: &SimilarityMatrix) -> Option<f64> {
    let mut total = 0.0;
    let mut users = 0usize;

    for items in top_n.values() {
        let mut sum = 0.0;
        let mut pairs = 0usize;
        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                if let Some(sim) = similarities.get(a.movie_id, b.movie_id) {
                    sum += 1.0 - sim as f64;
                    pairs += 1;
                }
            }
        }
        if let Some(user_diversity) = ratio(sum, pairs) {
            total += user_diversity;
            users += 1;
        }
    }

    ratio(total, users)
}

/// Mean popularity rank of every recommended movie (1 = most rated).
///
/// Movies without a rank are skipped.
pub fn novelty(top_n: &TopNLists, popularity_ranks: &HashMap<MovieId, u32>) -> Option<f64> {
    let (sum, count) = top_n
        .values()
        .flatten()
        .filter_map(|item| popularity_ranks.get(&item.movie_id))
        .fold((0.0, 0usize), |(sum, count), &rank| (sum + rank as f64, count + 1));
    ratio(sum, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(
        user_id: UserId,
        movie_id: MovieId,
        actual: Option<f32>,
        estimate: f32,
    ) -> Prediction {
        Prediction {
            user_id,
            movie_id,
            actual,
            estimate,
            was_impossible: false,
        }
    }

    fn lists(entries: &[(UserId, &[MovieId])]) -> TopNLists {
        entries
            .iter()
            .map(|(user, movies)| {
                let items = movies
                    .iter()
                    .enumerate()
                    .map(|(rank, &movie)| ScoredItem::new(movie, 5.0 - rank as f32 * 0.1))
                    .collect();
                (*user, items)
            })
            .collect()
    }

    #[test]
    fn test_rmse_and_mae() {
        let exact = vec![prediction(1, 1, Some(3.0), 3.0), prediction(1, 2, Some(4.0), 4.0)];
        assert_eq!(rmse(&exact), Some(0.0));
        assert_eq!(mae(&exact), Some(0.0));

        let off = vec![prediction(1, 1, Some(3.0), 4.0), prediction(1, 2, Some(4.0), 1.0)];
        assert!((rmse(&off).unwrap() - 5.0f64.sqrt()).abs() < 1e-9);
        assert!((mae(&off).unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_ignores_anti_test_predictions() {
        let preds = vec![prediction(1, 1, None, 4.0)];
        assert_eq!(rmse(&preds), None);
        assert_eq!(mae(&[]), None);
    }

    #[test]
    fn test_top_n_bound_and_order() {
        let preds = vec![
            prediction(1, 1, None, 2.0),
            prediction(1, 2, None, 4.5),
            prediction(1, 3, None, 3.0),
            prediction(1, 4, None, 4.5),
            prediction(2, 1, None, 1.0),
        ];
        let top = get_top_n(&preds, 3);

        let user1: Vec<MovieId> = top[&1].iter().map(|s| s.movie_id).collect();
        // Stable: movie 2 came before movie 4 in the input
        assert_eq!(user1, vec![2, 4, 3]);
        assert_eq!(top[&2].len(), 1);
    }

    #[test]
    fn test_top_n_above_minimum() {
        let preds = vec![prediction(1, 1, None, 2.0), prediction(1, 2, None, 4.5)];
        let top = get_top_n_above(&preds, 10, 4.0);
        assert_eq!(top[&1], vec![ScoredItem::new(2, 4.5)]);

        let none = get_top_n_above(&preds, 10, 5.0);
        assert!(none.is_empty());
    }

    #[test]
    fn test_hit_rate_bounds() {
        let top = lists(&[(1, &[10, 20]), (2, &[30])]);

        let all_hit = vec![prediction(1, 20, Some(3.0), 3.0), prediction(2, 30, Some(3.0), 3.0)];
        assert_eq!(hit_rate(&top, &all_hit), Some(1.0));

        let none_hit = vec![prediction(1, 99, Some(3.0), 3.0), prediction(3, 10, Some(3.0), 3.0)];
        assert_eq!(hit_rate(&top, &none_hit), Some(0.0));

        assert_eq!(hit_rate(&top, &[]), None);
    }

    #[test]
    fn test_cumulative_hit_rate_cutoff() {
        let top = lists(&[(1, &[10]), (2, &[20])]);
        let left_out = vec![prediction(1, 10, Some(5.0), 3.0), prediction(2, 99, Some(3.0), 3.0)];

        assert_eq!(cumulative_hit_rate(&top, &left_out, 4.0), Some(1.0));
        assert_eq!(cumulative_hit_rate(&top, &left_out, 0.0), hit_rate(&top, &left_out));
        // Only the rating-5 entry qualifies at the scale maximum
        assert_eq!(cumulative_hit_rate(&top, &left_out, 5.0), Some(1.0));
        assert_eq!(cumulative_hit_rate(&top, &[prediction(2, 99, Some(3.0), 3.0)], 5.0), None);
    }

    #[test]
    fn test_rating_hit_rate_breakdown() {
        let top = lists(&[(1, &[10]), (2, &[20]), (3, &[30])]);
        let left_out = vec![
            prediction(1, 10, Some(5.0), 3.0),
            prediction(2, 99, Some(5.0), 3.0),
            prediction(3, 30, Some(2.0), 3.0),
        ];
        assert_eq!(rating_hit_rate(&top, &left_out), vec![(2.0, 1.0), (5.0, 0.5)]);
    }

    #[test]
    fn test_arhr_contributions() {
        let top = lists(&[(1, &[10, 20]), (2, &[30, 40])]);

        let first = vec![prediction(1, 10, Some(4.0), 4.0)];
        assert_eq!(average_reciprocal_hit_rank(&top, &first), Some(1.0));

        let second = vec![prediction(2, 40, Some(4.0), 4.0)];
        assert_eq!(average_reciprocal_hit_rank(&top, &second), Some(0.5));

        let mixed = vec![prediction(1, 10, Some(4.0), 4.0), prediction(2, 99, Some(4.0), 4.0)];
        assert_eq!(average_reciprocal_hit_rank(&top, &mixed), Some(0.5));
    }

    #[test]
    fn test_user_coverage() {
        let mut top = TopNLists::new();
        top.insert(1, vec![ScoredItem::new(1, 4.5)]);
        top.insert(2, vec![ScoredItem::new(1, 3.5)]);

        assert_eq!(user_coverage(&top, 4, 4.0), Some(0.25));
        assert_eq!(user_coverage(&top, 2, 3.0), Some(1.0));
        assert_eq!(user_coverage(&top, 0, 4.0), None);
    }

    #[test]
    fn test_diversity() {
        let identical = SimilarityMatrix::new(vec![1, 2, 3], vec![1.0; 9]).unwrap();
        let top = lists(&[(1, &[1, 2, 3])]);
        assert_eq!(diversity(&top, &identical), Some(0.0));

        let mut values = vec![0.0; 9];
        for i in 0..3 {
            values[i * 3 + i] = 1.0;
        }
        let orthogonal = SimilarityMatrix::new(vec![1, 2, 3], values).unwrap();
        assert_eq!(diversity(&top, &orthogonal), Some(1.0));

        // Single-item lists and unknown movies carry no pairs
        let sparse = lists(&[(1, &[1]), (2, &[7, 8])]);
        assert_eq!(diversity(&sparse, &orthogonal), None);
    }

    #[test]
    fn test_novelty() {
        let ranks: HashMap<MovieId, u32> = [(1, 1), (2, 10)].into_iter().collect();
        let top = lists(&[(1, &[1, 2]), (2, &[2, 99])]);

        assert_eq!(novelty(&top, &ranks), Some(7.0));
        assert_eq!(novelty(&TopNLists::new(), &ranks), None);
    }
}
