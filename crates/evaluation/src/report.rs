//! Evaluation results and their tabular rendering.

use serde::Serialize;
use std::fmt;

/// Metrics computed from top-N lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopNMetrics {
    pub hit_rate: Option<f64>,
    pub cumulative_hit_rate: Option<f64>,
    pub average_reciprocal_hit_rank: Option<f64>,
    /// Hit rate per left-out rating value, ascending
    pub rating_hit_rate: Vec<(f32, f64)>,
    pub user_coverage: Option<f64>,
    pub diversity: Option<f64>,
    pub novelty: Option<f64>,
}

/// Everything measured for one registered algorithm
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmMetrics {
    pub name: String,
    pub rmse: Option<f64>,
    pub mae: Option<f64>,
    /// `None` when top-N evaluation was not requested
    pub top_n: Option<TopNMetrics>,
}

/// Results of one evaluation run, in registration order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Length of the recommendation lists
    pub n: usize,
    pub algorithms: Vec<AlgorithmMetrics>,
}

impl EvaluationReport {
    /// First algorithm registered under `name`
    pub fn get(&self, name: &str) -> Option<&AlgorithmMetrics> {
        self.algorithms.iter().find(|a| a.name == name)
    }

    fn has_top_n(&self) -> bool {
        self.algorithms.iter().any(|a| a.top_n.is_some())
    }
}

struct Cell(Option<f64>);

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{:>10.4}", value),
            None => write!(f, "{:>10}", "n/a"),
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .algorithms
            .iter()
            .map(|a| a.name.len())
            .max()
            .unwrap_or(0)
            .max("Algorithm".len());
        let top_n = self.has_top_n();

        write!(f, "{:<width$} {:>10} {:>10}", "Algorithm", "RMSE", "MAE")?;
        if top_n {
            for header in ["HR", "cHR", "ARHR", "Coverage", "Diversity", "Novelty"] {
                write!(f, " {:>10}", header)?;
            }
        }
        writeln!(f)?;

        for algo in &self.algorithms {
            write!(f, "{:<width$} {} {}", algo.name, Cell(algo.rmse), Cell(algo.mae))?;
            if let Some(m) = &algo.top_n {
                for value in [
                    m.hit_rate,
                    m.cumulative_hit_rate,
                    m.average_reciprocal_hit_rank,
                    m.user_coverage,
                    m.diversity,
                    m.novelty,
                ] {
                    write!(f, " {}", Cell(value))?;
                }
            }
            writeln!(f)?;
        }

        for algo in &self.algorithms {
            let Some(m) = &algo.top_n else {
                continue;
            };
            if m.rating_hit_rate.is_empty() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "Hit rate by rating ({}):", algo.name)?;
            writeln!(f, "{:>8} {:>10}", "Rating", "HR")?;
            for (rating, hit_rate) in &m.rating_hit_rate {
                writeln!(f, "{:>8.1} {}", rating, Cell(Some(*hit_rate)))?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Legend:")?;
        writeln!(f, "RMSE:      Root Mean Squared Error. Lower is better.")?;
        writeln!(f, "MAE:       Mean Absolute Error. Lower is better.")?;
        if top_n {
            writeln!(
                f,
                "HR:        Hit Rate; share of left-out ratings in the top {}. Higher is better.",
                self.n
            )?;
            for line in TOP_N_LEGEND {
                writeln!(f, "{}", line)?;
            }
        }
        writeln!(f, "n/a:       Metric undefined for this data (e.g. no qualifying users).")
    }
}

const TOP_N_LEGEND: [&str; 5] = [
    "cHR:       Cumulative Hit Rate; hit rate on highly rated left-out items. Higher is better.",
    "ARHR:      Average Reciprocal Hit Rank; hit rate rewarding higher ranks. Higher is better.",
    "Coverage:  Share of users with at least one good recommendation. Higher is better.",
    "Diversity: 1 - mean similarity between recommended pairs. Higher is more diverse.",
    "Novelty:   Mean popularity rank of recommended items. Higher is more novel.",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> EvaluationReport {
        EvaluationReport {
            n: 10,
            algorithms: vec![
                AlgorithmMetrics {
                    name: "SVD".to_string(),
                    rmse: Some(0.8731),
                    mae: Some(0.6712),
                    top_n: Some(TopNMetrics {
                        hit_rate: Some(0.03),
                        cumulative_hit_rate: Some(0.05),
                        average_reciprocal_hit_rank: Some(0.011),
                        rating_hit_rate: vec![(4.0, 0.04), (5.0, 0.07)],
                        user_coverage: Some(0.95),
                        diversity: None,
                        novelty: Some(491.5),
                    }),
                },
                AlgorithmMetrics {
                    name: "Random".to_string(),
                    rmse: Some(1.43),
                    mae: Some(1.14),
                    top_n: None,
                },
            ],
        }
    }

    #[test]
    fn test_display_renders_table_and_legend() {
        let text = report().to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("Algorithm"));
        assert!(lines[0].contains("Diversity"));
        assert!(lines[1].starts_with("SVD"));
        assert!(lines[1].contains("0.8731"));
        assert!(lines[1].contains("n/a"));
        assert!(lines[2].starts_with("Random"));
        assert!(text.contains("Legend:"));
        assert!(text.contains("top 10"));
    }

    #[test]
    fn test_display_breaks_hit_rate_down_by_rating() {
        let text = report().to_string();
        assert!(text.contains("Hit rate by rating (SVD):"));
        assert!(!text.contains("Hit rate by rating (Random):"));

        let rows: Vec<&str> = text
            .lines()
            .skip_while(|l| !l.starts_with("Hit rate by rating"))
            .skip(2)
            .take(2)
            .collect();
        assert_eq!(rows[0].split_whitespace().collect::<Vec<_>>(), ["4.0", "0.0400"]);
        assert_eq!(rows[1].split_whitespace().collect::<Vec<_>>(), ["5.0", "0.0700"]);
    }

    #[test]
    fn test_accuracy_only_report_omits_top_n_columns() {
        let mut report = report();
        report.algorithms[0].top_n = None;
        let text = report.to_string();
        assert!(!text.contains("ARHR"));
    }

    #[test]
    fn test_serializes_missing_metrics_as_null() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["algorithms"][0]["top_n"]["diversity"], serde_json::Value::Null);
        assert_eq!(json["algorithms"][1]["name"], "Random");
    }

    #[test]
    fn test_get_by_name() {
        let report = report();
        assert_eq!(report.get("Random").unwrap().rmse, Some(1.43));
        assert!(report.get("AutoRec").is_none());
    }
}
