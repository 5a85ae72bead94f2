use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ModelError;
use crate::game_table::GameTable;
use crate::metrics::{self, DerivedRow};

/// Ordered weight vector produced by an offline feature-importance procedure.
/// Weights are raw coefficients, not a convex combination; any real value is
/// legal and the order of entries is preserved.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricWeight {
    pub metric: String,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub struct WeightConfig {
    pub weights: Vec<MetricWeight>,
}

pub fn load_weight_config(path: &Path) -> Result<WeightConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read weight config {}", path.display()))?;
    let weights: Vec<MetricWeight> =
        serde_json::from_str(&raw).with_context(|| format!("parse weight config {}", path.display()))?;
    let cfg = WeightConfig { weights };
    cfg.check_known_metrics().map_err(anyhow::Error::from)?;
    Ok(cfg)
}

impl WeightConfig {
    /// Every configured metric must exist in the derived set; a stray name
    /// is a configuration error and aborts before any scoring.
    pub fn check_known_metrics(&self) -> Result<(), ModelError> {
        for w in &self.weights {
            if !metrics::METRIC_NAMES.contains(&w.metric.as_str()) {
                return Err(ModelError::Configuration(format!(
                    "weight configured for unknown metric '{}'",
                    w.metric
                )));
            }
        }
        if self.weights.is_empty() {
            return Err(ModelError::Configuration(
                "weight configuration is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-row composite score: each configured metric column is min-max
/// normalized over the whole table, then blended with its weight. A row with
/// any NaN configured metric gets a NaN composite.
pub fn composite_scores(
    derived: &[DerivedRow],
    cfg: &WeightConfig,
) -> Result<Vec<f64>, ModelError> {
    cfg.check_known_metrics()?;

    let mut scores = vec![0.0_f64; derived.len()];
    for w in &cfg.weights {
        let column = metrics::metric_column(derived, &w.metric).ok_or_else(|| {
            ModelError::Configuration(format!("metric '{}' missing from derived set", w.metric))
        })?;
        let normalized = metrics::min_max_normalize(&column);
        for (score, norm) in scores.iter_mut().zip(normalized) {
            *score += w.weight * norm;
        }
    }
    Ok(scores)
}

#[derive(Debug, Clone)]
pub struct TeamComposite {
    pub team: String,
    pub games: usize,
    pub average: f64,
}

/// Mean composite per team, skipping NaN rows. Output sorted by team name
/// for stable artifacts.
pub fn team_average_composite(table: &GameTable, scores: &[f64]) -> Vec<TeamComposite> {
    let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
    for (row, &score) in table.rows.iter().zip(scores) {
        if score.is_nan() {
            continue;
        }
        let entry = sums.entry(row.team.as_str()).or_insert((0.0, 0));
        entry.0 += score;
        entry.1 += 1;
    }

    let mut out: Vec<TeamComposite> = sums
        .into_iter()
        .map(|(team, (sum, games))| TeamComposite {
            team: team.to_string(),
            games,
            average: sum / games as f64,
        })
        .collect();
    out.sort_by(|a, b| a.team.cmp(&b.team));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_table::test_rows::pair;
    use crate::game_table::GameTable;
    use crate::metrics::derive_metrics;

    fn cfg(entries: &[(&str, f64)]) -> WeightConfig {
        WeightConfig {
            weights: entries
                .iter()
                .map(|(m, w)| MetricWeight {
                    metric: m.to_string(),
                    weight: *w,
                })
                .collect(),
        }
    }

    #[test]
    fn unknown_metric_is_fatal_configuration_error() {
        let c = cfg(&[("AST%", 1.0), ("WOBBLE%", 2.0)]);
        let err = c.check_known_metrics().unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
        assert!(err.to_string().contains("WOBBLE%"));
    }

    #[test]
    fn empty_weight_vector_rejected() {
        let c = cfg(&[]);
        assert!(c.check_known_metrics().is_err());
    }

    #[test]
    fn composite_is_weighted_sum_of_normalized_metrics() {
        let (mut a, b) = pair("g1", "duke", "unc");
        // Give the two rows different AST% so normalization spans [0, 1].
        a.ast = 20.0;
        let table = GameTable { rows: vec![a, b] };
        let derived = derive_metrics(&table);
        let scores = composite_scores(&derived, &cfg(&[("AST%", 2.0)])).unwrap();
        // Higher AST% row normalizes to 1.0, the other to 0.0.
        assert!((scores[0] - 2.0).abs() < 1e-12);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn negative_weights_are_supported() {
        let (mut a, b) = pair("g1", "duke", "unc");
        a.ast = 20.0;
        let table = GameTable { rows: vec![a, b] };
        let derived = derive_metrics(&table);
        let scores = composite_scores(&derived, &cfg(&[("AST%", -3.0)])).unwrap();
        assert!((scores[0] + 3.0).abs() < 1e-12);
    }

    #[test]
    fn team_average_skips_nan_rows() {
        let (a1, b1) = pair("g1", "duke", "unc");
        let (a2, b2) = pair("g2", "duke", "unc");
        let table = GameTable {
            rows: vec![a1, b1, a2, b2],
        };
        let scores = vec![4.0, 1.0, f64::NAN, 3.0];
        let avgs = team_average_composite(&table, &scores);
        let duke = avgs.iter().find(|t| t.team == "duke").unwrap();
        assert_eq!(duke.games, 1);
        assert_eq!(duke.average, 4.0);
        let unc = avgs.iter().find(|t| t.team == "unc").unwrap();
        assert_eq!(unc.games, 2);
        assert_eq!(unc.average, 2.0);
    }
}
