use crate::game_table::{GameRow, GameTable};

/// Per-game efficiency ratios computed from the raw box score. Degenerate
/// denominators yield NaN; NaN values are excluded from every downstream
/// reduction instead of being coerced to zero.
#[derive(Debug, Clone, Copy)]
pub struct DerivedRow {
    pub possessions: f64,
    pub offensive_rating: f64,
    pub defensive_rating: f64,
    pub net_rating: f64,
    pub ast_pct: f64,
    pub blk_pct: f64,
    pub tov_pct: f64,
    pub tov_team_pct: f64,
    pub stl_pct: f64,
    pub shooting_efficiency: f64,
    pub rebound_score: f64,
    pub assist_turnover_ratio: f64,
    pub defensive_impact: f64,
}

/// Metric names accepted by the weight configuration, matching the column
/// names of the upstream tables.
pub const METRIC_NAMES: &[&str] = &[
    "Possessions",
    "ORtg",
    "DRtg",
    "NRtg",
    "AST%",
    "BLK%",
    "TOV%",
    "TOV_team%",
    "STL%",
    "shooting_efficiency",
    "rebound_score",
    "assist_turnover_ratio",
    "defensive_impact",
];

impl DerivedRow {
    pub fn metric(&self, name: &str) -> Option<f64> {
        let v = match name {
            "Possessions" => self.possessions,
            "ORtg" => self.offensive_rating,
            "DRtg" => self.defensive_rating,
            "NRtg" => self.net_rating,
            "AST%" => self.ast_pct,
            "BLK%" => self.blk_pct,
            "TOV%" => self.tov_pct,
            "TOV_team%" => self.tov_team_pct,
            "STL%" => self.stl_pct,
            "shooting_efficiency" => self.shooting_efficiency,
            "rebound_score" => self.rebound_score,
            "assist_turnover_ratio" => self.assist_turnover_ratio,
            "defensive_impact" => self.defensive_impact,
            _ => return None,
        };
        Some(v)
    }
}

/// Compute derived ratios for every row of the table, in table order.
pub fn derive_metrics(table: &GameTable) -> Vec<DerivedRow> {
    let mut degenerate = 0usize;
    let out: Vec<DerivedRow> = table.rows.iter().map(derive_row).collect();
    for (row, derived) in table.rows.iter().zip(&out) {
        if derived.possessions <= 0.0 || derived.possessions.is_nan() {
            degenerate += 1;
            if degenerate <= 5 {
                eprintln!(
                    "[WARN] game {} team {}: non-positive possessions ({:.2}), ratings dropped",
                    row.game_id, row.team, derived.possessions
                );
            }
        }
    }
    if degenerate > 5 {
        eprintln!("[WARN] {} more rows with non-positive possessions", degenerate - 5);
    }
    out
}

fn derive_row(row: &GameRow) -> DerivedRow {
    let possessions =
        row.team_score + 0.5 * row.fga_composite - row.oreb + row.tov + 0.4 * row.fta;

    // Ratings are undefined on a degenerate possession estimate.
    let (offensive_rating, defensive_rating) = if possessions > 0.0 {
        (
            100.0 * row.team_score / possessions,
            100.0 * row.opponent_team_score / possessions,
        )
    } else {
        (f64::NAN, f64::NAN)
    };

    DerivedRow {
        possessions,
        offensive_rating,
        defensive_rating,
        net_rating: offensive_rating - defensive_rating,
        ast_pct: ratio(row.ast, row.ast + row.tov),
        blk_pct: ratio(row.blk, row.opponent_fga_2 + row.opponent_fga_3),
        tov_pct: ratio(row.tov, possessions),
        tov_team_pct: ratio(row.tov_team, possessions),
        stl_pct: ratio(row.stl, possessions),
        shooting_efficiency: (row.fgm_2 + row.fgm_3 + row.ftm)
            / (row.fga_2 + row.fga_3 + row.fta + 1.0),
        rebound_score: row.dreb + row.oreb,
        assist_turnover_ratio: row.ast / (row.tov + 1.0),
        defensive_impact: row.stl + row.blk - row.f_personal,
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { f64::NAN } else { num / den }
}

/// Min-max rescale a column to [0, 1]. Bounds are computed over the finite
/// values of the slice passed in, never cached across datasets. NaN inputs
/// stay NaN; a constant (or all-NaN) column maps every finite value to 0.0.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }

    let span = max - min;
    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                f64::NAN
            } else if span > 0.0 {
                (v - min) / span
            } else {
                0.0
            }
        })
        .collect()
}

/// Extract one named metric as a column, in row order.
pub fn metric_column(derived: &[DerivedRow], name: &str) -> Option<Vec<f64>> {
    if !METRIC_NAMES.contains(&name) {
        return None;
    }
    Some(derived.iter().map(|d| d.metric(name).unwrap_or(f64::NAN)).collect())
}
