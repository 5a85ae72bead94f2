use std::collections::HashMap;

use crate::error::ModelError;
use crate::rankings::RankedTeam;

/// Rating lookups keyed by trimmed, lowercased team name, built from one of
/// the precomputed ranking tables.
#[derive(Debug, Clone)]
pub struct RatingBook {
    table: &'static str,
    ratings: HashMap<String, f64>,
}

impl RatingBook {
    pub fn from_ranked(table: &'static str, rows: &[RankedTeam]) -> Self {
        let ratings = rows
            .iter()
            .map(|r| (normalize_team_key(&r.team), r.rating))
            .collect();
        Self { table, ratings }
    }

    pub fn get(&self, team: &str) -> Result<f64, ModelError> {
        self.ratings
            .get(&normalize_team_key(team))
            .copied()
            .ok_or_else(|| ModelError::TeamNotFound {
                team: team.trim().to_string(),
                table: self.table,
            })
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}

pub fn normalize_team_key(team: &str) -> String {
    team.trim().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct MatchupProb {
    pub team_a: String,
    pub team_b: String,
    pub p_a: f64,
    pub p_b: f64,
}

/// Win probability from the blended rating difference.
///
/// `blend` weighs the composite-score difference against the pairwise-rating
/// difference: 0 means pairwise ratings only, 1 means composite only.
pub fn matchup_probability(
    composite: &RatingBook,
    pairwise: &RatingBook,
    team_a: &str,
    team_b: &str,
    blend: f64,
) -> Result<MatchupProb, ModelError> {
    if !(0.0..=1.0).contains(&blend) {
        return Err(ModelError::Configuration(format!(
            "blend weight {blend} outside [0, 1]"
        )));
    }

    let composite_a = composite.get(team_a)?;
    let composite_b = composite.get(team_b)?;
    let elo_a = pairwise.get(team_a)?;
    let elo_b = pairwise.get(team_b)?;

    let combined_diff =
        blend * (composite_a - composite_b) + (1.0 - blend) * (elo_a - elo_b);
    let p_a = 1.0 / (1.0 + 10.0_f64.powf(-combined_diff / 400.0));

    Ok(MatchupProb {
        team_a: team_a.trim().to_string(),
        team_b: team_b.trim().to_string(),
        p_a,
        p_b: 1.0 - p_a,
    })
}
