use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::game_table::Delimiter;

/// One line of the team→region mapping table.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionRow {
    pub team: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedTeam {
    pub team: String,
    pub region: String,
    pub rating: f64,
    pub rank: u32,
}

pub fn load_team_regions(path: &Path, delimiter: Option<Delimiter>) -> Result<Vec<RegionRow>> {
    let delim = delimiter.unwrap_or_else(|| Delimiter::for_path(path));
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delim.as_byte())
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open team region table {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.deserialize::<RegionRow>() {
        rows.push(record.context("decode team region row")?);
    }
    Ok(rows)
}

/// Partition teams by region and dense-rank them by rating, descending.
/// Ties share a rank and the next distinct rating continues at rank+1.
/// Equal ratings order alphabetically so output is deterministic. Teams in
/// the region map with no rating are reported and skipped.
pub fn rank_by_region(
    ratings: &HashMap<String, f64>,
    regions: &[RegionRow],
) -> Vec<RankedTeam> {
    let mut by_region: HashMap<&str, Vec<(&str, f64)>> = HashMap::new();
    for row in regions {
        let Some(&rating) = ratings.get(&row.team) else {
            eprintln!(
                "[WARN] team {} has a region ({}) but no rating; skipped",
                row.team, row.region
            );
            continue;
        };
        by_region
            .entry(row.region.as_str())
            .or_default()
            .push((row.team.as_str(), rating));
    }

    let mut region_names: Vec<&str> = by_region.keys().copied().collect();
    region_names.sort();

    let mut out = Vec::new();
    for region in region_names {
        let mut teams = by_region.remove(region).unwrap_or_default();
        teams.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });

        let mut rank = 0u32;
        let mut prev_rating: Option<f64> = None;
        for (team, rating) in teams {
            if prev_rating != Some(rating) {
                rank += 1;
                prev_rating = Some(rating);
            }
            out.push(RankedTeam {
                team: team.to_string(),
                region: region.to_string(),
                rating,
                rank,
            });
        }
    }
    out
}
