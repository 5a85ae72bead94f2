use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::composite::{self, TeamComposite, WeightConfig};
use crate::elo::{self, EloConfig, SolveReport};
use crate::game_table::{Delimiter, GameRow, GameTable, load_game_table};
use crate::metrics;
use crate::rankings::{self, RankedTeam, load_team_regions};

/// Inputs for one batch run. Every table is re-read and every rating
/// recomputed from scratch; nothing is carried over between runs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub games_path: PathBuf,
    pub regions_path: PathBuf,
    pub weights_path: PathBuf,
    pub delimiter: Option<Delimiter>,
    pub elo: EloConfig,
}

/// Every named artifact of a run. Intermediate stages are kept instead of
/// being overwritten in place so each can be exported and tested on its own.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub composite_scores: Vec<f64>,
    pub team_composites: Vec<TeamComposite>,
    pub composite_ranking: Vec<RankedTeam>,
    pub elo_report: SolveReport,
    pub elo_ranking: Vec<RankedTeam>,
    pub team_averages: Vec<TeamAverages>,
}

/// Load-and-run convenience: returns the validated table alongside the
/// outputs so callers can export per-row artifacts.
pub fn run(cfg: &PipelineConfig) -> Result<(GameTable, PipelineOutput)> {
    let table = load_game_table(&cfg.games_path, cfg.delimiter)?;
    let regions = load_team_regions(&cfg.regions_path, cfg.delimiter)?;
    let weights = composite::load_weight_config(&cfg.weights_path)?;
    let output = run_in_memory(&table, &regions, &weights, cfg.elo)?;
    Ok((table, output))
}

pub fn run_in_memory(
    table: &GameTable,
    regions: &[rankings::RegionRow],
    weights: &WeightConfig,
    elo_cfg: EloConfig,
) -> Result<PipelineOutput> {
    // Composite branch: derive → normalize+blend → per-team mean → rank.
    let derived = metrics::derive_metrics(table);
    let composite_scores = composite::composite_scores(&derived, weights)
        .context("composite aggregation")?;
    let team_composites = composite::team_average_composite(table, &composite_scores);
    let composite_map: HashMap<String, f64> = team_composites
        .iter()
        .map(|t| (t.team.clone(), t.average))
        .collect();
    let composite_ranking = rankings::rank_by_region(&composite_map, regions);

    // Pairwise branch: iterative solve over the table's file order → rank.
    let elo_report = elo::solve(&table.rows, elo_cfg).context("iterative rating solve")?;
    let elo_ranking = rankings::rank_by_region(&elo_report.ratings, regions);

    let team_averages = team_stat_averages(table);

    Ok(PipelineOutput {
        composite_scores,
        team_composites,
        composite_ranking,
        elo_report,
        elo_ranking,
        team_averages,
    })
}

/// Raw stat columns carried into the per-team averages artifact.
pub const STAT_COLUMNS: &[&str] = &[
    "FGA_2",
    "FGM_2",
    "FGA_3",
    "FGM_3",
    "FTA",
    "FTM",
    "AST",
    "BLK",
    "STL",
    "TOV",
    "TOV_team",
    "DREB",
    "OREB",
    "F_personal",
    "team_score",
    "opponent_team_score",
    "point_differential",
];

#[derive(Debug, Clone)]
pub struct TeamAverages {
    pub team: String,
    pub games_played: usize,
    /// Aligned with STAT_COLUMNS.
    pub values: Vec<f64>,
}

fn stat_value(row: &GameRow, name: &str) -> f64 {
    match name {
        "FGA_2" => row.fga_2,
        "FGM_2" => row.fgm_2,
        "FGA_3" => row.fga_3,
        "FGM_3" => row.fgm_3,
        "FTA" => row.fta,
        "FTM" => row.ftm,
        "AST" => row.ast,
        "BLK" => row.blk,
        "STL" => row.stl,
        "TOV" => row.tov,
        "TOV_team" => row.tov_team,
        "DREB" => row.dreb,
        "OREB" => row.oreb,
        "F_personal" => row.f_personal,
        "team_score" => row.team_score,
        "opponent_team_score" => row.opponent_team_score,
        "point_differential" => row.point_differential,
        other => unreachable!("unknown stat column {other}"),
    }
}

/// Season averages of the raw stat columns, one row per team, sorted by
/// team name.
pub fn team_stat_averages(table: &GameTable) -> Vec<TeamAverages> {
    let mut sums: HashMap<&str, (usize, Vec<f64>)> = HashMap::new();
    for row in &table.rows {
        let entry = sums
            .entry(row.team.as_str())
            .or_insert_with(|| (0, vec![0.0; STAT_COLUMNS.len()]));
        entry.0 += 1;
        for (acc, name) in entry.1.iter_mut().zip(STAT_COLUMNS) {
            *acc += stat_value(row, name);
        }
    }

    let mut out: Vec<TeamAverages> = sums
        .into_iter()
        .map(|(team, (games, totals))| TeamAverages {
            team: team.to_string(),
            games_played: games,
            values: totals.into_iter().map(|t| t / games as f64).collect(),
        })
        .collect();
    out.sort_by(|a, b| a.team.cmp(&b.team));
    out
}
