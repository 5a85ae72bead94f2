use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::game_table::GameTable;
use crate::matchup::MatchupProb;
use crate::pipeline::{PipelineOutput, STAT_COLUMNS, TeamAverages};
use crate::rankings::RankedTeam;

/// Write every named artifact of a run as a tab-separated table. Returns the
/// paths written, in write order.
pub fn write_run_artifacts(
    dir: &Path,
    table: &GameTable,
    out: &PipelineOutput,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("create output dir {}", dir.display()))?;

    let mut written = Vec::new();

    let path = dir.join("composite_ranking.tsv");
    write_ranking(&path, &out.composite_ranking)?;
    written.push(path);

    let path = dir.join("elo_ranking.tsv");
    write_ranking(&path, &out.elo_ranking)?;
    written.push(path);

    let path = dir.join("game_composites.tsv");
    write_game_composites(&path, table, &out.composite_scores)?;
    written.push(path);

    let path = dir.join("team_averages.tsv");
    write_team_averages(&path, &out.team_averages)?;
    written.push(path);

    Ok(written)
}

pub fn write_ranking(path: &Path, ranking: &[RankedTeam]) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    for row in ranking {
        writer
            .serialize(row)
            .with_context(|| format!("write ranking row for {}", row.team))?;
    }
    writer.flush().context("flush ranking table")?;
    Ok(())
}

/// Per-game composite scores, one row per table row. NaN composites are
/// written as empty cells so downstream parsers see missing, not "NaN".
fn write_game_composites(path: &Path, table: &GameTable, scores: &[f64]) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer
        .write_record(["game_id", "team", "opponent_team", "win", "composite_score"])
        .context("write composite header")?;
    for (row, &score) in table.rows.iter().zip(scores) {
        let cell = if score.is_nan() {
            String::new()
        } else {
            format!("{score:.6}")
        };
        let win = row.win.to_string();
        writer
            .write_record([
                row.game_id.as_str(),
                row.team.as_str(),
                row.opponent_team.as_str(),
                win.as_str(),
                cell.as_str(),
            ])
            .with_context(|| format!("write composite row for game {}", row.game_id))?;
    }
    writer.flush().context("flush game composites")?;
    Ok(())
}

fn write_team_averages(path: &Path, averages: &[TeamAverages]) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    let mut header = vec!["team".to_string(), "games_played".to_string()];
    header.extend(STAT_COLUMNS.iter().map(|c| c.to_string()));
    writer.write_record(&header).context("write averages header")?;

    for row in averages {
        let mut record = vec![row.team.clone(), row.games_played.to_string()];
        record.extend(row.values.iter().map(|v| format!("{v:.4}")));
        writer
            .write_record(&record)
            .with_context(|| format!("write averages row for {}", row.team))?;
    }
    writer.flush().context("flush team averages")?;
    Ok(())
}

pub fn write_matchup(path: &Path, prob: &MatchupProb) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer
        .write_record(["team_a", "team_b", "p_a", "p_b"])
        .context("write matchup header")?;
    let p_a = format!("{:.6}", prob.p_a);
    let p_b = format!("{:.6}", prob.p_b);
    writer
        .write_record([prob.team_a.as_str(), prob.team_b.as_str(), p_a.as_str(), p_b.as_str()])
        .context("write matchup row")?;
    writer.flush().context("flush matchup result")?;
    Ok(())
}

fn tsv_writer(path: &Path) -> Result<csv::Writer<fs::File>> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("create output table {}", path.display()))
}
