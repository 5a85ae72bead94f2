use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ModelError;

/// One row of the merged game table: a single team's side of a single game.
/// Every game contributes exactly two mirrored rows (one per participant).
#[derive(Debug, Clone, Default)]
pub struct GameRow {
    pub game_id: String,
    pub team: String,
    pub opponent_team: String,
    pub win: u8,
    pub team_score: f64,
    pub opponent_team_score: f64,
    pub point_differential: f64,
    pub fga_2: f64,
    pub fgm_2: f64,
    pub fga_3: f64,
    pub fgm_3: f64,
    pub fta: f64,
    pub ftm: f64,
    pub ast: f64,
    pub blk: f64,
    pub stl: f64,
    pub tov: f64,
    pub tov_team: f64,
    pub dreb: f64,
    pub oreb: f64,
    pub f_personal: f64,
    /// Weighted shot-attempt blend computed upstream; opaque here.
    pub fga_composite: f64,
    pub opponent_fga_2: f64,
    pub opponent_fga_3: f64,
}

/// Wire shape of the tabular input. The win column is optional: when absent
/// it is derived from the score columns.
#[derive(Debug, Clone, Deserialize)]
struct RawGameRow {
    game_id: String,
    team: String,
    opponent_team: String,
    #[serde(default, alias = "Win")]
    win: Option<f64>,
    team_score: f64,
    opponent_team_score: f64,
    #[serde(rename = "FGA_2")]
    fga_2: f64,
    #[serde(rename = "FGM_2")]
    fgm_2: f64,
    #[serde(rename = "FGA_3")]
    fga_3: f64,
    #[serde(rename = "FGM_3")]
    fgm_3: f64,
    #[serde(rename = "FTA")]
    fta: f64,
    #[serde(rename = "FTM")]
    ftm: f64,
    #[serde(rename = "AST")]
    ast: f64,
    #[serde(rename = "BLK")]
    blk: f64,
    #[serde(rename = "STL")]
    stl: f64,
    #[serde(rename = "TOV")]
    tov: f64,
    #[serde(rename = "TOV_team")]
    tov_team: f64,
    #[serde(rename = "DREB")]
    dreb: f64,
    #[serde(rename = "OREB")]
    oreb: f64,
    #[serde(rename = "F_personal")]
    f_personal: f64,
    #[serde(rename = "FGA%")]
    fga_composite: f64,
    #[serde(rename = "opponent_FGA2")]
    opponent_fga_2: f64,
    #[serde(rename = "opponent_FGA3")]
    opponent_fga_3: f64,
}

/// Ordered, validated collection of game rows. Row order is preserved from
/// the input file; the iterative solver treats that order as significant.
#[derive(Debug, Clone)]
pub struct GameTable {
    pub rows: Vec<GameRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
        }
    }

    /// Guess from the file extension; merged tables are tab-separated in
    /// practice, so tab is the fallback.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Delimiter::Comma,
            _ => Delimiter::Tab,
        }
    }
}

pub fn load_game_table(path: &Path, delimiter: Option<Delimiter>) -> Result<GameTable> {
    let delim = delimiter.unwrap_or_else(|| Delimiter::for_path(path));
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delim.as_byte())
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open game table {}", path.display()))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<RawGameRow>().enumerate() {
        let raw = record.with_context(|| format!("decode game row {} (1-based data row)", idx + 1))?;
        rows.push(finalize_row(raw)?);
    }

    let table = GameTable { rows };
    table.validate().map_err(anyhow::Error::from)?;
    Ok(table)
}

fn finalize_row(raw: RawGameRow) -> Result<GameRow> {
    let win = match raw.win {
        Some(v) if v == 0.0 => 0,
        Some(v) if v == 1.0 => 1,
        Some(v) => {
            return Err(ModelError::DataIntegrity(format!(
                "game {} team {}: win value {} outside {{0, 1}}",
                raw.game_id, raw.team, v
            ))
            .into());
        }
        // Absent win column: derive from the final score.
        None => u8::from(raw.team_score > raw.opponent_team_score),
    };

    Ok(GameRow {
        point_differential: raw.team_score - raw.opponent_team_score,
        game_id: raw.game_id,
        team: raw.team,
        opponent_team: raw.opponent_team,
        win,
        team_score: raw.team_score,
        opponent_team_score: raw.opponent_team_score,
        fga_2: raw.fga_2,
        fgm_2: raw.fgm_2,
        fga_3: raw.fga_3,
        fgm_3: raw.fgm_3,
        fta: raw.fta,
        ftm: raw.ftm,
        ast: raw.ast,
        blk: raw.blk,
        stl: raw.stl,
        tov: raw.tov,
        tov_team: raw.tov_team,
        dreb: raw.dreb,
        oreb: raw.oreb,
        f_personal: raw.f_personal,
        fga_composite: raw.fga_composite,
        opponent_fga_2: raw.opponent_fga_2,
        opponent_fga_3: raw.opponent_fga_3,
    })
}

impl GameTable {
    /// Enforce the pairing invariant: every game_id has exactly two rows,
    /// mutual mirrors of each other, with complementary win flags and no
    /// self-play. Violations reject the whole table before any computation.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut by_game: HashMap<&str, Vec<&GameRow>> = HashMap::new();
        for row in &self.rows {
            if row.team == row.opponent_team {
                return Err(ModelError::DataIntegrity(format!(
                    "game {}: team {} is listed as its own opponent",
                    row.game_id, row.team
                )));
            }
            by_game.entry(row.game_id.as_str()).or_default().push(row);
        }

        let mut bad: Vec<String> = Vec::new();
        for (game_id, pair) in &by_game {
            if pair.len() != 2 {
                bad.push(format!("game {game_id}: {} rows, expected 2", pair.len()));
                continue;
            }
            let (a, b) = (pair[0], pair[1]);
            if a.team != b.opponent_team || b.team != a.opponent_team {
                bad.push(format!(
                    "game {game_id}: rows are not mirrored ({} vs {}, {} vs {})",
                    a.team, a.opponent_team, b.team, b.opponent_team
                ));
                continue;
            }
            if a.win + b.win != 1 {
                bad.push(format!(
                    "game {game_id}: win flags are not complementary ({} and {})",
                    a.win, b.win
                ));
            }
            if a.team_score != b.opponent_team_score || b.team_score != a.opponent_team_score {
                bad.push(format!("game {game_id}: score columns do not mirror"));
            }
        }

        if bad.is_empty() {
            Ok(())
        } else {
            bad.sort();
            Err(ModelError::DataIntegrity(bad.join("; ")))
        }
    }

    /// Opponent row lookup keyed by game_id, never by table adjacency.
    pub fn opponent_of(&self, row: &GameRow) -> Option<&GameRow> {
        self.rows
            .iter()
            .find(|r| r.game_id == row.game_id && r.team == row.opponent_team)
    }

    /// Appearance counts per team (one per side per game).
    pub fn games_played(&self) -> HashMap<String, usize> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for row in &self.rows {
            *counts.entry(row.team.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn wins(&self) -> HashMap<String, usize> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for row in &self.rows {
            if row.win == 1 {
                *counts.entry(row.team.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}


#[cfg(test)]
mod tests {
    use super::test_rows::{pair, row};
    use super::*;

    #[test]
    fn mirrored_pair_validates() {
        let (a, b) = pair("g1", "duke", "unc");
        let table = GameTable { rows: vec![a, b] };
        assert!(table.validate().is_ok());
    }

    #[test]
    fn complementary_win_flags_required() {
        let (a, mut b) = pair("g1", "duke", "unc");
        b.win = 1;
        let table = GameTable { rows: vec![a, b] };
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("not complementary"));
    }

    #[test]
    fn self_play_rejected() {
        let r = row("g1", "duke", "duke", 80.0, 70.0, 1);
        let table = GameTable { rows: vec![r] };
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("own opponent"));
    }

    #[test]
    fn orphan_row_rejected() {
        let (a, _) = pair("g1", "duke", "unc");
        let table = GameTable { rows: vec![a] };
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn opponent_lookup_uses_game_id_not_adjacency() {
        let (a1, b1) = pair("g1", "duke", "unc");
        let (a2, b2) = pair("g2", "unc", "duke");
        // Interleave so adjacency would give the wrong answer.
        let table = GameTable {
            rows: vec![a1, a2, b1, b2],
        };
        let opp = table.opponent_of(&table.rows[0]).unwrap();
        assert_eq!(opp.game_id, "g1");
        assert_eq!(opp.team, "unc");
    }

    #[test]
    fn games_played_counts_every_side() {
        let (a1, b1) = pair("g1", "duke", "unc");
        let (a2, b2) = pair("g2", "duke", "kansas");
        let table = GameTable {
            rows: vec![a1, b1, a2, b2],
        };
        let counts = table.games_played();
        assert_eq!(counts.get("duke"), Some(&2));
        assert_eq!(counts.get("unc"), Some(&1));
        let wins = table.wins();
        assert_eq!(wins.get("duke"), Some(&2));
        assert_eq!(wins.get("kansas"), None);
    }
}
