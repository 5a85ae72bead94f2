use std::fs;
use std::path::PathBuf;

use hoopsight::elo::EloConfig;
use hoopsight::export;
use hoopsight::matchup::MatchupProb;
use hoopsight::pipeline::{self, PipelineConfig};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hoopsight_{tag}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn mini_config() -> PipelineConfig {
    PipelineConfig {
        games_path: fixture("mini_games.tsv"),
        regions_path: fixture("team_regions.tsv"),
        weights_path: fixture("weights.json"),
        delimiter: None,
        elo: EloConfig::default(),
    }
}

#[test]
fn run_artifacts_are_tab_separated_with_headers() {
    let (table, out) = pipeline::run(&mini_config()).unwrap();
    let dir = scratch_dir("artifacts");
    let written = export::write_run_artifacts(&dir, &table, &out).unwrap();
    assert_eq!(written.len(), 4);

    let ranking = fs::read_to_string(dir.join("elo_ranking.tsv")).unwrap();
    let mut lines = ranking.lines();
    assert_eq!(lines.next(), Some("team\tregion\trating\trank"));
    // Header plus one row per ranked team.
    assert_eq!(ranking.lines().count(), 1 + out.elo_ranking.len());

    let averages = fs::read_to_string(dir.join("team_averages.tsv")).unwrap();
    let header = averages.lines().next().unwrap();
    assert!(header.starts_with("team\tgames_played\tFGA_2"));
    assert_eq!(averages.lines().count(), 1 + out.team_averages.len());

    let composites = fs::read_to_string(dir.join("game_composites.tsv")).unwrap();
    assert_eq!(composites.lines().count(), 1 + table.rows.len());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn matchup_artifact_round_trips_probabilities() {
    let dir = scratch_dir("matchup");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("matchup.tsv");
    let prob = MatchupProb {
        team_a: "duke".to_string(),
        team_b: "gonzaga".to_string(),
        p_a: 0.6125,
        p_b: 0.3875,
    };
    export::write_matchup(&path, &prob).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    let mut lines = raw.lines();
    assert_eq!(lines.next(), Some("team_a\tteam_b\tp_a\tp_b"));
    assert_eq!(lines.next(), Some("duke\tgonzaga\t0.612500\t0.387500"));

    let _ = fs::remove_dir_all(&dir);
}
