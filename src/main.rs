use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;

use hoopsight::elo::EloConfig;
use hoopsight::export;
use hoopsight::game_table::Delimiter;
use hoopsight::matchup::{self, RatingBook};
use hoopsight::pipeline::{self, PipelineConfig};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("rank") => run_rank(&args[1..]),
        Some("predict") => run_predict(&args[1..]),
        Some("--help") | Some("-h") | None => {
            print_usage();
            Ok(())
        }
        Some(other) => Err(anyhow!("unknown command '{other}', try --help")),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("hoopsight - team strength ratings and matchup predictions");
    println!();
    println!("USAGE:");
    println!("  hoopsight rank --games <path> --regions <path> --weights <path> [--out <dir>]");
    println!("                 [--delimiter tab|comma] [--max-passes N] [--k F]");
    println!("  hoopsight predict --games <path> --regions <path> --weights <path>");
    println!("                 --team-a <name> --team-b <name> [--blend 0.5]");
    println!();
    println!("Paths fall back to HOOPSIGHT_GAMES, HOOPSIGHT_REGIONS, HOOPSIGHT_WEIGHTS.");
}

fn run_rank(args: &[String]) -> Result<()> {
    let cfg = PipelineConfig {
        games_path: required_path(args, "--games", "HOOPSIGHT_GAMES")?,
        regions_path: required_path(args, "--regions", "HOOPSIGHT_REGIONS")?,
        weights_path: required_path(args, "--weights", "HOOPSIGHT_WEIGHTS")?,
        delimiter: parse_delimiter(args)?,
        elo: parse_elo_config(args)?,
    };
    let out_dir = flag_value(args, "--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("output"));

    let started = Utc::now();
    let (table, output) = pipeline::run(&cfg)?;

    let written = export::write_run_artifacts(&out_dir, &table, &output)?;

    println!("Run started {}", started.to_rfc3339());
    println!(
        "Games: {} rows, {} teams",
        table.rows.len(),
        output.elo_report.ratings.len()
    );
    println!(
        "Solver: {} passes, last max change {:.4}{}",
        output.elo_report.passes_run,
        output.elo_report.last_max_change,
        if output.elo_report.converged {
            " (converged)"
        } else {
            ""
        }
    );
    for path in written {
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn run_predict(args: &[String]) -> Result<()> {
    let team_a = flag_value(args, "--team-a").context("missing --team-a")?;
    let team_b = flag_value(args, "--team-b").context("missing --team-b")?;
    let blend = match flag_value(args, "--blend") {
        Some(raw) => raw
            .parse::<f64>()
            .with_context(|| format!("invalid --blend value '{raw}'"))?,
        None => 0.5,
    };

    let cfg = PipelineConfig {
        games_path: required_path(args, "--games", "HOOPSIGHT_GAMES")?,
        regions_path: required_path(args, "--regions", "HOOPSIGHT_REGIONS")?,
        weights_path: required_path(args, "--weights", "HOOPSIGHT_WEIGHTS")?,
        delimiter: parse_delimiter(args)?,
        elo: parse_elo_config(args)?,
    };
    let (_table, output) = pipeline::run(&cfg)?;

    let composite_book = RatingBook::from_ranked("composite", &output.composite_ranking);
    let pairwise_book = RatingBook::from_ranked("pairwise", &output.elo_ranking);
    let prob =
        matchup::matchup_probability(&composite_book, &pairwise_book, &team_a, &team_b, blend)?;

    println!("Matchup: {} vs {}", prob.team_a, prob.team_b);
    println!("{}: {:.2}%", prob.team_a, prob.p_a * 100.0);
    println!("{}: {:.2}%", prob.team_b, prob.p_b * 100.0);

    if let Some(out) = flag_value(args, "--out") {
        let path = PathBuf::from(out).join("matchup.tsv");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        export::write_matchup(&path, &prob)?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn parse_delimiter(args: &[String]) -> Result<Option<Delimiter>> {
    match flag_value(args, "--delimiter").as_deref() {
        None => Ok(None),
        Some("tab") => Ok(Some(Delimiter::Tab)),
        Some("comma") => Ok(Some(Delimiter::Comma)),
        Some(other) => Err(anyhow!("unknown delimiter '{other}', use tab or comma")),
    }
}

fn parse_elo_config(args: &[String]) -> Result<EloConfig> {
    let mut cfg = EloConfig::default();
    if let Some(raw) = flag_value(args, "--max-passes") {
        cfg.max_passes = raw
            .parse::<usize>()
            .with_context(|| format!("invalid --max-passes value '{raw}'"))?;
    }
    if let Some(raw) = flag_value(args, "--k") {
        cfg.k = raw
            .parse::<f64>()
            .with_context(|| format!("invalid --k value '{raw}'"))?;
    }
    Ok(cfg)
}

fn required_path(args: &[String], flag: &str, env_key: &str) -> Result<PathBuf> {
    if let Some(raw) = flag_value(args, flag) {
        return Ok(PathBuf::from(raw));
    }
    if let Ok(raw) = std::env::var(env_key)
        && !raw.trim().is_empty()
    {
        return Ok(PathBuf::from(raw.trim()));
    }
    Err(anyhow!("missing {flag} (or {env_key})"))
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
