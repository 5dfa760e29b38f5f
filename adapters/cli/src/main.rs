#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Whack rounds.

mod play;
mod player;
mod terminal;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use whack_controller::RoundController;
use whack_core::RoundConfig;
use whack_scores::{submit_final_score, JsonScoreStore, ScoreStore};

use crate::{
    play::{play_round, FrameClock},
    player::{PlayerProfile, SimulatedPlayer},
    terminal::TerminalPresentation,
};

const DEFAULT_SCORES_PATH: &str = "whack-scores.json";
const PLAYER_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Parser)]
#[command(name = "whack")]
#[command(about = "Play timed whack-a-mole rounds with a simulated player")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Play one round and print what happens
    Play(PlayArgs),
    /// Print the leaderboard
    Scores {
        /// Leaderboard file
        #[arg(long, default_value = DEFAULT_SCORES_PATH)]
        scores: PathBuf,
        /// Number of entries to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the default round configuration as TOML
    Config,
}

#[derive(Debug, Args)]
struct PlayArgs {
    /// TOML file overriding the default round configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for spawn decisions and the simulated player
    #[arg(long)]
    seed: Option<u64>,
    /// Record the final score under this name
    #[arg(long)]
    name: Option<String>,
    /// Leaderboard file
    #[arg(long, default_value = DEFAULT_SCORES_PATH)]
    scores: PathBuf,
    /// Probability that the player notices a spawn
    #[arg(long, default_value_t = 0.8, value_parser = probability)]
    accuracy: f64,
    /// Typical reaction time in milliseconds
    #[arg(long, default_value_t = 450)]
    reaction_ms: u64,
    /// Probability that a click lands beside the target
    #[arg(long, default_value_t = 0.05, value_parser = probability)]
    misclick: f64,
    /// Pace the round against the wall clock
    #[arg(long)]
    realtime: bool,
    /// Frame length in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
}

fn probability(value: &str) -> Result<f64, String> {
    let parsed: f64 = value
        .parse()
        .map_err(|error| format!("`{value}` is not a number: {error}"))?;
    if (0.0..=1.0).contains(&parsed) {
        Ok(parsed)
    } else {
        Err(format!("`{value}` is outside [0, 1]"))
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => run_play(args),
        Commands::Scores { scores, limit } => print_scores(&scores, limit),
        Commands::Config => print_default_config(),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn run_play(args: PlayArgs) -> Result<()> {
    if args.frame_ms == 0 {
        bail!("--frame-ms must be at least 1");
    }
    let config = load_config(args.config.as_deref())?;
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, "starting round");

    let columns = config.columns;
    let mut controller =
        RoundController::with_seed(config, seed).context("invalid round configuration")?;
    let profile = PlayerProfile {
        accuracy: args.accuracy,
        reaction: Duration::from_millis(args.reaction_ms),
        misclick: args.misclick,
    };
    let mut player = SimulatedPlayer::new(profile, seed ^ PLAYER_SEED_SALT);
    let mut presentation = TerminalPresentation::new(io::stdout().lock(), columns);

    let frame = Duration::from_millis(args.frame_ms);
    let clock = if args.realtime {
        FrameClock::Realtime { frame }
    } else {
        FrameClock::Simulated { step: frame }
    };

    println!("seed {seed}");
    let final_score = play_round(&mut controller, &mut player, &mut presentation, clock);
    let _ = presentation
        .finish()
        .context("failed to write round transcript")?;

    if let Some(name) = args.name {
        let mut store = JsonScoreStore::new(&args.scores);
        if submit_final_score(&mut store, &name, final_score) {
            println!("saved {final_score} for {} to {}", name.trim(), args.scores.display());
        } else {
            warn!(path = %args.scores.display(), "score not saved");
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RoundConfig> {
    let Some(path) = path else {
        return Ok(RoundConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config: RoundConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config at {}", path.display()))?;
    Ok(config)
}

fn print_scores(path: &Path, limit: usize) -> Result<()> {
    let store = JsonScoreStore::new(path);
    let entries = store
        .load_top_scores(limit)
        .with_context(|| format!("failed to load leaderboard at {}", path.display()))?;

    let mut out = io::stdout().lock();
    if entries.is_empty() {
        writeln!(out, "no scores recorded yet")?;
        return Ok(());
    }
    for (rank, entry) in entries.iter().enumerate() {
        writeln!(out, "{:>3}. {:<24} {:>6}", rank + 1, entry.name, entry.score)?;
    }
    Ok(())
}

fn print_default_config() -> Result<()> {
    let rendered =
        toml::to_string_pretty(&RoundConfig::default()).context("failed to render config")?;
    print!("{rendered}");
    Ok(())
}
