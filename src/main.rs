//! Headless turbo race runner.
//!
//! Run with: cargo run -- --seconds 20 --seed 7

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use turbo_race::{run, RaceConfig, RunOptions, WinnerFramePolicy};

#[derive(Parser)]
#[command(name = "turbo-race")]
#[command(about = "Endless turbo race simulation", long_about = None)]
struct Cli {
    /// JSON race config; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of runners
    #[arg(short, long)]
    runners: Option<u32>,

    /// RNG seed for a reproducible race
    #[arg(long)]
    seed: Option<u64>,

    /// Wall-clock seconds to run
    #[arg(long, default_value = "30.0")]
    seconds: f32,

    /// Frames per second
    #[arg(long, default_value = "60")]
    fps: u32,

    /// Keep updating runners after the winner on the winning frame
    #[arg(long)]
    update_all: bool,

    /// Verbosity level (RUST_LOG takes precedence)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            RaceConfig::from_json(&json)?
        }
        None => RaceConfig::default(),
    };
    if let Some(runners) = cli.runners {
        config.runner_count = runners;
    }
    if let Some(seed) = cli.seed {
        config.rng_seed = Some(seed);
    }
    if cli.update_all {
        config.winner_frame_policy = WinnerFramePolicy::UpdateAll;
    }

    let summary = run(RunOptions {
        config,
        duration_secs: cli.seconds,
        fps: cli.fps,
    })?;

    println!(
        "{} frames, {} rounds",
        summary.frames, summary.rounds_completed
    );
    println!("Scoreboard");
    for (name, wins) in &summary.scoreboard {
        println!("  {} : {}", name, wins);
    }

    Ok(())
}
