//! Turbo Race - Endless multi-runner race simulation
//!
//! Runners dash along a single track with randomly varying pace and short
//! turbo boosts. Near the finish line the whole race drops into slow motion;
//! the first runner across wins the round and everyone is sent back to the
//! start line.
//!
//! The simulation never owns the frame loop. A host calls
//! [`GameServer::step`] (or [`GameServer::tick`]) once per frame and draws
//! the returned [`RaceSnapshot`]. [`run`] is a small headless host.

mod game_server;

pub use game_server::pacing;
pub use game_server::{
    ConfigError, GameServer, GameState, PresentationSurface, Race, RaceConfig, RaceEvent,
    RacePhase, RaceSnapshot, Runner, RunnerSnapshot, RunnerState, ServerStats, SlowMotion,
    SlowmoConfig, SpeedConfig, TurboConfig, TurboState, TurboTransition, WinnerEvent,
    WinnerFramePolicy, WobbleConfig,
};

use std::thread;
use std::time::{Duration, Instant};

/// Options for the headless host loop
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: RaceConfig,
    /// Wall-clock seconds to run for
    pub duration_secs: f32,
    /// Frames per second to pump
    pub fps: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config: RaceConfig::default(),
            duration_secs: 30.0,
            fps: 60,
        }
    }
}

/// What a headless run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames: u64,
    pub rounds_completed: u32,
    pub scoreboard: Vec<(String, u32)>,
}

/// Pump a race in real time, logging winners, until the duration elapses.
///
/// Durations that cannot be represented as a wall-clock deadline (negative,
/// NaN, infinite, or far in the future) are rejected before the race starts.
pub fn run(options: RunOptions) -> Result<RunSummary, ConfigError> {
    let duration_secs = options.duration_secs;
    let deadline = Duration::try_from_secs_f32(duration_secs)
        .ok()
        .and_then(|duration| Instant::now().checked_add(duration))
        .ok_or(ConfigError::OutOfRange {
            name: "duration_secs",
            value: duration_secs,
            expected: "a representable number of seconds",
        })?;

    let mut server = GameServer::new();
    server.init_race(options.config)?;

    server.on_winner(|winner| {
        log::info!(
            "WINNER: {} (round {}, {} wins)",
            winner.name,
            winner.round,
            winner.wins
        );
    });
    server.on_slowmo_change(|active| {
        log::info!("Slow motion {}", if active { "on" } else { "off" });
    });

    let frame_time = Duration::from_secs_f32(1.0 / options.fps.max(1) as f32);

    while Instant::now() < deadline {
        let frame_start = Instant::now();
        server.tick();
        if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }

    let stats = server.get_stats();
    let summary = RunSummary {
        frames: stats.frames,
        rounds_completed: stats.rounds_completed,
        scoreboard: server.scoreboard(),
    };
    server.stop();

    Ok(summary)
}
