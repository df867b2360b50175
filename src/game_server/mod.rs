//! Game Server Module
//!
//! Endless turbo race simulation. The host pumps frames in through
//! `GameServer::step` and draws whatever comes back out.

pub mod config;
pub mod events;
pub mod pacing;
pub mod race;
pub mod runner;
pub mod simulation;
pub mod slowmo;
pub mod turbo;

pub use config::{
    ConfigError, RaceConfig, SlowmoConfig, SpeedConfig, TurboConfig, WinnerFramePolicy,
    WobbleConfig,
};
pub use events::{RaceEvent, WinnerEvent};
pub use race::{Race, RacePhase, RaceSnapshot};
pub use runner::{Runner, RunnerSnapshot, RunnerState};
pub use simulation::{GameServer, GameState, PresentationSurface, ServerStats};
pub use slowmo::SlowMotion;
pub use turbo::{TurboState, TurboTransition};
