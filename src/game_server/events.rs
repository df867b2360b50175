//! Events - Discrete race notifications
//!
//! Everything handed to hooks is an owned copy taken when the event fired.

use serde::{Deserialize, Serialize};

use crate::game_server::runner::{RunnerSnapshot, RunnerState};

/// Winner announcement for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinnerEvent {
    /// Round that just ended (first round is 1)
    pub round: u32,
    pub runner_id: u32,
    pub name: String,
    /// Win total including this one
    pub wins: u32,
    pub laps: u32,
    /// Runner state at the moment it crossed the line
    pub snapshot: RunnerSnapshot,
}

impl WinnerEvent {
    pub fn new(round: u32, runner: &RunnerState) -> Self {
        Self {
            round,
            runner_id: runner.id,
            name: runner.name.clone(),
            wins: runner.wins,
            laps: runner.laps,
            snapshot: RunnerSnapshot::from(runner),
        }
    }
}

/// Something the UI or drawing layer may want to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RaceEvent {
    Winner(WinnerEvent),
    SlowmoChanged { active: bool },
    TurboChanged { runner_id: u32, active: bool },
    /// Runners left the start line again
    RoundResumed { round: u32 },
}
