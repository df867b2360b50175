//! Runner - Individual runner state and behavior
//!
//! Each runner has a position along the race axis, a stochastic pace and a
//! turbo state machine. The race updates every runner each frame.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::game_server::config::{RaceConfig, WobbleConfig};
use crate::game_server::pacing;
use crate::game_server::turbo::{TurboState, TurboTransition};

/// Complete state for a single runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerState {
    /// Unique runner ID (lane index)
    pub id: u32,
    /// Runner name
    pub name: String,
    /// Distance along the race axis (meters)
    pub position: f32,
    /// Travel direction, always forward (+1)
    pub direction: f32,
    /// Where the runner is teleported back to after each round
    pub start_position: f32,
    /// Cross-axis lane offset, only used for drawing
    pub lane_offset: f32,
    /// Fixed for the runner's lifetime
    pub base_speed: f32,
    /// Current desired speed before turbo
    pub target_speed: f32,
    /// Current eased speed (m/s)
    pub current_speed: f32,
    pub time_since_speed_change: f32,
    pub next_change_interval: f32,
    /// Boost state machine
    pub turbo: TurboState,
    /// Body wobble angle (radians)
    pub rotation_phase: f32,
    /// Wobble direction, flips at the limit
    pub rotation_dir: f32,
    /// Rounds won
    pub wins: u32,
    /// Finish line crossings
    pub laps: u32,
}

impl RunnerState {
    /// Create a runner lined up at the start of lane `index`
    pub fn new(index: usize, config: &RaceConfig, rng: &mut StdRng) -> Self {
        let base_speed = pacing::roll_base_speed(&config.speed, rng);
        Self {
            id: index as u32,
            name: config.runner_name(index),
            position: config.start_position,
            direction: 1.0,
            start_position: config.start_position,
            lane_offset: config.lane_offset(index),
            base_speed,
            target_speed: base_speed,
            current_speed: base_speed,
            time_since_speed_change: 0.0,
            next_change_interval: pacing::roll_change_interval(&config.speed, rng),
            turbo: TurboState::cooldown(&config.turbo, rng),
            rotation_phase: 0.0,
            rotation_dir: 1.0,
            wins: 0,
            laps: 0,
        }
    }

    /// Teleport back to the start line
    pub fn reset(&mut self) {
        self.position = self.start_position;
        self.direction = 1.0;
        self.current_speed = self.base_speed;
    }

    pub fn turbo_active(&self) -> bool {
        self.turbo.is_active()
    }

    /// Target speed including any running boost
    pub fn effective_target(&self, config: &RaceConfig) -> f32 {
        self.target_speed * self.turbo.speed_multiplier(&config.turbo)
    }
}

/// Runner simulation logic
pub struct Runner;

impl Runner {
    /// Advance pace, turbo and position by `delta` seconds of gameplay time.
    ///
    /// Returns the turbo edge, if any, so the race can report it.
    pub fn advance(
        state: &mut RunnerState,
        delta: f32,
        config: &RaceConfig,
        rng: &mut StdRng,
    ) -> Option<TurboTransition> {
        pacing::advance_target(state, delta, &config.speed, rng);

        let transition = state.turbo.advance(delta, &config.turbo, rng);

        let target = state.effective_target(config);
        state.current_speed =
            pacing::ease(state.current_speed, target, delta, config.speed.easing_rate);

        state.position += state.current_speed * state.direction * delta;

        transition
    }

    /// Per-frame body wobble, bouncing between `-limit` and `limit`
    pub fn wobble(state: &mut RunnerState, config: &WobbleConfig) {
        state.rotation_phase += config.step * state.rotation_dir;
        if state.rotation_phase > config.limit {
            state.rotation_phase = config.limit;
            state.rotation_dir = -1.0;
        } else if state.rotation_phase < -config.limit {
            state.rotation_phase = -config.limit;
            state.rotation_dir = 1.0;
        }
    }
}

/// Compact runner state for drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerSnapshot {
    pub id: u32,
    pub position: f32,
    pub lane_offset: f32,
    pub speed: f32,
    pub rotation_phase: f32,
    pub turbo_active: bool,
    pub wins: u32,
    pub laps: u32,
}

impl From<&RunnerState> for RunnerSnapshot {
    fn from(state: &RunnerState) -> Self {
        Self {
            id: state.id,
            position: state.position,
            lane_offset: state.lane_offset,
            speed: state.current_speed,
            rotation_phase: state.rotation_phase,
            turbo_active: state.turbo_active(),
            wins: state.wins,
            laps: state.laps,
        }
    }
}
