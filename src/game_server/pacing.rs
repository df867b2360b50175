//! Pacing - Speed model
//!
//! Each runner keeps a fixed base speed and periodically re-rolls a target
//! speed around it. The actual speed eases toward the (possibly boosted)
//! target every frame.

use rand::rngs::StdRng;

use crate::game_server::config::{uniform, SpeedConfig};
use crate::game_server::runner::RunnerState;

/// Draw a runner's lifetime base speed
pub fn roll_base_speed(config: &SpeedConfig, rng: &mut StdRng) -> f32 {
    uniform(rng, config.base_min, config.base_max)
}

/// Draw the countdown until the next target re-roll
pub fn roll_change_interval(config: &SpeedConfig, rng: &mut StdRng) -> f32 {
    uniform(rng, config.change_interval_min, config.change_interval_max)
}

/// Draw a new target speed for the given base speed
pub fn roll_target_speed(base_speed: f32, config: &SpeedConfig, rng: &mut StdRng) -> f32 {
    base_speed * uniform(rng, config.target_min_factor, config.target_max_factor)
}

/// Advance the re-roll countdown, drawing a new target when it fires.
///
/// Returns `true` when the target changed this frame.
pub fn advance_target(
    state: &mut RunnerState,
    delta: f32,
    config: &SpeedConfig,
    rng: &mut StdRng,
) -> bool {
    state.time_since_speed_change += delta;
    if state.time_since_speed_change < state.next_change_interval {
        return false;
    }

    state.target_speed = roll_target_speed(state.base_speed, config, rng);
    state.time_since_speed_change = 0.0;
    state.next_change_interval = roll_change_interval(config, rng);
    true
}

/// First-order smoothing toward `target`.
///
/// The blend factor is clamped to 1 so a long frame lands on the target
/// instead of overshooting it.
pub fn ease(current: f32, target: f32, delta: f32, rate: f32) -> f32 {
    let blend = (delta * rate).max(0.0);
    if blend >= 1.0 {
        return target;
    }
    current + (target - current) * blend
}
