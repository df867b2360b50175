//! Config - Race tuning constants
//!
//! Every knob is fixed at construction. Defaults reproduce the original
//! eight-lane race.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a race from configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name}: minimum {min} exceeds maximum {max}")]
    InvalidRange {
        name: &'static str,
        min: f32,
        max: f32,
    },
    #[error("{name} must be positive (got {value})")]
    NonPositive { name: &'static str, value: f32 },
    #[error("{name} = {value} is outside {expected}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        expected: &'static str,
    },
    #[error("race needs at least one runner")]
    NoRunners,
    #[error("failed to parse race config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Speed model tuning (m/s and seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// Slowest possible base speed
    pub base_min: f32,
    /// Fastest possible base speed
    pub base_max: f32,
    /// Lower bound of the re-rolled target, as a multiple of base speed
    pub target_min_factor: f32,
    /// Upper bound of the re-rolled target, as a multiple of base speed
    pub target_max_factor: f32,
    /// Shortest gap between target re-rolls
    pub change_interval_min: f32,
    /// Longest gap between target re-rolls
    pub change_interval_max: f32,
    /// Easing rate; the per-frame blend is `min(1, dt * easing_rate)`
    pub easing_rate: f32,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            base_min: 0.8,
            base_max: 1.6,
            target_min_factor: 0.5,
            target_max_factor: 1.8,
            change_interval_min: 0.6,
            change_interval_max: 1.8,
            easing_rate: 3.0,
        }
    }
}

/// Turbo boost tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurboConfig {
    /// Target speed multiplier while boosted
    pub multiplier: f32,
    pub min_duration: f32,
    pub max_duration: f32,
    pub cooldown_min: f32,
    pub cooldown_max: f32,
    /// Activation rate once the cooldown has run out
    pub spawn_chance_per_sec: f32,
}

impl Default for TurboConfig {
    fn default() -> Self {
        Self {
            multiplier: 2.5,
            min_duration: 0.6,
            max_duration: 1.2,
            cooldown_min: 2.0,
            cooldown_max: 4.0,
            spawn_chance_per_sec: 0.35,
        }
    }
}

/// Finish-line slow motion tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlowmoConfig {
    /// Gameplay time scale while active (0.25 = quarter speed)
    pub factor: f32,
    /// How far before the finish line the effect kicks in
    pub trigger_distance_before_finish: f32,
    /// Real seconds the effect lasts
    pub max_duration: f32,
}

impl Default for SlowmoConfig {
    fn default() -> Self {
        Self {
            factor: 0.25,
            trigger_distance_before_finish: 1.0,
            max_duration: 2.0,
        }
    }
}

/// Body wobble animation (radians per frame, bounce limit)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WobbleConfig {
    pub step: f32,
    pub limit: f32,
}

impl Default for WobbleConfig {
    fn default() -> Self {
        Self {
            step: 0.01,
            limit: 0.5,
        }
    }
}

/// What happens to runners later in iteration order on the frame a winner
/// is found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinnerFramePolicy {
    /// Remaining runners skip the winning frame entirely
    #[default]
    TruncateRemaining,
    /// Remaining runners still move that frame but cannot win
    UpdateAll,
}

/// Race configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Number of runners
    pub runner_count: u32,
    /// Display names, assigned in lane order
    pub runner_names: Vec<String>,
    /// Where every runner lines up (meters along the race axis)
    pub start_position: f32,
    /// Finish line; reaching it ends the round
    pub finish_position: f32,
    /// Cross-axis spacing between lanes
    pub lane_spacing: f32,
    /// Real seconds everyone waits at the start line after a win
    pub ready_delay: f32,
    pub speed: SpeedConfig,
    pub turbo: TurboConfig,
    pub slowmo: SlowmoConfig,
    pub wobble: WobbleConfig,
    pub winner_frame_policy: WinnerFramePolicy,
    /// Seed for reproducible races; entropy when absent
    pub rng_seed: Option<u64>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            runner_count: 8,
            runner_names: [
                "Junyoung", "Junmo", "Siheon", "Seungmin", "Chansol", "Hyeonjun", "Chanwoo",
                "Haring",
            ]
            .iter()
            .map(|name| name.to_string())
            .collect(),
            start_position: -3.5,
            finish_position: 5.0,
            lane_spacing: 2.2,
            ready_delay: 0.6,
            speed: SpeedConfig::default(),
            turbo: TurboConfig::default(),
            slowmo: SlowmoConfig::default(),
            wobble: WobbleConfig::default(),
            winner_frame_policy: WinnerFramePolicy::default(),
            rng_seed: None,
        }
    }
}

impl RaceConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Position at which slow motion kicks in
    pub fn slowmo_trigger_position(&self) -> f32 {
        self.finish_position - self.slowmo.trigger_distance_before_finish
    }

    /// Display name for the runner in lane `index`
    pub fn runner_name(&self, index: usize) -> String {
        self.runner_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("Runner {}", index + 1))
    }

    /// Cross-axis lane offset, lanes centred on zero
    pub fn lane_offset(&self, index: usize) -> f32 {
        let centre = (self.runner_count as f32 - 1.0) / 2.0;
        (index as f32 - centre) * self.lane_spacing
    }

    /// Build the generator every random draw in the race goes through
    pub fn seeded_rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::thread_rng().gen()),
        }
    }

    /// Reject configurations the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runner_count == 0 {
            return Err(ConfigError::NoRunners);
        }

        let speed = &self.speed;
        positive("speed.base_min", speed.base_min)?;
        range("speed.base", speed.base_min, speed.base_max)?;
        positive("speed.target_min_factor", speed.target_min_factor)?;
        range(
            "speed.target_factor",
            speed.target_min_factor,
            speed.target_max_factor,
        )?;
        positive("speed.change_interval_min", speed.change_interval_min)?;
        range(
            "speed.change_interval",
            speed.change_interval_min,
            speed.change_interval_max,
        )?;
        positive("speed.easing_rate", speed.easing_rate)?;

        let turbo = &self.turbo;
        positive("turbo.multiplier", turbo.multiplier)?;
        positive("turbo.min_duration", turbo.min_duration)?;
        range("turbo.duration", turbo.min_duration, turbo.max_duration)?;
        positive("turbo.cooldown_min", turbo.cooldown_min)?;
        range("turbo.cooldown", turbo.cooldown_min, turbo.cooldown_max)?;
        non_negative("turbo.spawn_chance_per_sec", turbo.spawn_chance_per_sec)?;

        let slowmo = &self.slowmo;
        if !(slowmo.factor > 0.0 && slowmo.factor <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "slowmo.factor",
                value: slowmo.factor,
                expected: "(0, 1]",
            });
        }
        non_negative(
            "slowmo.trigger_distance_before_finish",
            slowmo.trigger_distance_before_finish,
        )?;
        positive("slowmo.max_duration", slowmo.max_duration)?;

        non_negative("wobble.step", self.wobble.step)?;
        non_negative("wobble.limit", self.wobble.limit)?;

        finite("lane_spacing", self.lane_spacing)?;
        range("track", self.start_position, self.finish_position)?;
        if self.start_position == self.finish_position {
            return Err(ConfigError::InvalidRange {
                name: "track",
                min: self.start_position,
                max: self.finish_position,
            });
        }
        non_negative("ready_delay", self.ready_delay)?;

        Ok(())
    }
}

/// Uniform draw from `[min, max)`, collapsing to `min` for empty ranges
pub(crate) fn uniform(rng: &mut StdRng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

fn finite(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            expected: "finite numbers",
        })
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            expected: "[0, max]",
        })
    }
}

fn range(name: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    finite(name, min)?;
    finite(name, max)?;
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange { name, min, max })
    }
}
