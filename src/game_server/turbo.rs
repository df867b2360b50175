//! Turbo - Per-runner boost state machine
//!
//! A runner is always either cooling down or boosted, never both. Once the
//! cooldown runs out, each frame rolls for activation at a per-second rate.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game_server::config::{uniform, TurboConfig};

/// Boost state for a single runner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TurboState {
    /// Waiting; `remaining` may go negative while rolling for activation
    Cooldown { remaining: f32 },
    /// Boosted for `remaining` more seconds
    Active { remaining: f32 },
}

/// Edge reported when the state machine flips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurboTransition {
    Activated,
    Expired,
}

impl TurboState {
    /// Fresh cooldown with a random length
    pub fn cooldown(config: &TurboConfig, rng: &mut StdRng) -> Self {
        TurboState::Cooldown {
            remaining: uniform(rng, config.cooldown_min, config.cooldown_max),
        }
    }

    /// Fresh boost with a random length
    pub fn active(config: &TurboConfig, rng: &mut StdRng) -> Self {
        TurboState::Active {
            remaining: uniform(rng, config.min_duration, config.max_duration),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, TurboState::Active { .. })
    }

    /// Seconds of boost left, zero while cooling down
    pub fn time_left(&self) -> f32 {
        match *self {
            TurboState::Active { remaining } => remaining,
            TurboState::Cooldown { .. } => 0.0,
        }
    }

    /// Seconds of cooldown left, zero while boosted
    pub fn cooldown_left(&self) -> f32 {
        match *self {
            TurboState::Cooldown { remaining } => remaining,
            TurboState::Active { .. } => 0.0,
        }
    }

    /// Multiplier applied to the target speed
    pub fn speed_multiplier(&self, config: &TurboConfig) -> f32 {
        if self.is_active() {
            config.multiplier
        } else {
            1.0
        }
    }

    /// Probability of activating during a frame of length `delta`
    pub fn activation_chance(config: &TurboConfig, delta: f32) -> f64 {
        (f64::from(config.spawn_chance_per_sec) * f64::from(delta)).clamp(0.0, 1.0)
    }

    /// Advance by `delta` seconds of gameplay time
    pub fn advance(
        &mut self,
        delta: f32,
        config: &TurboConfig,
        rng: &mut StdRng,
    ) -> Option<TurboTransition> {
        match self {
            TurboState::Active { remaining } => {
                *remaining -= delta;
                if *remaining <= 0.0 {
                    *self = Self::cooldown(config, rng);
                    return Some(TurboTransition::Expired);
                }
                None
            }
            TurboState::Cooldown { remaining } => {
                *remaining -= delta;
                if *remaining <= 0.0 && rng.gen_bool(Self::activation_chance(config, delta)) {
                    *self = Self::active(config, rng);
                    return Some(TurboTransition::Activated);
                }
                None
            }
        }
    }

    /// End any running boost immediately
    pub fn cancel(&mut self, config: &TurboConfig, rng: &mut StdRng) -> Option<TurboTransition> {
        if !self.is_active() {
            return None;
        }
        *self = Self::cooldown(config, rng);
        Some(TurboTransition::Expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn always_fires() -> TurboConfig {
        TurboConfig {
            spawn_chance_per_sec: 1000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_activation_chance_scales_and_clamps() {
        let config = TurboConfig::default();
        assert!((TurboState::activation_chance(&config, 1.0) - 0.35).abs() < 1e-6);
        assert!((TurboState::activation_chance(&config, 0.1) - 0.035).abs() < 1e-6);
        assert_eq!(TurboState::activation_chance(&config, 10.0), 1.0);
        assert_eq!(TurboState::activation_chance(&config, 0.0), 0.0);
    }

    #[test]
    fn test_no_activation_before_cooldown_expires() {
        let config = always_fires();
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = TurboState::Cooldown { remaining: 1.0 };
        assert_eq!(state.advance(0.5, &config, &mut rng), None);
        assert_eq!(state, TurboState::Cooldown { remaining: 0.5 });
    }

    #[test]
    fn test_activates_once_cooldown_expires() {
        let config = always_fires();
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = TurboState::Cooldown { remaining: 0.0 };
        assert_eq!(
            state.advance(0.1, &config, &mut rng),
            Some(TurboTransition::Activated)
        );
        let left = state.time_left();
        assert!(left >= config.min_duration && left <= config.max_duration);
    }

    #[test]
    fn test_zero_chance_never_activates() {
        let config = TurboConfig {
            spawn_chance_per_sec: 0.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = TurboState::Cooldown { remaining: 0.0 };
        for _ in 0..1000 {
            assert_eq!(state.advance(0.016, &config, &mut rng), None);
        }
        assert!(!state.is_active());
    }

    #[test]
    fn test_expiry_rolls_fresh_cooldown() {
        let config = TurboConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut state = TurboState::Active { remaining: 0.05 };
        assert_eq!(
            state.advance(0.1, &config, &mut rng),
            Some(TurboTransition::Expired)
        );
        let cooldown = state.cooldown_left();
        assert!(cooldown >= config.cooldown_min && cooldown <= config.cooldown_max);
    }

    #[test]
    fn test_cancel_only_reports_when_active() {
        let config = TurboConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut idle = TurboState::Cooldown { remaining: 1.0 };
        assert_eq!(idle.cancel(&config, &mut rng), None);
        assert_eq!(idle, TurboState::Cooldown { remaining: 1.0 });

        let mut boosted = TurboState::Active { remaining: 1.0 };
        assert_eq!(
            boosted.cancel(&config, &mut rng),
            Some(TurboTransition::Expired)
        );
        assert!(boosted.cooldown_left() > 0.0);
    }

    #[test]
    fn test_multiplier_follows_state() {
        let config = TurboConfig::default();
        assert_eq!(
            TurboState::Active { remaining: 1.0 }.speed_multiplier(&config),
            2.5
        );
        assert_eq!(
            TurboState::Cooldown { remaining: 1.0 }.speed_multiplier(&config),
            1.0
        );
    }

    proptest! {
        #[test]
        fn active_state_always_has_time_left(
            seed in any::<u64>(),
            deltas in proptest::collection::vec(0.0f32..0.5, 1..200),
        ) {
            let config = TurboConfig { spawn_chance_per_sec: 5.0, ..Default::default() };
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = TurboState::cooldown(&config, &mut rng);
            for delta in deltas {
                let transition = state.advance(delta, &config, &mut rng);
                if state.is_active() {
                    prop_assert!(state.time_left() > 0.0);
                }
                if transition == Some(TurboTransition::Expired) {
                    prop_assert!(state.cooldown_left() > 0.0);
                }
            }
        }
    }
}
