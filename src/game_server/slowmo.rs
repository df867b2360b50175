//! Slowmo - Finish-line time dilation
//!
//! Dilated time drives gameplay while the effect's own timer runs on real
//! time, so it always lasts `max_duration` real seconds.

use serde::{Deserialize, Serialize};

use crate::game_server::config::SlowmoConfig;

/// Global slow-motion state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlowMotion {
    pub active: bool,
    /// Real seconds until the effect ends
    pub time_left: f32,
}

impl SlowMotion {
    /// Whether any position has reached `trigger_position`.
    ///
    /// Scans every position rather than stopping at the first hit.
    pub fn should_trigger<I>(&self, positions: I, trigger_position: f32) -> bool
    where
        I: IntoIterator<Item = f32>,
    {
        if self.active {
            return false;
        }
        positions
            .into_iter()
            .fold(false, |hit, position| hit | (position >= trigger_position))
    }

    /// Start the effect; returns `true` if it was off
    pub fn activate(&mut self, config: &SlowmoConfig) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.time_left = config.max_duration;
        true
    }

    /// Gameplay time for a frame of `delta_raw` real seconds
    pub fn dilate(&self, delta_raw: f32, config: &SlowmoConfig) -> f32 {
        if self.active {
            delta_raw * config.factor
        } else {
            delta_raw
        }
    }

    /// Run the timer down on real time; returns `true` when the effect ends
    pub fn decay(&mut self, delta_raw: f32) -> bool {
        if !self.active {
            return false;
        }
        self.time_left -= delta_raw;
        if self.time_left <= 0.0 {
            self.force_off();
            return true;
        }
        false
    }

    /// Stop immediately regardless of remaining time; returns `true` if it was on
    pub fn force_off(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        self.time_left = 0.0;
        was_active
    }
}
