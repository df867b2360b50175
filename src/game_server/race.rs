//! Race - Frame step, winner detection and the reset protocol
//!
//! The race runs forever: the first runner to reach the finish line wins the
//! round, everyone is teleported back to the start, and after a short real-time
//! pause racing resumes.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::game_server::config::{ConfigError, RaceConfig, WinnerFramePolicy};
use crate::game_server::events::{RaceEvent, WinnerEvent};
use crate::game_server::runner::{Runner, RunnerSnapshot, RunnerState};
use crate::game_server::slowmo::SlowMotion;
use crate::game_server::turbo::TurboTransition;

/// Race phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    Racing,
    Resetting,
}

/// Complete race state
#[derive(Debug, Clone)]
pub struct Race {
    /// Race configuration
    pub config: RaceConfig,
    /// Current race phase
    pub phase: RacePhase,
    /// All runners, in the fixed order they are updated
    pub runners: Vec<RunnerState>,
    /// Finish-line slow motion
    pub slowmo: SlowMotion,
    /// Real seconds left before racing resumes
    pub reset_countdown: f32,
    /// Current round (first round is 1)
    pub round: u32,
    /// Frames stepped so far
    pub frame: u64,
    /// Gameplay seconds elapsed, dilation applied
    pub elapsed_time: f32,
    rng: StdRng,
    events: Vec<RaceEvent>,
}

impl Race {
    /// Create a race with runners lined up, drawing randomness from the
    /// configured seed
    pub fn new(config: RaceConfig) -> Result<Self, ConfigError> {
        let rng = config.seeded_rng();
        Self::with_rng(config, rng)
    }

    /// Create a race driven by the given generator
    pub fn with_rng(config: RaceConfig, mut rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;

        let runners = (0..config.runner_count as usize)
            .map(|index| RunnerState::new(index, &config, &mut rng))
            .collect();

        Ok(Self {
            config,
            phase: RacePhase::Racing,
            runners,
            slowmo: SlowMotion::default(),
            reset_countdown: 0.0,
            round: 1,
            frame: 0,
            elapsed_time: 0.0,
            rng,
            events: Vec::new(),
        })
    }

    /// Advance one frame by `delta_raw` real seconds.
    ///
    /// Events raised during the frame are queued until [`Race::drain_events`]
    /// is called. A host driving the race directly must drain once per frame
    /// or the queue keeps growing; `GameServer::step` does this itself.
    pub fn update(&mut self, delta_raw: f32) {
        let delta_raw = if delta_raw.is_finite() && delta_raw >= 0.0 {
            delta_raw
        } else {
            log::warn!("Ignoring invalid frame delta {}", delta_raw);
            0.0
        };
        self.frame += 1;

        match self.phase {
            RacePhase::Resetting => {
                self.stop_slowmo();
                self.reset_countdown -= delta_raw;
                if self.reset_countdown <= 0.0 {
                    self.reset_countdown = 0.0;
                    self.phase = RacePhase::Racing;
                    log::info!("Round {} started", self.round);
                    self.events.push(RaceEvent::RoundResumed { round: self.round });
                }
                return;
            }

            RacePhase::Racing => {}
        }

        let trigger = self.config.slowmo_trigger_position();
        if self
            .slowmo
            .should_trigger(self.runners.iter().map(|r| r.position), trigger)
            && self.slowmo.activate(&self.config.slowmo)
        {
            log::debug!("Slow motion on");
            self.events.push(RaceEvent::SlowmoChanged { active: true });
        }

        let delta = self.slowmo.dilate(delta_raw, &self.config.slowmo);
        self.elapsed_time += delta;

        let finish = self.config.finish_position;
        let mut winner = None;

        // Runners are updated strictly in lane order; on a tie the earlier
        // lane wins.
        for (index, runner) in self.runners.iter_mut().enumerate() {
            if let Some(transition) = Runner::advance(runner, delta, &self.config, &mut self.rng) {
                self.events.push(turbo_event(runner, transition));
            }

            if winner.is_none() && runner.position >= finish {
                runner.laps += 1;
                runner.wins += 1;
                winner = Some(index);

                if self.config.winner_frame_policy == WinnerFramePolicy::TruncateRemaining {
                    break;
                }
                continue;
            }

            Runner::wobble(runner, &self.config.wobble);
        }

        match winner {
            Some(index) => self.declare_winner(index),
            None => {
                if self.slowmo.decay(delta_raw) {
                    log::debug!("Slow motion off");
                    self.events.push(RaceEvent::SlowmoChanged { active: false });
                }
            }
        }
    }

    fn declare_winner(&mut self, index: usize) {
        let event = WinnerEvent::new(self.round, &self.runners[index]);
        log::info!(
            "Round {} won by {} ({} wins)",
            event.round,
            event.name,
            event.wins
        );
        self.events.push(RaceEvent::Winner(event));

        self.stop_slowmo();
        self.begin_reset();
    }

    /// Teleport everyone to the start line and hold for `ready_delay`
    fn begin_reset(&mut self) {
        self.phase = RacePhase::Resetting;
        self.reset_countdown = self.config.ready_delay;
        self.round += 1;

        for runner in &mut self.runners {
            runner.reset();
            if let Some(transition) = runner.turbo.cancel(&self.config.turbo, &mut self.rng) {
                self.events.push(turbo_event(runner, transition));
            }
        }
    }

    fn stop_slowmo(&mut self) {
        if self.slowmo.force_off() {
            log::debug!("Slow motion off");
            self.events.push(RaceEvent::SlowmoChanged { active: false });
        }
    }

    /// Take every event queued since the last drain, in emission order,
    /// leaving the queue empty
    pub fn drain_events(&mut self) -> Vec<RaceEvent> {
        std::mem::take(&mut self.events)
    }

    /// Get compact snapshot for drawing
    pub fn get_snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            phase: self.phase,
            round: self.round,
            frame: self.frame,
            elapsed_time: self.elapsed_time,
            reset_countdown: self.reset_countdown,
            slowmo_active: self.slowmo.active,
            slowmo_time_left: self.slowmo.time_left,
            runners: self.runners.iter().map(RunnerSnapshot::from).collect(),
        }
    }

    /// `(name, wins)` per runner, in lane order
    pub fn scoreboard(&self) -> Vec<(String, u32)> {
        self.runners
            .iter()
            .map(|runner| (runner.name.clone(), runner.wins))
            .collect()
    }

    /// Get current leader
    pub fn get_leader(&self) -> Option<&RunnerState> {
        self.runners
            .iter()
            .max_by(|a, b| a.position.total_cmp(&b.position))
    }

    /// Get runner by ID
    pub fn get_runner(&self, id: u32) -> Option<&RunnerState> {
        self.runners.iter().find(|r| r.id == id)
    }
}

fn turbo_event(runner: &RunnerState, transition: TurboTransition) -> RaceEvent {
    let active = transition == TurboTransition::Activated;
    log::debug!(
        "{} turbo {}",
        runner.name,
        if active { "on" } else { "off" }
    );
    RaceEvent::TurboChanged {
        runner_id: runner.id,
        active,
    }
}

/// Compact race snapshot for the drawing layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub phase: RacePhase,
    pub round: u32,
    pub frame: u64,
    pub elapsed_time: f32,
    pub reset_countdown: f32,
    pub slowmo_active: bool,
    pub slowmo_time_left: f32,
    pub runners: Vec<RunnerSnapshot>,
}

impl RaceSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_server::turbo::TurboState;

    /// Race whose runners hold a constant speed and never boost
    fn steady_race(config: RaceConfig, speeds: &[f32]) -> Race {
        let config = RaceConfig {
            runner_count: speeds.len() as u32,
            rng_seed: Some(17),
            ..config
        };
        let mut race = Race::new(config).unwrap();
        for (runner, &speed) in race.runners.iter_mut().zip(speeds) {
            runner.target_speed = speed;
            runner.current_speed = speed;
            runner.next_change_interval = 1000.0;
            runner.turbo = TurboState::Cooldown { remaining: 1000.0 };
        }
        race
    }

    fn winners(events: &[RaceEvent]) -> Vec<&WinnerEvent> {
        events
            .iter()
            .filter_map(|event| match event {
                RaceEvent::Winner(winner) => Some(winner),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_crossing_declares_winner() {
        let config = RaceConfig {
            slowmo: crate::game_server::config::SlowmoConfig {
                trigger_distance_before_finish: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut race = steady_race(config, &[5.0]);
        race.runners[0].position = 4.6;

        race.update(0.1);

        let events = race.drain_events();
        let won = winners(&events);
        assert_eq!(won.len(), 1);
        assert_eq!(won[0].runner_id, 0);
        assert_eq!(won[0].wins, 1);
        assert!(won[0].snapshot.position >= 5.0);
        assert_eq!(race.runners[0].wins, 1);
        assert_eq!(race.runners[0].laps, 1);
        assert_eq!(race.phase, RacePhase::Resetting);
        assert_eq!(race.reset_countdown, race.config.ready_delay);
    }

    #[test]
    fn test_tie_goes_to_first_in_order() {
        let mut race = steady_race(RaceConfig::default(), &[1.0, 1.0]);
        race.runners[0].position = 5.2;
        race.runners[1].position = 5.2;

        race.update(0.016);

        let events = race.drain_events();
        let won = winners(&events);
        assert_eq!(won.len(), 1);
        assert_eq!(won[0].runner_id, 0);
        assert_eq!(race.runners[1].wins, 0);
        assert_eq!(race.runners[1].laps, 0);
    }

    #[test]
    fn test_truncation_skips_later_runners() {
        let mut race = steady_race(RaceConfig::default(), &[1.0, 1.0]);
        race.runners[0].position = 4.99;
        race.runners[1].rotation_phase = 0.2;

        race.update(0.5);

        // runner 0 moved through pace and turbo before winning
        assert!(race.runners[0].time_since_speed_change > 0.0);
        assert!(race.runners[0].turbo.cooldown_left() < 1000.0);

        // runner 1 was never advanced: pace, turbo and wobble are untouched
        assert_eq!(race.runners[1].time_since_speed_change, 0.0);
        assert_eq!(race.runners[1].turbo, TurboState::Cooldown { remaining: 1000.0 });
        assert_eq!(race.runners[1].rotation_phase, 0.2);
    }

    #[test]
    fn test_events_queue_until_drained() {
        let mut race = steady_race(RaceConfig::default(), &[0.0]);
        race.runners[0].position = 4.5;

        // slow motion on, then off after 2s of real time, without draining
        for _ in 0..5 {
            race.update(0.5);
        }
        assert_eq!(
            race.drain_events(),
            vec![
                RaceEvent::SlowmoChanged { active: true },
                RaceEvent::SlowmoChanged { active: false },
                RaceEvent::SlowmoChanged { active: true },
            ]
        );
        assert!(race.drain_events().is_empty());
    }

    #[test]
    fn test_update_all_policy_still_moves_later_runners() {
        let config = RaceConfig {
            winner_frame_policy: WinnerFramePolicy::UpdateAll,
            ..Default::default()
        };
        let mut race = steady_race(config, &[1.0, 1.0]);
        race.runners[0].position = 5.2;
        race.runners[1].position = 5.2;
        race.runners[1].rotation_phase = 0.2;

        race.update(0.016);

        let events = race.drain_events();
        assert_eq!(winners(&events).len(), 1);
        assert_eq!(race.runners[1].wins, 0);
        assert!(race.runners[1].rotation_phase > 0.2);
        // everyone is back on the line regardless
        assert_eq!(race.runners[1].position, race.config.start_position);
    }

    #[test]
    fn test_reset_teleports_and_clears_turbo() {
        let mut race = steady_race(RaceConfig::default(), &[1.0, 1.0, 1.0]);
        race.runners[0].position = 5.5;
        race.runners[2].turbo = TurboState::Active { remaining: 5.0 };
        race.runners[2].position = 2.0;

        race.update(0.016);
        let events = race.drain_events();
        assert!(events.contains(&RaceEvent::TurboChanged {
            runner_id: 2,
            active: false
        }));

        for runner in &race.runners {
            assert_eq!(runner.position, runner.start_position);
            assert_eq!(runner.direction, 1.0);
            assert!(!runner.turbo_active());
            assert!(runner.turbo.cooldown_left() > 0.0);
        }
    }

    #[test]
    fn test_resetting_holds_until_countdown_ends() {
        let mut race = steady_race(RaceConfig::default(), &[1.0]);
        race.runners[0].position = 5.5;
        race.update(0.016);
        race.drain_events();
        assert_eq!(race.round, 2);

        race.update(0.25);
        assert_eq!(race.phase, RacePhase::Resetting);
        assert_eq!(race.runners[0].position, race.config.start_position);

        race.update(0.25);
        race.update(0.25);
        assert_eq!(race.phase, RacePhase::Racing);
        assert_eq!(race.reset_countdown, 0.0);
        assert_eq!(
            race.drain_events(),
            vec![RaceEvent::RoundResumed { round: 2 }]
        );

        race.update(0.1);
        assert!(race.runners[0].position > race.config.start_position);
    }

    #[test]
    fn test_slowmo_triggers_and_dilates_same_frame() {
        let mut race = steady_race(RaceConfig::default(), &[1.0, 1.0]);
        race.runners[1].position = 4.2;

        race.update(0.04);

        assert!(race.slowmo.active);
        assert!((race.runners[1].position - 4.21).abs() < 1e-5);
        assert!((race.runners[0].position - (-3.5 + 0.01)).abs() < 1e-5);
        assert!((race.slowmo.time_left - (2.0 - 0.04)).abs() < 1e-5);
        assert!((race.elapsed_time - 0.01).abs() < 1e-7);
        assert_eq!(
            race.drain_events(),
            vec![RaceEvent::SlowmoChanged { active: true }]
        );
    }

    #[test]
    fn test_slowmo_expires_on_real_time() {
        let mut race = steady_race(RaceConfig::default(), &[0.0]);
        race.runners[0].position = 4.5;

        race.update(0.5);
        assert!(race.slowmo.active);
        for _ in 0..3 {
            race.update(0.5);
        }
        assert!(!race.slowmo.active);

        let events = race.drain_events();
        assert_eq!(
            events,
            vec![
                RaceEvent::SlowmoChanged { active: true },
                RaceEvent::SlowmoChanged { active: false },
            ]
        );
    }

    #[test]
    fn test_winner_forces_slowmo_off() {
        let mut race = steady_race(RaceConfig::default(), &[2.0]);
        race.runners[0].position = 4.9;

        race.update(0.4);

        assert!(!race.slowmo.active);
        let events = race.drain_events();
        assert!(matches!(events[0], RaceEvent::SlowmoChanged { active: true }));
        assert!(matches!(events[1], RaceEvent::Winner(_)));
        assert!(matches!(events[2], RaceEvent::SlowmoChanged { active: false }));
    }

    #[test]
    fn test_invalid_delta_is_ignored() {
        let mut race = steady_race(RaceConfig::default(), &[1.0]);
        race.update(f32::NAN);
        race.update(-1.0);
        assert_eq!(race.runners[0].position, race.config.start_position);
        assert_eq!(race.frame, 2);
    }

    #[test]
    fn test_scoreboard_and_leader() {
        let mut race = steady_race(RaceConfig::default(), &[1.0, 1.0, 1.0]);
        race.runners[1].position = 3.0;
        race.runners[2].wins = 4;

        assert_eq!(race.get_leader().map(|r| r.id), Some(1));
        assert_eq!(race.get_runner(2).map(|r| r.wins), Some(4));
        assert!(race.get_runner(9).is_none());

        let board = race.scoreboard();
        assert_eq!(board[2], ("Siheon".to_string(), 4));
    }

    #[test]
    fn test_snapshot_serializes() {
        let race = steady_race(RaceConfig::default(), &[1.0, 1.0]);
        let json = race.get_snapshot().to_json().unwrap();
        assert!(json.contains("\"phase\":\"Racing\""));
        assert!(json.contains("\"turbo_active\":false"));
    }

    #[test]
    fn test_same_seed_same_race() {
        let config = RaceConfig {
            rng_seed: Some(2024),
            ..Default::default()
        };
        let mut a = Race::new(config.clone()).unwrap();
        let mut b = Race::new(config).unwrap();
        for _ in 0..2000 {
            a.update(1.0 / 60.0);
            b.update(1.0 / 60.0);
        }
        assert_eq!(a.get_snapshot(), b.get_snapshot());
        assert_eq!(a.drain_events(), b.drain_events());
    }
}
