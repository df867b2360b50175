//! Simulation - Host-facing game server
//!
//! Owns the race, turns wall-clock time into frame deltas when asked to,
//! and fans race events out to registered hooks and the drawing surface.

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::game_server::config::{ConfigError, RaceConfig};
use crate::game_server::events::{RaceEvent, WinnerEvent};
use crate::game_server::race::{Race, RaceSnapshot};

/// Step times kept for averaging
const STEP_WINDOW: usize = 60;

/// Lifecycle of the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Idle,
    Running,
    Paused,
    Stopped,
}

/// Server statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStats {
    pub frames: u64,
    pub avg_step_time_ms: f32,
    pub runner_count: u32,
    pub rounds_completed: u32,
    pub game_state: GameState,
}

/// Whatever draws the race
pub trait PresentationSurface {
    /// Called once per step with the updated state
    fn draw(&mut self, frame: &RaceSnapshot);

    /// Boost glow on or off for one runner
    fn turbo_changed(&mut self, _runner_id: u32, _active: bool) {}
}

type WinnerHook = Box<dyn FnMut(&WinnerEvent)>;
type SlowmoHook = Box<dyn FnMut(bool)>;
type TurboHook = Box<dyn FnMut(u32, bool)>;
type RoundHook = Box<dyn FnMut(u32)>;

/// Main game server
pub struct GameServer {
    /// Current lifecycle state
    state: GameState,
    /// Active race (if any)
    race: Option<Race>,
    /// Last wall-clock tick, `None` until the first tick after start/resume
    last_tick: Option<Instant>,
    /// Recent step durations (ms)
    step_times: VecDeque<f32>,
    frames: u64,
    winner_hooks: Vec<WinnerHook>,
    slowmo_hooks: Vec<SlowmoHook>,
    turbo_hooks: Vec<TurboHook>,
    round_hooks: Vec<RoundHook>,
    surface: Option<Box<dyn PresentationSurface>>,
}

impl GameServer {
    /// Create a new game server
    pub fn new() -> Self {
        Self {
            state: GameState::Idle,
            race: None,
            last_tick: None,
            step_times: VecDeque::with_capacity(STEP_WINDOW),
            frames: 0,
            winner_hooks: Vec::new(),
            slowmo_hooks: Vec::new(),
            turbo_hooks: Vec::new(),
            round_hooks: Vec::new(),
            surface: None,
        }
    }

    /// Build a race from `config` and start running it
    pub fn init_race(&mut self, config: RaceConfig) -> Result<(), ConfigError> {
        let race = Race::new(config)?;
        log::info!("Race initialized with {} runners", race.runners.len());
        self.install(race);
        Ok(())
    }

    /// Start running an already built race
    pub fn install(&mut self, race: Race) {
        self.race = Some(race);
        self.state = GameState::Running;
        self.last_tick = None;
        self.frames = 0;
        self.step_times.clear();
    }

    /// Register a hook fired when a round is won
    pub fn on_winner(&mut self, hook: impl FnMut(&WinnerEvent) + 'static) {
        self.winner_hooks.push(Box::new(hook));
    }

    /// Register a hook fired when slow motion starts or ends
    pub fn on_slowmo_change(&mut self, hook: impl FnMut(bool) + 'static) {
        self.slowmo_hooks.push(Box::new(hook));
    }

    /// Register a hook fired when a runner's boost starts or ends
    pub fn on_turbo_change(&mut self, hook: impl FnMut(u32, bool) + 'static) {
        self.turbo_hooks.push(Box::new(hook));
    }

    /// Register a hook fired when runners leave the start line again
    pub fn on_round_resumed(&mut self, hook: impl FnMut(u32) + 'static) {
        self.round_hooks.push(Box::new(hook));
    }

    /// Attach the surface that receives one draw call per step
    pub fn attach_surface(&mut self, surface: impl PresentationSurface + 'static) {
        self.surface = Some(Box::new(surface));
    }

    /// Advance the race by `delta_raw` real seconds.
    ///
    /// Only steps while running; otherwise returns the current snapshot
    /// untouched.
    pub fn step(&mut self, delta_raw: f32) -> Option<RaceSnapshot> {
        if self.state != GameState::Running {
            return self.get_snapshot();
        }
        let race = self.race.as_mut()?;

        let step_start = Instant::now();

        race.update(delta_raw);
        let events = race.drain_events();
        let snapshot = race.get_snapshot();
        self.dispatch(events);
        if let Some(surface) = self.surface.as_mut() {
            surface.draw(&snapshot);
        }
        self.frames += 1;

        let step_time = step_start.elapsed().as_secs_f32() * 1000.0;
        if self.step_times.len() == STEP_WINDOW {
            self.step_times.pop_front();
        }
        self.step_times.push_back(step_time);

        Some(snapshot)
    }

    /// Step using the wall-clock time since the previous tick
    pub fn tick(&mut self) -> Option<RaceSnapshot> {
        let now = Instant::now();
        let delta = self
            .last_tick
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        if self.state == GameState::Running {
            self.last_tick = Some(now);
        }
        self.step(delta)
    }

    fn dispatch(&mut self, events: Vec<RaceEvent>) {
        for event in events {
            match event {
                RaceEvent::Winner(winner) => {
                    for hook in &mut self.winner_hooks {
                        hook(&winner);
                    }
                }
                RaceEvent::SlowmoChanged { active } => {
                    for hook in &mut self.slowmo_hooks {
                        hook(active);
                    }
                }
                RaceEvent::TurboChanged { runner_id, active } => {
                    if let Some(surface) = self.surface.as_mut() {
                        surface.turbo_changed(runner_id, active);
                    }
                    for hook in &mut self.turbo_hooks {
                        hook(runner_id, active);
                    }
                }
                RaceEvent::RoundResumed { round } => {
                    for hook in &mut self.round_hooks {
                        hook(round);
                    }
                }
            }
        }
    }

    /// Get current race snapshot
    pub fn get_snapshot(&self) -> Option<RaceSnapshot> {
        self.race.as_ref().map(|r| r.get_snapshot())
    }

    /// Get the `(name, wins)` scoreboard
    pub fn scoreboard(&self) -> Vec<(String, u32)> {
        self.race.as_ref().map(|r| r.scoreboard()).unwrap_or_default()
    }

    /// Read-only access to the race
    pub fn race(&self) -> Option<&Race> {
        self.race.as_ref()
    }

    /// Get server statistics
    pub fn get_stats(&self) -> ServerStats {
        let avg_step_time = if self.step_times.is_empty() {
            0.0
        } else {
            self.step_times.iter().sum::<f32>() / self.step_times.len() as f32
        };

        ServerStats {
            frames: self.frames,
            avg_step_time_ms: avg_step_time,
            runner_count: self.race.as_ref().map(|r| r.runners.len() as u32).unwrap_or(0),
            rounds_completed: self.race.as_ref().map(|r| r.round - 1).unwrap_or(0),
            game_state: self.state,
        }
    }

    /// Get current game state
    pub fn get_state(&self) -> GameState {
        self.state
    }

    /// Pause the simulation
    pub fn pause(&mut self) {
        if self.state == GameState::Running {
            self.state = GameState::Paused;
            log::info!("Race paused");
        }
    }

    /// Resume the simulation; the paused interval is never fed to the race
    pub fn resume(&mut self) {
        if self.state == GameState::Paused {
            self.state = GameState::Running;
            self.last_tick = None;
            log::info!("Race resumed");
        }
    }

    /// Tear everything down; the server must be re-initialized to race again
    pub fn stop(&mut self) {
        self.state = GameState::Stopped;
        self.race = None;
        self.last_tick = None;
        self.winner_hooks.clear();
        self.slowmo_hooks.clear();
        self.turbo_hooks.clear();
        self.round_hooks.clear();
        self.surface = None;
        log::info!("Race stopped");
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.state == GameState::Running
    }
}

impl Default for GameServer {
    fn default() -> Self {
        Self::new()
    }
}
