use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::GravityConfig;
use crate::field::{NoteField, Playfield};
use crate::spawn::SpawnScheduler;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityState {
    pub active: bool,
    pub next_switch_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GravityCheck {
    /// Disabled, or the next switch is not due yet.
    Idle,
    Toggled { active: bool, next_switch_at: f64 },
    /// A switch was due but unsafe.
    Deferred { retry_at: f64 },
}

/// Periodically reverses travel direction and moves the judgment lines to the other side.
#[derive(Debug, Clone)]
pub struct GravityController {
    enabled: bool,
    state: GravityState,
    config: GravityConfig,
    center_y: f32,
    rng: ChaCha8Rng,
}

impl GravityController {
    /// Schedules the first switch one normal-mode duration after `start`.
    pub fn new(config: GravityConfig, enabled: bool, field_height: f32, start: f64) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut controller = Self {
            enabled,
            state: GravityState {
                active: false,
                next_switch_at: f64::INFINITY,
            },
            config,
            center_y: field_height / 2.0,
            rng,
        };
        if enabled {
            controller.state.next_switch_at = start + controller.draw(config.normal_duration);
        }
        controller
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> GravityState {
        self.state
    }

    fn draw(&mut self, (min, max): (f64, f64)) -> f64 {
        if max > min {
            self.rng.gen_range(min..=max)
        } else {
            min
        }
    }

    /// Safe when no note spawns within the guard interval and the field is
    /// empty, or holds at most two notes all inside the center band.
    /// `next_spawn` is the instant the next pending event enters the spawn window.
    pub fn is_safe_to_switch(&self, now: f64, next_spawn: Option<f64>, notes: &NoteField) -> bool {
        if next_spawn.is_some_and(|at| at - now <= self.config.guard_interval) {
            return false;
        }
        match notes.len() {
            0 => true,
            1 | 2 => notes
                .iter()
                .all(|n| (n.hitbox.center_y() - self.center_y).abs() <= self.config.safe_band),
            _ => false,
        }
    }

    pub fn check(
        &mut self,
        now: f64,
        scheduler: &SpawnScheduler,
        field: &mut Playfield,
    ) -> GravityCheck {
        if !self.enabled || now < self.state.next_switch_at {
            return GravityCheck::Idle;
        }

        let next_spawn = scheduler
            .next_pending()
            .map(|ts| ts - scheduler.spawn_window());
        if !self.is_safe_to_switch(now, next_spawn, &field.notes) {
            let retry_at = now + self.config.retry_delay;
            self.state.next_switch_at = retry_at;
            debug!(now, retry_at, live = field.notes.len(), "gravity switch deferred");
            return GravityCheck::Deferred { retry_at };
        }

        let active = !self.state.active;
        let duration = if active {
            self.draw(self.config.gravity_duration)
        } else {
            self.draw(self.config.normal_duration)
        };
        self.state = GravityState {
            active,
            next_switch_at: now + duration,
        };
        field.set_gravity(active);
        info!(now, active, next_switch_at = self.state.next_switch_at, "gravity toggled");
        GravityCheck::Toggled {
            active,
            next_switch_at: self.state.next_switch_at,
        }
    }
}
