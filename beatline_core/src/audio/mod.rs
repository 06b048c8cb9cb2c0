pub mod channel;

use std::collections::HashSet;

use crate::error::EngineError;
use crate::time::{Clock, SystemTimeSource};

pub use self::channel::{AudioCommand, BackendLink, ChannelAudio};

/// Effect names the engine triggers.
pub const EFFECT_PERFECT: &str = "perfect";
pub const EFFECT_GOOD: &str = "good";
pub const EFFECT_MISS: &str = "miss";

/// Playback transport owned outside the engine.
pub trait AudioService {
    fn play(&mut self, track: &str) -> Result<(), EngineError>;
    fn pause(&mut self);
    fn resume(&mut self);
    /// Seconds into the current track.
    fn position(&self) -> f64;
    /// `volume` is clamped to `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);
    fn play_effect(&mut self, name: &str) -> Result<(), EngineError>;
}

/// Produces no sound but keeps transport state, and rejects effects it does not know.
pub struct SilentAudio {
    effects: HashSet<String>,
    track: Option<String>,
    transport: Option<Clock<SystemTimeSource>>,
    volume: f32,
}

impl SilentAudio {
    pub fn new() -> Self {
        Self::with_effects([EFFECT_PERFECT, EFFECT_GOOD, EFFECT_MISS])
    }

    pub fn with_effects<I, S>(effects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            effects: effects.into_iter().map(Into::into).collect(),
            track: None,
            transport: None,
            volume: 1.0,
        }
    }

    pub fn track(&self) -> Option<&str> {
        self.track.as_deref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl Default for SilentAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioService for SilentAudio {
    fn play(&mut self, track: &str) -> Result<(), EngineError> {
        self.track = Some(track.to_string());
        self.transport = Some(Clock::new(SystemTimeSource::new()));
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(transport) = &mut self.transport {
            transport.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(transport) = &mut self.transport {
            transport.resume();
        }
    }

    fn position(&self) -> f64 {
        self.transport.as_ref().map_or(0.0, Clock::elapsed)
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn play_effect(&mut self, name: &str) -> Result<(), EngineError> {
        if self.effects.contains(name) {
            Ok(())
        } else {
            Err(EngineError::resource(format!("no sound effect named {name:?}")))
        }
    }
}
