use std::sync::atomic::Ordering;
use std::sync::Arc;

use atomic_float::AtomicF64;
use crossbeam_channel::{unbounded, Receiver, Sender};

use super::AudioService;
use crate::error::{EngineError, ErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    Play { track: String },
    Pause,
    Resume,
    SetVolume(f32),
    Effect { name: String },
}

/// The playback side: reads commands and publishes the track position.
pub struct BackendLink {
    pub commands: Receiver<AudioCommand>,
    pub position: Arc<AtomicF64>,
}

impl BackendLink {
    pub fn set_position(&self, seconds: f64) {
        self.position.store(seconds, Ordering::Release);
    }
}

/// Forwards transport calls to a playback thread over a channel.
#[derive(Clone)]
pub struct ChannelAudio {
    command_tx: Sender<AudioCommand>,
    position: Arc<AtomicF64>,
}

impl ChannelAudio {
    pub fn new() -> (Self, BackendLink) {
        let (tx, rx) = unbounded();
        let position = Arc::new(AtomicF64::new(0.0));
        (
            Self {
                command_tx: tx,
                position: position.clone(),
            },
            BackendLink {
                commands: rx,
                position,
            },
        )
    }

    fn send(&self, command: AudioCommand) -> Result<(), EngineError> {
        self.command_tx
            .send(command)
            .map_err(|_| EngineError::new(ErrorKind::Resource, "audio backend is gone"))
    }
}

impl AudioService for ChannelAudio {
    fn play(&mut self, track: &str) -> Result<(), EngineError> {
        self.send(AudioCommand::Play {
            track: track.to_string(),
        })
    }

    fn pause(&mut self) {
        let _ = self.send(AudioCommand::Pause);
    }

    fn resume(&mut self) {
        let _ = self.send(AudioCommand::Resume);
    }

    fn position(&self) -> f64 {
        self.position.load(Ordering::Acquire)
    }

    fn set_volume(&mut self, volume: f32) {
        let _ = self.send(AudioCommand::SetVolume(volume.clamp(0.0, 1.0)));
    }

    fn play_effect(&mut self, name: &str) -> Result<(), EngineError> {
        self.send(AudioCommand::Effect {
            name: name.to_string(),
        })
    }
}
