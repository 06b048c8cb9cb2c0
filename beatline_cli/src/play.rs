use std::io::{self, BufRead};
use std::thread;
use std::time::Instant;

use anyhow::Context;
use beatline_core::audio::{AudioCommand, BackendLink, ChannelAudio};
use beatline_core::chart::TimestampStream;
use beatline_core::config::GameConfig;
use beatline_core::gameplay::{run_fixed_rate, Session, SessionSummary};
use beatline_core::input::events::InputCommand;
use beatline_core::input::InputQueue;
use beatline_core::time::SystemTimeSource;
use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

/// Runs a real-time session fed by stdin.
pub fn run_interactive(config: GameConfig, stream: TimestampStream) -> anyhow::Result<SessionSummary> {
    let (audio, link) = ChannelAudio::new();
    let backend = thread::Builder::new()
        .name("audio-log".to_string())
        .spawn(move || log_backend(link))
        .context("failed to spawn audio thread")?;

    let input = InputQueue::new();
    let sender = input.sender();
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || read_stdin(sender))
        .context("failed to spawn input thread")?;

    let mut session = Session::new(config, stream, SystemTimeSource::new(), audio)
        .context("failed to start session")?;
    info!("d f j k + Enter to hit, p pause, r resume, q quit");
    let summary = run_fixed_rate(&mut session, &input).context("session aborted")?;

    // Dropping the session closes the command channel and ends the backend.
    drop(session);
    if backend.join().is_err() {
        warn!("audio thread panicked");
    }
    Ok(summary)
}

/// Stands in for a playback device: logs each command and advances the track position.
fn log_backend(link: BackendLink) {
    let mut started: Option<Instant> = None;
    let mut paused_for = 0.0;
    let mut paused_at: Option<Instant> = None;

    while let Ok(command) = link.commands.recv() {
        match &command {
            AudioCommand::Play { track } => {
                info!(%track, "audio: play");
                started = Some(Instant::now());
                paused_for = 0.0;
                paused_at = None;
            }
            AudioCommand::Pause => {
                paused_at.get_or_insert_with(Instant::now);
            }
            AudioCommand::Resume => {
                if let Some(at) = paused_at.take() {
                    paused_for += at.elapsed().as_secs_f64();
                }
            }
            AudioCommand::SetVolume(volume) => debug!(volume, "audio: volume"),
            AudioCommand::Effect { name } => debug!(%name, "audio: effect"),
        }
        if let Some(start) = started {
            let now = paused_at.unwrap_or_else(Instant::now);
            link.set_position(now.duration_since(start).as_secs_f64() - paused_for);
        }
    }
}

fn read_stdin(sender: Sender<InputCommand>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        for c in line.chars() {
            let Some(command) = InputCommand::from_char(c) else {
                continue;
            };
            if sender.send(command).is_err() {
                return;
            }
        }
    }
}
