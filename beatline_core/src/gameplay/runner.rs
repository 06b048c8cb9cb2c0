use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use super::session::{Session, SessionSummary};
use crate::audio::AudioService;
use crate::error::EngineError;
use crate::input::events::InputCommand;
use crate::input::InputQueue;
use crate::time::TimeSource;

/// Ticks `session` at its configured rate until it finishes or `Quit` arrives.
/// Commands queued between ticks are applied before the next tick.
pub fn run_fixed_rate<S: TimeSource, A: AudioService>(
    session: &mut Session<S, A>,
    input: &InputQueue,
) -> Result<SessionSummary, EngineError> {
    let interval = Duration::from_secs_f64(session.config().tick_interval());
    let mut next_frame = Instant::now();

    'frames: loop {
        for command in input.drain() {
            match command {
                InputCommand::Press(lane) => {
                    session.press(lane)?;
                }
                InputCommand::Pause => session.pause(),
                InputCommand::Resume => session.resume(),
                InputCommand::Quit => {
                    info!("quit requested");
                    break 'frames;
                }
            }
        }

        if session.tick()?.finished {
            break;
        }

        next_frame += interval;
        let now = Instant::now();
        if next_frame > now {
            thread::sleep(next_frame - now);
        } else {
            // Fell behind; do not try to catch up with a burst of ticks.
            next_frame = now;
        }
    }

    session.finish();
    Ok(session.summary())
}
