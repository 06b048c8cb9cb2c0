use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context;
use beatline_core::audio::SilentAudio;
use beatline_core::chart::{Lane, TimestampStream};
use beatline_core::config::GameConfig;
use beatline_core::field::NoteId;
use beatline_core::gameplay::{Session, SessionSummary};
use beatline_core::time::ManualTimeSource;
use tracing::{debug, info};

// Simulated seconds allowed after the last event before giving up.
const TAIL_SECONDS: f64 = 30.0;
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Steps a session on simulated time at the configured tick rate until it finishes.
pub fn run_simulation(
    config: GameConfig,
    stream: TimestampStream,
    autoplay: bool,
) -> anyhow::Result<SessionSummary> {
    let step = config.tick_interval();
    let end = stream_end(&stream) + TAIL_SECONDS;
    let source = ManualTimeSource::new(0.0);
    let mut session = Session::new(config, stream, source.clone(), SilentAudio::new())
        .context("failed to start session")?;
    let mut autoplayer = Autoplayer::new(session.playfield().lock().notes.speed() * step as f32);

    loop {
        let report = session.tick().context("session aborted")?;
        if report.finished {
            break;
        }
        if autoplay {
            autoplayer.play(&mut session)?;
        }
        if report.now > end {
            info!(now = report.now, "simulation ran past the last event; stopping");
            break;
        }
        source.advance(step);
    }

    session.finish();
    Ok(session.summary())
}

fn stream_end(stream: &TimestampStream) -> f64 {
    let mut copy = stream.clone();
    let mut last = 0.0_f64;
    while let Some(event) = copy.pop() {
        last = last.max(event.timestamp);
    }
    last
}

/// Presses a lane on the tick where its nearest note is closest to the line center.
struct Autoplayer {
    tolerance: f32,
    pressed: HashSet<NoteId>,
}

impl Autoplayer {
    /// `travel` is how far a note moves in one tick.
    fn new(travel: f32) -> Self {
        Self {
            tolerance: travel / 2.0 + 0.5,
            pressed: HashSet::new(),
        }
    }

    fn play(&mut self, session: &mut Session<ManualTimeSource, SilentAudio>) -> anyhow::Result<()> {
        let due = self.due_lanes(session);
        if due.is_empty() {
            return Ok(());
        }
        for lane in due {
            debug!(%lane, "autoplay press");
            session.press(lane).context("session aborted")?;
        }
        session
            .flush_judgments(FLUSH_TIMEOUT)
            .context("session aborted")?;
        Ok(())
    }

    fn due_lanes(&mut self, session: &Session<ManualTimeSource, SilentAudio>) -> Vec<Lane> {
        let playfield = session.playfield();
        let field = playfield.lock();
        let mut due = Vec::new();

        for lane in Lane::ALL {
            let Some(line) = field.line(lane) else {
                continue;
            };
            let center = line.rect.center_y();
            let nearest = field
                .notes
                .lane_notes(lane)
                .map(|n| (n.id, (n.hitbox.center_y() - center).abs()))
                .min_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((id, distance)) = nearest {
                if distance <= self.tolerance && self.pressed.insert(id) {
                    due.push(lane);
                }
            }
        }
        due
    }
}
