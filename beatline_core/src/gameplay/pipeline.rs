use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{
    bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::judge::{Candidate, HitJudge, Judgment, MissReason};
use crate::chart::Lane;
use crate::config::PipelineConfig;
use crate::error::{EngineError, ErrorKind};
use crate::field::Playfield;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPress {
    pub lane: Lane,
    /// Submission order.
    pub seq: u64,
    /// Session time of the key press.
    pub at: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub press: KeyPress,
    /// `None` when the candidate left the field before it could be removed.
    pub judgment: Option<Judgment>,
}

#[derive(Debug, Clone, Copy)]
struct Gated {
    press: KeyPress,
    verdict: Result<Candidate, MissReason>,
}

struct Worker {
    name: &'static str,
    handle: JoinHandle<()>,
    /// Disconnects when the worker's closure returns.
    done: Receiver<()>,
}

/// Judges presses off the tick thread in two stages: candidate selection and
/// overlap gating, then tier classification and removal. Each stage is a single
/// thread reading a FIFO queue, so presses resolve in submission order.
pub struct JudgePipeline {
    input_tx: Sender<KeyPress>,
    // Held to evict the oldest press when the queue is full.
    input_rx: Receiver<KeyPress>,
    outcome_rx: Receiver<PipelineOutcome>,
    running: Arc<AtomicBool>,
    /// Submitted presses whose outcome has not been received yet.
    in_flight: AtomicUsize,
    workers: Vec<Worker>,
    next_seq: u64,
    shutdown_timeout: Duration,
}

impl JudgePipeline {
    pub fn spawn(
        judge: HitJudge,
        playfield: Arc<Mutex<Playfield>>,
        config: &PipelineConfig,
    ) -> Result<Self, EngineError> {
        let capacity = config.capacity.max(1);
        let poll = Duration::from_millis(config.poll_timeout_ms.max(1));
        let (input_tx, input_rx) = bounded::<KeyPress>(capacity);
        let (gated_tx, gated_rx) = bounded::<Gated>(capacity);
        let (outcome_tx, outcome_rx) = bounded::<PipelineOutcome>(capacity);
        let running = Arc::new(AtomicBool::new(true));

        let select_stage = {
            let rx = input_rx.clone();
            let running = running.clone();
            let playfield = playfield.clone();
            spawn_worker("judge-select", move || {
                while running.load(Ordering::Acquire) {
                    let press = match rx.recv_timeout(poll) {
                        Ok(press) => press,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    };
                    let verdict = judge.select_candidate(press.lane, &playfield.lock());
                    if !send_while_running(&gated_tx, Gated { press, verdict }, &running, poll) {
                        break;
                    }
                }
            })?
        };

        let classify_stage = {
            let stage_running = running.clone();
            let worker = spawn_worker("judge-classify", move || {
                let running = stage_running;
                while running.load(Ordering::Acquire) {
                    let gated = match gated_rx.recv_timeout(poll) {
                        Ok(gated) => gated,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    };
                    let judgment = classify(&judge, &gated, &playfield);
                    let outcome = PipelineOutcome {
                        press: gated.press,
                        judgment,
                    };
                    if !send_while_running(&outcome_tx, outcome, &running, poll) {
                        break;
                    }
                }
            });
            match worker {
                Ok(worker) => worker,
                Err(err) => {
                    running.store(false, Ordering::Release);
                    return Err(err);
                }
            }
        };

        Ok(Self {
            input_tx,
            input_rx,
            outcome_rx,
            running,
            in_flight: AtomicUsize::new(0),
            workers: vec![select_stage, classify_stage],
            next_seq: 0,
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
        })
    }

    /// Queues a press made at session time `at` without blocking. A full queue
    /// evicts its oldest press.
    pub fn submit(&mut self, lane: Lane, at: f64) -> bool {
        if !self.is_running() {
            warn!(%lane, "judge pipeline is stopped; press dropped");
            return false;
        }
        let press = KeyPress {
            lane,
            seq: self.next_seq,
            at,
        };
        self.next_seq += 1;

        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let press = match self.input_tx.try_send(press) {
            Ok(()) => return true,
            Err(TrySendError::Disconnected(_)) => {
                self.in_flight.fetch_sub(1, Ordering::AcqRel);
                warn!(%lane, "judge pipeline is stopped; press dropped");
                return false;
            }
            Err(TrySendError::Full(press)) => press,
        };

        if let Ok(evicted) = self.input_rx.try_recv() {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            warn!(lane = %evicted.lane, seq = evicted.seq, "judge queue full; oldest press dropped");
        }
        match self.input_tx.try_send(press) {
            Ok(()) => true,
            Err(_) => {
                self.in_flight.fetch_sub(1, Ordering::AcqRel);
                warn!(%lane, "judge queue still full; press dropped");
                false
            }
        }
    }

    /// Outcomes finished so far, in submission order.
    pub fn drain(&self) -> Vec<PipelineOutcome> {
        let outcomes: Vec<PipelineOutcome> = self.outcome_rx.try_iter().collect();
        self.in_flight.fetch_sub(outcomes.len(), Ordering::AcqRel);
        outcomes
    }

    /// Waits up to `timeout` for at least one outcome.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PipelineOutcome> {
        let outcome = self.outcome_rx.recv_timeout(timeout).ok()?;
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
        Some(outcome)
    }

    /// True when every submitted press has been drained.
    pub fn is_idle(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) == 0
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Signals both stages and joins each within the shutdown timeout.
    /// A stage that does not stop in time is logged and detached.
    pub fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.running.store(false, Ordering::Release);
        let deadline = Instant::now() + self.shutdown_timeout;

        for worker in self.workers.drain(..) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match worker.done.recv_timeout(remaining) {
                Err(RecvTimeoutError::Timeout) => {
                    warn!(stage = worker.name, timeout = ?self.shutdown_timeout, "judge stage did not stop in time");
                }
                _ => {
                    if worker.handle.join().is_err() {
                        warn!(stage = worker.name, "judge stage panicked");
                    }
                }
            }
        }
        info!("judge pipeline stopped");
    }
}

impl Drop for JudgePipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_worker(
    name: &'static str,
    body: impl FnOnce() + Send + 'static,
) -> Result<Worker, EngineError> {
    let (done_tx, done) = bounded::<()>(1);
    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let _done = done_tx;
            body();
        })
        .map_err(|e| EngineError::new(ErrorKind::Io, format!("failed to spawn {name} thread: {e}")))?;
    Ok(Worker { name, handle, done })
}

/// Blocks on a full queue, giving up once the pipeline stops.
fn send_while_running<T>(tx: &Sender<T>, mut msg: T, running: &AtomicBool, poll: Duration) -> bool {
    loop {
        match tx.send_timeout(msg, poll) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(back)) => {
                if !running.load(Ordering::Acquire) {
                    return false;
                }
                msg = back;
            }
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}

fn classify(judge: &HitJudge, gated: &Gated, playfield: &Mutex<Playfield>) -> Option<Judgment> {
    let candidate = match gated.verdict {
        Ok(candidate) => candidate,
        Err(reason) => {
            return Some(Judgment::Miss {
                lane: gated.press.lane,
                note: None,
                reason,
            })
        }
    };

    let judgment = judge.resolve(&candidate);
    if let Judgment::Hit { note, .. } = &judgment {
        if playfield.lock().notes.take(*note).is_none() {
            debug!(%note, seq = gated.press.seq, "candidate already resolved; press discarded");
            return None;
        }
    }
    Some(judgment)
}
