use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::gravity::{GravityCheck, GravityController, GravityState};
use super::judge::{HitJudge, Judgment};
use super::pipeline::{JudgePipeline, PipelineOutcome};
use super::score::{ComboScorer, Feedback, ScoreEvent, ScoreState, TierCounts};
use crate::audio::{AudioService, EFFECT_MISS};
use crate::chart::{Lane, TimestampStream};
use crate::config::{Difficulty, GameConfig};
use crate::error::EngineError;
use crate::field::{FieldExit, NoteId, Playfield};
use crate::spawn::{LaneStrategy, RecordedLanes, SpawnScheduler, WeightedPatterns};
use crate::time::{Clock, TimeSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Paused,
    Finished,
}

/// Everything one tick changed.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub now: f64,
    pub spawned: Vec<NoteId>,
    pub missed: Vec<NoteId>,
    pub judgments: Vec<Judgment>,
    pub gravity: GravityCheck,
    pub feedback: Option<Feedback>,
    pub finished: bool,
}

impl TickReport {
    fn empty(now: f64) -> Self {
        Self {
            now,
            spawned: Vec::new(),
            missed: Vec::new(),
            judgments: Vec::new(),
            gravity: GravityCheck::Idle,
            feedback: None,
            finished: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub difficulty: Difficulty,
    pub score: u64,
    pub max_combo: u32,
    pub misses: u32,
    pub tiers: TierCounts,
    pub elapsed: f64,
}

/// One play-through: drives spawning, movement, miss detection, gravity and
/// scoring from a single tick, and judges presses inline or through the pipeline.
pub struct Session<S, A> {
    config: GameConfig,
    clock: Clock<S>,
    scheduler: SpawnScheduler,
    strategy: Box<dyn LaneStrategy + Send>,
    playfield: Arc<Mutex<Playfield>>,
    gravity: GravityController,
    judge: HitJudge,
    scorer: ComboScorer,
    audio: A,
    pipeline: Option<JudgePipeline>,
    state: SessionState,
    last_tick: Option<f64>,
    music_started: bool,
}

impl<S: TimeSource, A: AudioService> Session<S, A> {
    /// Lanes come from the key log, or from weighted patterns when `pattern_mode` is set.
    pub fn new(
        config: GameConfig,
        stream: TimestampStream,
        source: S,
        audio: A,
    ) -> Result<Self, EngineError> {
        let strategy: Box<dyn LaneStrategy + Send> = if config.pattern_mode {
            let seed = config.pattern_seed.unwrap_or_else(rand::random);
            Box::new(WeightedPatterns::new(config.difficulty, seed)?)
        } else {
            Box::new(RecordedLanes)
        };
        Self::with_strategy(config, stream, source, audio, strategy)
    }

    pub fn with_strategy(
        config: GameConfig,
        stream: TimestampStream,
        source: S,
        audio: A,
        strategy: Box<dyn LaneStrategy + Send>,
    ) -> Result<Self, EngineError> {
        let clock = Clock::new(source);
        let playfield = Arc::new(Mutex::new(Playfield::new(
            config.layout.clone(),
            config.speed(),
        )));
        let judge = HitJudge::new(config.windows, config.scores);
        let pipeline = if config.pipeline.enabled {
            Some(JudgePipeline::spawn(judge, playfield.clone(), &config.pipeline)?)
        } else {
            None
        };
        let gravity = GravityController::new(
            config.gravity,
            config.difficulty.gravity_enabled(),
            config.layout.height,
            clock.elapsed(),
        );

        info!(
            difficulty = %config.difficulty,
            events = stream.len(),
            pipeline = pipeline.is_some(),
            "session started"
        );
        Ok(Self {
            scheduler: SpawnScheduler::new(stream, config.spawn_window),
            scorer: ComboScorer::new(config.chain_window),
            strategy,
            playfield,
            gravity,
            judge,
            audio,
            pipeline,
            clock,
            config,
            state: SessionState::Running,
            last_tick: None,
            music_started: false,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    pub fn score(&self) -> &ScoreState {
        self.scorer.state()
    }

    pub fn gravity(&self) -> GravityState {
        self.gravity.state()
    }

    pub fn scheduler(&self) -> &SpawnScheduler {
        &self.scheduler
    }

    pub fn playfield(&self) -> Arc<Mutex<Playfield>> {
        self.playfield.clone()
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// The feedback label, if still on screen.
    pub fn visible_feedback(&self) -> Option<&Feedback> {
        let now = self.clock.elapsed();
        self.scorer
            .state()
            .last_feedback
            .as_ref()
            .filter(|f| f.is_visible(now, self.config.feedback_duration))
    }

    pub fn tick(&mut self) -> Result<TickReport, EngineError> {
        let now = self.clock.elapsed();
        let mut report = TickReport::empty(now);
        if self.state != SessionState::Running {
            report.finished = self.state == SessionState::Finished;
            return Ok(report);
        }

        let dt = self.last_tick.map_or(0.0, |last| (now - last).max(0.0));
        self.last_tick = Some(now);
        self.start_music_if_due(now);

        let requests = self.scheduler.poll(now, self.strategy.as_mut());
        let exits = {
            let mut field = self.playfield.lock();
            for request in requests {
                match field.spawn_note(request.lane, now) {
                    Ok(id) => report.spawned.push(id),
                    Err(err) => warn!("{err}"),
                }
            }
            let exits = field.advance(dt);
            report.gravity = self.gravity.check(now, &self.scheduler, &mut field);
            exits
        };

        for exit in exits {
            if let FieldExit::Missed(note) = exit {
                debug!(note = %note.id, lane = %note.lane, "note passed its line");
                report.missed.push(note.id);
                let feedback = self.scorer.apply(
                    ScoreEvent::Miss {
                        resolved: Some(note.id),
                    },
                    now,
                )?;
                self.play_effect(EFFECT_MISS);
                report.feedback = Some(feedback);
            }
        }

        let outcomes = self.pipeline.as_ref().map(JudgePipeline::drain).unwrap_or_default();
        for outcome in outcomes {
            if let Some((judgment, feedback)) = self.apply_outcome(outcome)? {
                report.feedback = Some(feedback);
                report.judgments.push(judgment);
            }
        }

        if self.is_complete() {
            self.finish();
            report.finished = true;
        }
        Ok(report)
    }

    /// Judges inline and returns the judgment, or queues the press on the
    /// pipeline and returns `None`. Ignored unless running.
    pub fn press(&mut self, lane: Lane) -> Result<Option<Judgment>, EngineError> {
        if self.state != SessionState::Running {
            debug!(%lane, state = ?self.state, "press ignored");
            return Ok(None);
        }
        let now = self.clock.elapsed();
        if let Some(pipeline) = &mut self.pipeline {
            pipeline.submit(lane, now);
            return Ok(None);
        }

        let judgment = self.judge.judge(lane, &mut self.playfield.lock())?;
        self.apply_judgment(&judgment, now)?;
        Ok(Some(judgment))
    }

    /// Blocks until every queued press has been judged and scored, or `timeout`
    /// passes. Returns the judgments applied. A no-op without a pipeline.
    pub fn flush_judgments(&mut self, timeout: Duration) -> Result<Vec<Judgment>, EngineError> {
        let deadline = Instant::now() + timeout;
        let mut judgments = Vec::new();
        loop {
            let Some(pipeline) = &self.pipeline else {
                break;
            };
            if pipeline.is_idle() {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Some(outcome) = pipeline.recv_timeout(remaining) else {
                warn!(?timeout, "judgments still pending after flush timeout");
                break;
            };
            if let Some((judgment, _)) = self.apply_outcome(outcome)? {
                judgments.push(judgment);
            }
        }
        Ok(judgments)
    }

    pub fn pause(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        self.clock.pause();
        if self.music_started {
            self.audio.pause();
        }
        self.state = SessionState::Paused;
        info!(elapsed = self.clock.elapsed(), "session paused");
    }

    pub fn resume(&mut self) {
        if self.state != SessionState::Paused {
            return;
        }
        self.clock.resume();
        if self.music_started {
            self.audio.resume();
        }
        self.state = SessionState::Running;
        info!(elapsed = self.clock.elapsed(), "session resumed");
    }

    /// Stops the judgment pipeline. Further ticks and presses are no-ops.
    pub fn finish(&mut self) {
        if let Some(pipeline) = &mut self.pipeline {
            pipeline.shutdown();
        }
        if self.state != SessionState::Finished {
            self.state = SessionState::Finished;
            let score = self.scorer.state();
            info!(score = score.score, max_combo = score.max_combo, misses = score.misses, "session finished");
        }
    }

    pub fn summary(&self) -> SessionSummary {
        let score = self.scorer.state();
        SessionSummary {
            difficulty: self.config.difficulty,
            score: score.score,
            max_combo: score.max_combo,
            misses: score.misses,
            tiers: score.tiers,
            elapsed: self.clock.elapsed(),
        }
    }

    fn is_complete(&self) -> bool {
        self.scheduler.is_drained()
            && self.playfield.lock().notes.is_empty()
            && self.pipeline.as_ref().map_or(true, JudgePipeline::is_idle)
    }

    /// Scores a pipeline outcome at the time its key was pressed.
    fn apply_outcome(
        &mut self,
        outcome: PipelineOutcome,
    ) -> Result<Option<(Judgment, Feedback)>, EngineError> {
        let Some(judgment) = outcome.judgment else {
            debug!(seq = outcome.press.seq, "press resolved against a note already gone");
            return Ok(None);
        };
        let feedback = self.apply_judgment(&judgment, outcome.press.at)?;
        Ok(Some((judgment, feedback)))
    }

    fn apply_judgment(&mut self, judgment: &Judgment, now: f64) -> Result<Feedback, EngineError> {
        let feedback = self.scorer.apply(ScoreEvent::from(judgment), now)?;
        self.play_effect(judgment.effect());
        Ok(feedback)
    }

    fn play_effect(&mut self, name: &str) {
        if let Err(err) = self.audio.play_effect(name) {
            warn!("{err}");
        }
    }

    fn start_music_if_due(&mut self, now: f64) {
        if self.music_started || now < self.config.music_start_delay {
            return;
        }
        self.music_started = true;
        let Some(track) = self.config.music_track.clone() else {
            return;
        };
        match self.audio.play(&track) {
            Ok(()) => {
                self.audio.set_volume(self.config.music_volume);
                info!(%track, "music started");
            }
            Err(err) => warn!("{err}"),
        }
    }
}
