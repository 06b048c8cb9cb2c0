use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::judge::{Judgment, Tier};
use crate::error::EngineError;
use crate::field::NoteId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const GREEN: Rgb = Rgb(0, 255, 0);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const GREY: Rgb = Rgb(128, 128, 128);

    pub fn for_tier(tier: Tier) -> Rgb {
        match tier {
            Tier::Perfect => Rgb::GREEN,
            Tier::Good => Rgb::YELLOW,
            Tier::Late | Tier::Early => Rgb::RED,
        }
    }
}

/// Text shown to the player after a judgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub label: String,
    pub color: Rgb,
    /// Session time the label was set.
    pub at: f64,
}

impl Feedback {
    pub fn is_visible(&self, now: f64, duration: f64) -> bool {
        now - self.at < duration
    }
}

/// What the scorer consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreEvent {
    Hit {
        note: NoteId,
        tier: Tier,
        base_score: u64,
    },
    /// `resolved` is the note this miss removed from the field, if any.
    Miss { resolved: Option<NoteId> },
}

impl From<&Judgment> for ScoreEvent {
    fn from(judgment: &Judgment) -> Self {
        match judgment {
            Judgment::Hit {
                note,
                tier,
                base_score,
                ..
            } => ScoreEvent::Hit {
                note: *note,
                tier: *tier,
                base_score: *base_score,
            },
            // A press that misses never removes a note.
            Judgment::Miss { .. } => ScoreEvent::Miss { resolved: None },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierCounts {
    pub perfect: u32,
    pub good: u32,
    pub late: u32,
    pub early: u32,
    pub miss: u32,
}

impl TierCounts {
    fn record(&mut self, tier: Tier) {
        match tier {
            Tier::Perfect => self.perfect += 1,
            Tier::Good => self.good += 1,
            Tier::Late => self.late += 1,
            Tier::Early => self.early += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreState {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub misses: u32,
    pub tiers: TierCounts,
    pub last_feedback: Option<Feedback>,
}

/// Combo multiplier for the combo count before the hit is added.
pub fn multiplier_for(combo: u32) -> u64 {
    if combo >= 300 {
        4
    } else if combo >= 200 {
        3
    } else if combo >= 100 {
        2
    } else {
        1
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComboScorer {
    state: ScoreState,
    chain_window: f64,
    chain_hits: u32,
    chain_points: u64,
    resolved: HashSet<NoteId>,
}

impl ComboScorer {
    pub fn new(chain_window: f64) -> Self {
        Self {
            chain_window,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    /// Applies one outcome at session time `now` and returns the new feedback.
    /// Scoring the same note twice is an invariant violation and changes nothing.
    pub fn apply(&mut self, event: ScoreEvent, now: f64) -> Result<Feedback, EngineError> {
        match event {
            ScoreEvent::Hit {
                note,
                tier,
                base_score,
            } => {
                self.mark_resolved(note)?;
                let points = base_score * multiplier_for(self.state.combo);
                self.state.score += points;
                self.state.combo += 1;
                self.state.max_combo = self.state.max_combo.max(self.state.combo);
                self.state.tiers.record(tier);

                let chained = self.chain_hits > 0
                    && self
                        .state
                        .last_feedback
                        .as_ref()
                        .is_some_and(|f| now - f.at < self.chain_window);
                let label = if chained {
                    self.chain_hits += 1;
                    self.chain_points += points;
                    format!("{} x{} +{}", tier.name(), self.chain_hits, self.chain_points)
                } else {
                    self.chain_hits = 1;
                    self.chain_points = points;
                    tier.name().to_string()
                };
                Ok(self.set_feedback(label, Rgb::for_tier(tier), now))
            }
            ScoreEvent::Miss { resolved } => {
                if let Some(note) = resolved {
                    self.mark_resolved(note)?;
                }
                self.state.combo = 0;
                self.state.misses += 1;
                self.state.tiers.miss += 1;
                self.chain_hits = 0;
                self.chain_points = 0;
                Ok(self.set_feedback("Miss".to_string(), Rgb::GREY, now))
            }
        }
    }

    fn mark_resolved(&mut self, note: NoteId) -> Result<(), EngineError> {
        if !self.resolved.insert(note) {
            return Err(EngineError::invariant(format!("note {note} judged twice")));
        }
        Ok(())
    }

    fn set_feedback(&mut self, label: String, color: Rgb, now: f64) -> Feedback {
        let feedback = Feedback {
            label,
            color,
            at: now,
        };
        self.state.last_feedback = Some(feedback.clone());
        feedback
    }
}
