use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chart::Lane;
use crate::config::{JudgeWindows, ScoreTable};
use crate::error::EngineError;
use crate::field::{NoteId, Playfield, Rect, TravelDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Perfect,
    Good,
    Late,
    Early,
}

impl Tier {
    pub fn name(self) -> &'static str {
        match self {
            Tier::Perfect => "Perfect",
            Tier::Good => "Good",
            Tier::Late => "Late",
            Tier::Early => "Early",
        }
    }

    /// Sound effect played on this tier.
    pub fn effect(self) -> &'static str {
        match self {
            Tier::Perfect => "perfect",
            Tier::Good | Tier::Late | Tier::Early => "good",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissReason {
    NoCandidate,
    NoLine,
    NoHorizontalOverlap,
    NoVerticalOverlap,
    OutOfWindow,
}

/// The note a press would judge, with the geometry it was selected on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub note: NoteId,
    pub lane: Lane,
    pub hitbox: Rect,
    pub line: Rect,
    pub direction: TravelDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Judgment {
    Hit {
        note: NoteId,
        lane: Lane,
        tier: Tier,
        base_score: u64,
        distance: f32,
    },
    Miss {
        lane: Lane,
        /// The note the press was nearest to. A missed press leaves it live.
        note: Option<NoteId>,
        reason: MissReason,
    },
}

impl Judgment {
    pub fn lane(&self) -> Lane {
        match self {
            Judgment::Hit { lane, .. } | Judgment::Miss { lane, .. } => *lane,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Judgment::Hit { .. })
    }

    pub fn effect(&self) -> &'static str {
        match self {
            Judgment::Hit { tier, .. } => tier.effect(),
            Judgment::Miss { .. } => "miss",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HitJudge {
    pub windows: JudgeWindows,
    pub scores: ScoreTable,
}

impl HitJudge {
    pub fn new(windows: JudgeWindows, scores: ScoreTable) -> Self {
        Self { windows, scores }
    }

    pub fn base_score(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Perfect => self.scores.perfect,
            Tier::Good => self.scores.good,
            Tier::Late | Tier::Early => self.scores.late,
        }
    }

    /// Picks the lane's note nearest the line and checks that the two overlap.
    pub fn select_candidate(&self, lane: Lane, field: &Playfield) -> Result<Candidate, MissReason> {
        let mut notes = field.notes.lane_notes(lane).peekable();
        if notes.peek().is_none() {
            return Err(MissReason::NoCandidate);
        }
        let line = field.line(lane).ok_or(MissReason::NoLine)?.rect;
        let line_center = line.center_y();

        // Strict `<` keeps the earliest-spawned note on ties.
        let mut closest = None;
        let mut best = f32::INFINITY;
        for note in notes {
            let dist = (note.hitbox.center_y() - line_center).abs();
            if dist < best {
                best = dist;
                closest = Some(note);
            }
        }
        let note = closest.ok_or(MissReason::NoCandidate)?;

        if !note.hitbox.overlaps_horizontally(&line) {
            return Err(MissReason::NoHorizontalOverlap);
        }
        if note.hitbox.vertical_overlap(&line) <= 0.0 {
            return Err(MissReason::NoVerticalOverlap);
        }

        Ok(Candidate {
            note: note.id,
            lane,
            hitbox: note.hitbox,
            line,
            direction: field.direction(),
        })
    }

    /// Tier for a gated candidate, with its center distance. `None` is a miss.
    pub fn classify(&self, candidate: &Candidate) -> Option<(Tier, f32)> {
        let offset = candidate.hitbox.center_y() - candidate.line.center_y();
        let distance = offset.abs();
        let is_late = offset * candidate.direction.sign() > 0.0;
        let within_line = candidate.hitbox.bottom() >= candidate.line.top()
            && candidate.hitbox.top() <= candidate.line.bottom();

        let tier = if distance <= self.windows.perfect {
            Tier::Perfect
        } else if distance <= self.windows.good {
            Tier::Good
        } else if within_line && distance <= self.windows.late {
            if is_late {
                Tier::Late
            } else {
                Tier::Early
            }
        } else {
            return None;
        };
        Some((tier, distance))
    }

    /// Turns a gated candidate into a judgment without touching the field.
    pub fn resolve(&self, candidate: &Candidate) -> Judgment {
        match self.classify(candidate) {
            Some((tier, distance)) => Judgment::Hit {
                note: candidate.note,
                lane: candidate.lane,
                tier,
                base_score: self.base_score(tier),
                distance,
            },
            None => Judgment::Miss {
                lane: candidate.lane,
                note: Some(candidate.note),
                reason: MissReason::OutOfWindow,
            },
        }
    }

    /// Judges a press against the field, removing the note on a hit.
    /// A miss leaves the field untouched.
    pub fn judge(&self, lane: Lane, field: &mut Playfield) -> Result<Judgment, EngineError> {
        let judgment = match self.select_candidate(lane, field) {
            Ok(candidate) => self.resolve(&candidate),
            Err(reason) => Judgment::Miss {
                lane,
                note: None,
                reason,
            },
        };

        if let Judgment::Hit { note, .. } = &judgment {
            if field.notes.take(*note).is_none() {
                return Err(EngineError::invariant(format!(
                    "note {note} vanished between selection and removal"
                ))
                .with_lane(lane));
            }
        }
        debug!(%lane, ?judgment, "press judged");
        Ok(judgment)
    }
}
