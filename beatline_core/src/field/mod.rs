pub mod geometry;
pub mod note;

use glam::Vec2;
use tracing::{debug, warn};

pub use self::geometry::Rect;
pub use self::note::{Note, NoteId};
use crate::chart::{Lane, LaneMap};
use crate::config::Layout;
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TravelDirection {
    /// Normal mode: notes fall toward a line near the bottom.
    #[default]
    Down,
    /// Gravity mode: notes rise toward a line near the top.
    Up,
}

impl TravelDirection {
    pub fn sign(self) -> f32 {
        match self {
            TravelDirection::Down => 1.0,
            TravelDirection::Up => -1.0,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            TravelDirection::Down => TravelDirection::Up,
            TravelDirection::Up => TravelDirection::Down,
        }
    }
}

/// The target zone for one lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgmentLine {
    pub lane: Lane,
    pub rect: Rect,
}

impl JudgmentLine {
    /// True once `note` has moved fully past this line in the direction of travel.
    pub fn is_passed_by(&self, note: &Note, direction: TravelDirection) -> bool {
        match direction {
            TravelDirection::Down => note.rect.top() > self.rect.bottom(),
            TravelDirection::Up => note.rect.bottom() < self.rect.top(),
        }
    }
}

/// Why a note left the field without being hit.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldExit {
    /// Crossed its lane's judgment line unjudged.
    Missed(Note),
    /// Left the screen in a lane without a judgment line.
    OffField(Note),
}

/// Live notes in spawn order. Every removal goes through [`NoteField::take`] or
/// the compaction inside [`NoteField::advance`], so a note leaves at most once.
#[derive(Debug, Clone)]
pub struct NoteField {
    notes: Vec<Note>,
    next_id: u64,
    speed: f32,
}

impl NoteField {
    pub fn new(speed: f32) -> Self {
        Self {
            notes: Vec::new(),
            next_id: 0,
            speed,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn insert(&mut self, lane: Lane, rect: Rect, hitbox_scale: f32, now: f64) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id += 1;
        self.notes.push(Note::new(id, lane, rect, hitbox_scale, now));
        id
    }

    /// Moves every note by `speed * dt * sign` along y, then removes and returns
    /// notes that passed their line or left the `[0, field_height]` band.
    pub fn advance(
        &mut self,
        dt: f64,
        direction: TravelDirection,
        lines: &LaneMap<Option<JudgmentLine>>,
        field_height: f32,
    ) -> Vec<FieldExit> {
        let delta = Vec2::new(0.0, self.speed * dt as f32 * direction.sign());
        let mut exits = Vec::new();

        self.notes.retain_mut(|note| {
            note.translate(delta);
            match &lines[note.lane] {
                Some(line) if line.is_passed_by(note, direction) => {
                    exits.push(FieldExit::Missed(note.clone()));
                    false
                }
                _ => {
                    let off_field = match direction {
                        TravelDirection::Down => note.rect.top() > field_height,
                        TravelDirection::Up => note.rect.bottom() < 0.0,
                    };
                    if off_field {
                        exits.push(FieldExit::OffField(note.clone()));
                    }
                    !off_field
                }
            }
        });
        exits
    }

    /// Removes a note. `None` means it already left the field.
    pub fn take(&mut self, id: NoteId) -> Option<Note> {
        let idx = self.notes.iter().position(|n| n.id == id)?;
        Some(self.notes.remove(idx))
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    pub fn lane_notes(&self, lane: Lane) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(move |n| n.lane == lane)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Notes, judgment lines and travel direction: everything the tick loop and the
/// judge both touch. Shared behind one lock when judging runs off-thread.
#[derive(Debug, Clone)]
pub struct Playfield {
    pub notes: NoteField,
    pub lines: LaneMap<Option<JudgmentLine>>,
    direction: TravelDirection,
    layout: Layout,
}

impl Playfield {
    pub fn new(layout: Layout, speed: f32) -> Self {
        let mut field = Self {
            notes: NoteField::new(speed),
            lines: LaneMap::default(),
            direction: TravelDirection::Down,
            layout,
        };
        field.place_lines();
        field
    }

    pub fn direction(&self) -> TravelDirection {
        self.direction
    }

    pub fn is_gravity(&self) -> bool {
        self.direction == TravelDirection::Up
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn line(&self, lane: Lane) -> Option<&JudgmentLine> {
        self.lines[lane].as_ref()
    }

    /// Drops a lane's judgment line. Presses in that lane then always miss.
    pub fn remove_line(&mut self, lane: Lane) {
        self.lines[lane] = None;
    }

    /// Switches travel direction and mirrors every judgment line to the matching side.
    pub fn set_gravity(&mut self, active: bool) {
        let direction = if active {
            TravelDirection::Up
        } else {
            TravelDirection::Down
        };
        if direction == self.direction {
            return;
        }
        self.direction = direction;
        self.relocate_lines();
        debug!(?direction, "playfield direction changed");
    }

    fn line_top(&self) -> f32 {
        let layout = &self.layout;
        match self.direction {
            TravelDirection::Down => layout.line_y,
            TravelDirection::Up => layout.height - layout.line_y - layout.line_size.y,
        }
    }

    fn place_lines(&mut self) {
        let top = self.line_top();
        let layout = &self.layout;
        for (lane, slot) in self.lines.iter_mut() {
            *slot = Some(JudgmentLine {
                lane,
                rect: Rect::new(Vec2::new(layout.lane_x[lane], top), layout.line_size),
            });
        }
    }

    // A removed line stays removed.
    fn relocate_lines(&mut self) {
        let top = self.line_top();
        for line in self.lines.0.iter_mut().flatten() {
            line.rect.origin.y = top;
        }
    }

    /// Top-left of a fresh note, on the side opposite the line.
    pub fn spawn_origin(&self, lane: Lane, size: Vec2) -> Vec2 {
        let layout = &self.layout;
        let y = match self.direction {
            TravelDirection::Down => layout.spawn_y,
            TravelDirection::Up => layout.height - layout.spawn_y - size.y,
        };
        Vec2::new(layout.lane_x[lane], y)
    }

    /// Fails with a resource error when the lane has no sprite.
    pub fn spawn_note(&mut self, lane: Lane, now: f64) -> Result<NoteId, EngineError> {
        let Some(size) = self.layout.note_sizes[lane] else {
            return Err(EngineError::resource(format!("no sprite for lane {lane}"))
                .with_lane(lane)
                .with_timestamp(now));
        };
        let origin = self.spawn_origin(lane, size);
        let id = self
            .notes
            .insert(lane, Rect::new(origin, size), self.layout.hitbox_scale, now);
        Ok(id)
    }

    pub fn advance(&mut self, dt: f64) -> Vec<FieldExit> {
        let exits = self
            .notes
            .advance(dt, self.direction, &self.lines, self.layout.height);
        for exit in &exits {
            if let FieldExit::OffField(note) = exit {
                warn!(note = %note.id, lane = %note.lane, "note left the field without a judgment line");
            }
        }
        exits
    }
}
