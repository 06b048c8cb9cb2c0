use std::fmt;

use glam::Vec2;

use super::geometry::Rect;
use crate::chart::Lane;

/// Unique per session, assigned in spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(pub u64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub lane: Lane,
    /// Sprite bounds.
    pub rect: Rect,
    /// Judged area, the sprite scaled about its center.
    pub hitbox: Rect,
    pub spawn_time: f64,
    hitbox_scale: f32,
}

impl Note {
    pub fn new(id: NoteId, lane: Lane, rect: Rect, hitbox_scale: f32, spawn_time: f64) -> Self {
        Self {
            id,
            lane,
            rect,
            hitbox: rect.scaled(hitbox_scale),
            spawn_time,
            hitbox_scale,
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.rect.origin += delta;
        self.hitbox = self.rect.scaled(self.hitbox_scale);
    }

    /// Moves the note so its hitbox center sits at `center_y`.
    pub fn set_center_y(&mut self, center_y: f32) {
        let dy = center_y - self.hitbox.center_y();
        self.translate(Vec2::new(0.0, dy));
    }
}
