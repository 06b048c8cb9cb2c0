use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            origin: center - size * 0.5,
            size,
        }
    }

    pub fn left(&self) -> f32 {
        self.origin.x
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.x
    }

    pub fn top(&self) -> f32 {
        self.origin.y
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.y
    }

    fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    pub fn center_y(&self) -> f32 {
        self.origin.y + self.size.y * 0.5
    }

    /// Edges touching counts as overlapping.
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.right() >= other.left() && self.left() <= other.right()
    }

    /// Signed height of the shared vertical span; <= 0 means disjoint.
    pub fn vertical_overlap(&self, other: &Rect) -> f32 {
        self.bottom().min(other.bottom()) - self.top().max(other.top())
    }

    /// Same rect scaled about its center.
    pub fn scaled(&self, factor: f32) -> Rect {
        Rect::from_center(self.center(), self.size * factor)
    }
}
