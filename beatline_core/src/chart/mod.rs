pub mod loader;

use std::collections::VecDeque;
use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// One of the four input tracks, bound to the `d f j k` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    Left,
    Down,
    Up,
    Right,
}

impl Lane {
    pub const ALL: [Lane; 4] = [Lane::Left, Lane::Down, Lane::Up, Lane::Right];

    pub fn index(self) -> usize {
        match self {
            Lane::Left => 0,
            Lane::Down => 1,
            Lane::Up => 2,
            Lane::Right => 3,
        }
    }

    pub fn key(self) -> char {
        match self {
            Lane::Left => 'd',
            Lane::Down => 'f',
            Lane::Up => 'j',
            Lane::Right => 'k',
        }
    }

    /// Parses a key-log lane id. Surrounding whitespace is ignored.
    pub fn from_key(key: &str) -> Option<Lane> {
        match key.trim() {
            "d" => Some(Lane::Left),
            "f" => Some(Lane::Down),
            "j" => Some(Lane::Up),
            "k" => Some(Lane::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Exhaustive per-lane table.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LaneMap<T>(pub [T; 4]);

impl<T> LaneMap<T> {
    pub fn from_fn(mut f: impl FnMut(Lane) -> T) -> Self {
        Self([
            f(Lane::Left),
            f(Lane::Down),
            f(Lane::Up),
            f(Lane::Right),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Lane, &T)> {
        Lane::ALL.into_iter().zip(self.0.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Lane, &mut T)> {
        Lane::ALL.into_iter().zip(self.0.iter_mut())
    }
}

impl<T> Index<Lane> for LaneMap<T> {
    type Output = T;

    fn index(&self, lane: Lane) -> &T {
        &self.0[lane.index()]
    }
}

impl<T> IndexMut<Lane> for LaneMap<T> {
    fn index_mut(&mut self, lane: Lane) -> &mut T {
        &mut self.0[lane.index()]
    }
}

/// A row of the key log: every lane listed is due at `timestamp` (seconds).
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    pub timestamp: f64,
    pub keys: Vec<Lane>,
}

impl TimedEvent {
    pub fn new(timestamp: f64, keys: Vec<Lane>) -> Self {
        Self { timestamp, keys }
    }
}

/// Pending key-log events in source order. Source order is trusted and never re-sorted.
#[derive(Debug, Clone, Default)]
pub struct TimestampStream {
    events: VecDeque<TimedEvent>,
}

impl TimestampStream {
    pub fn new(events: impl IntoIterator<Item = TimedEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn peek(&self) -> Option<&TimedEvent> {
        self.events.front()
    }

    pub fn pop(&mut self) -> Option<TimedEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total lane entries still pending.
    pub fn note_count(&self) -> usize {
        self.events.iter().map(|e| e.keys.len()).sum()
    }
}
