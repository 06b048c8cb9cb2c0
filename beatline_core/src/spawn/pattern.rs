use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::chart::{Lane, TimedEvent};
use crate::config::Difficulty;
use crate::error::{EngineError, ErrorKind};

/// Chooses the lanes for a popped event. Called once per event.
pub trait LaneStrategy {
    fn select(&mut self, event: &TimedEvent) -> Vec<Lane>;
}

/// Plays the lanes recorded in the key log.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedLanes;

impl LaneStrategy for RecordedLanes {
    fn select(&mut self, event: &TimedEvent) -> Vec<Lane> {
        event.keys.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub lanes: Vec<Lane>,
    /// Relative weight for easy, medium, hard.
    pub weights: [u32; 3],
}

impl Pattern {
    fn new(lanes: &[Lane], weights: [u32; 3]) -> Self {
        Self {
            lanes: lanes.to_vec(),
            weights,
        }
    }

    fn weight(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.weights[0],
            Difficulty::Medium => self.weights[1],
            Difficulty::Hard => self.weights[2],
        }
    }

    /// Singles dominate on easy; chords gain weight with difficulty.
    pub fn default_table() -> Vec<Pattern> {
        use Lane::*;
        vec![
            Pattern::new(&[Left], [10, 8, 6]),
            Pattern::new(&[Down], [10, 8, 6]),
            Pattern::new(&[Up], [10, 8, 6]),
            Pattern::new(&[Right], [10, 8, 6]),
            Pattern::new(&[Left, Down], [1, 3, 4]),
            Pattern::new(&[Down, Up], [1, 3, 4]),
            Pattern::new(&[Up, Right], [1, 3, 4]),
            Pattern::new(&[Left, Right], [1, 2, 4]),
            Pattern::new(&[Left, Down, Up], [0, 0, 2]),
            Pattern::new(&[Down, Up, Right], [0, 0, 2]),
        ]
    }
}

/// Ignores the recorded lanes and draws a pattern weighted by difficulty.
/// The key log still decides when notes arrive.
#[derive(Debug, Clone)]
pub struct WeightedPatterns {
    table: Vec<Pattern>,
    index: WeightedIndex<u32>,
    rng: ChaCha8Rng,
}

impl WeightedPatterns {
    pub fn new(difficulty: Difficulty, seed: u64) -> Result<Self, EngineError> {
        Self::with_table(Pattern::default_table(), difficulty, seed)
    }

    pub fn with_table(
        table: Vec<Pattern>,
        difficulty: Difficulty,
        seed: u64,
    ) -> Result<Self, EngineError> {
        let index = WeightedIndex::new(table.iter().map(|p| p.weight(difficulty))).map_err(|e| {
            EngineError::new(
                ErrorKind::Config,
                format!("invalid pattern weights for {difficulty}: {e}"),
            )
        })?;
        Ok(Self {
            table,
            index,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }
}

impl LaneStrategy for WeightedPatterns {
    fn select(&mut self, _event: &TimedEvent) -> Vec<Lane> {
        let pick = self.index.sample(&mut self.rng);
        self.table[pick].lanes.clone()
    }
}
