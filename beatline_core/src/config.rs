use std::{fmt, fs, path::Path, str::FromStr};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::chart::LaneMap;
use crate::error::{EngineError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Gravity mode only runs on hard.
    pub fn gravity_enabled(self) -> bool {
        matches!(self, Difficulty::Hard)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(s)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Pixel thresholds on `|note.center_y - line.center_y|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeWindows {
    pub perfect: f32,
    pub good: f32,
    pub late: f32,
}

impl Default for JudgeWindows {
    fn default() -> Self {
        Self {
            perfect: 20.0,
            good: 65.0,
            late: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTable {
    pub perfect: u64,
    pub good: u64,
    pub late: u64,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            perfect: 100,
            good: 50,
            late: 25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedTable {
    /// Easy travel speed in px/s. 9.44 px per frame at 60 Hz.
    pub base: f32,
    pub easy: f32,
    pub medium: f32,
    pub hard: f32,
}

impl SpeedTable {
    pub fn speed_for(&self, difficulty: Difficulty) -> f32 {
        let multiplier = match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        };
        self.base * multiplier
    }
}

impl Default for SpeedTable {
    fn default() -> Self {
        Self {
            base: 566.4,
            easy: 1.0,
            medium: 1.2,
            hard: 1.4,
        }
    }
}

/// Screen geometry in pixels, y pointing down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub lane_x: LaneMap<f32>,
    /// Top edge of a freshly spawned note in normal mode.
    pub spawn_y: f32,
    /// Top edge of the judgment line in normal mode.
    pub line_y: f32,
    pub line_size: Vec2,
    /// Sprite size per lane. A lane without a sprite cannot spawn notes.
    pub note_sizes: LaneMap<Option<Vec2>>,
    pub hitbox_scale: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 900.0,
            lane_x: LaneMap([270.0, 540.0, 810.0, 1080.0]),
            spawn_y: -100.0,
            line_y: 750.0,
            line_size: Vec2::new(100.0, 100.0),
            note_sizes: LaneMap([Some(Vec2::new(100.0, 100.0)); 4]),
            hitbox_scale: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    /// A pending spawn due within this many seconds blocks a switch.
    pub guard_interval: f64,
    /// Half-height of the band around the vertical screen center where notes may sit during a switch.
    pub safe_band: f32,
    pub retry_delay: f64,
    /// How long gravity mode lasts once entered.
    pub gravity_duration: (f64, f64),
    /// How long normal mode lasts once gravity is exited.
    pub normal_duration: (f64, f64),
    pub seed: Option<u64>,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            guard_interval: 1.0,
            safe_band: 150.0,
            retry_delay: 1.0,
            gravity_duration: (8.0, 15.0),
            normal_duration: (15.0, 30.0),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub enabled: bool,
    pub capacity: usize,
    pub poll_timeout_ms: u64,
    pub shutdown_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 64,
            poll_timeout_ms: 100,
            shutdown_timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub difficulty: Difficulty,
    pub tick_rate: u32,
    pub spawn_window: f64,
    pub speeds: SpeedTable,
    pub windows: JudgeWindows,
    pub scores: ScoreTable,
    pub layout: Layout,
    pub gravity: GravityConfig,
    pub pipeline: PipelineConfig,
    /// Seconds a feedback label stays visible.
    pub feedback_duration: f64,
    /// Hits closer together than this chain into one feedback label.
    pub chain_window: f64,
    pub music_track: Option<String>,
    pub music_start_delay: f64,
    pub music_volume: f32,
    /// Seed for pattern mode lane selection.
    pub pattern_seed: Option<u64>,
    pub pattern_mode: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            tick_rate: 60,
            spawn_window: 1.55,
            speeds: SpeedTable::default(),
            windows: JudgeWindows::default(),
            scores: ScoreTable::default(),
            layout: Layout::default(),
            gravity: GravityConfig::default(),
            pipeline: PipelineConfig::default(),
            feedback_duration: 0.5,
            chain_window: 0.1,
            music_track: None,
            music_start_delay: 5.0,
            music_volume: 0.3,
            pattern_seed: None,
            pattern_mode: false,
        }
    }
}

impl GameConfig {
    pub fn speed(&self) -> f32 {
        self.speeds.speed_for(self.difficulty)
    }

    pub fn tick_interval(&self) -> f64 {
        1.0 / f64::from(self.tick_rate.max(1))
    }

    /// Reads a JSON config. Read failures are `Io` errors, bad JSON and
    /// failed validation are `Config` errors.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            EngineError::new(ErrorKind::Io, format!("failed to read config: {e}"))
                .with_file(path.display().to_string())
        })?;
        let config: GameConfig = serde_json::from_slice(&bytes).map_err(|e| {
            EngineError::config(format!("failed to parse config json: {e}"))
                .with_file(path.display().to_string())
        })?;
        config
            .validate()
            .map_err(|e| e.with_file(path.display().to_string()))?;
        Ok(config)
    }

    pub fn load_from_str(json: &str) -> Result<Self, EngineError> {
        let config: GameConfig = serde_json::from_str(json)
            .map_err(|e| EngineError::config(format!("failed to parse config json: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        ensure(self.tick_rate > 0, "tick_rate must be > 0")?;
        ensure(self.spawn_window > 0.0, "spawn_window must be > 0")?;
        ensure(
            self.windows.perfect <= self.windows.good && self.windows.good <= self.windows.late,
            "judge windows must satisfy perfect <= good <= late",
        )?;
        for (name, (lo, hi)) in [
            ("gravity_duration", self.gravity.gravity_duration),
            ("normal_duration", self.gravity.normal_duration),
        ] {
            ensure(0.0 < lo && lo <= hi, format!("{name} must satisfy 0 < min <= max"))?;
        }
        ensure(self.pipeline.capacity > 0, "pipeline capacity must be > 0")?;
        Ok(())
    }
}

fn ensure(cond: bool, message: impl Into<String>) -> Result<(), EngineError> {
    if cond {
        Ok(())
    } else {
        Err(EngineError::config(message))
    }
}
