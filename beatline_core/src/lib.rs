//! Four-lane rhythm game engine: note scheduling, movement, hit judgment,
//! combo scoring and the gravity twist, independent of any renderer.

pub mod audio;
pub mod chart;
pub mod config;
pub mod error;
pub mod field;
pub mod gameplay;
pub mod input;
pub mod spawn;
pub mod time;

pub use chart::{Lane, LaneMap, TimedEvent, TimestampStream};
pub use config::{Difficulty, GameConfig};
pub use error::{EngineError, ErrorKind};
pub use gameplay::{Session, SessionSummary};
