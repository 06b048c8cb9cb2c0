pub mod gravity;
pub mod judge;
pub mod pipeline;
pub mod runner;
pub mod score;
pub mod session;

pub use gravity::{GravityCheck, GravityController, GravityState};
pub use judge::{HitJudge, Judgment, MissReason, Tier};
pub use pipeline::{JudgePipeline, KeyPress, PipelineOutcome};
pub use runner::run_fixed_rate;
pub use score::{ComboScorer, Feedback, ScoreEvent, ScoreState, TierCounts};
pub use session::{Session, SessionState, SessionSummary, TickReport};
