pub mod clock;

pub use clock::{Clock, ManualTimeSource, SystemTimeSource, TimeSource};
