pub mod pattern;

use tracing::{debug, warn};

pub use self::pattern::{LaneStrategy, Pattern, RecordedLanes, WeightedPatterns};
use crate::chart::{Lane, TimestampStream};
use crate::error::EngineError;

/// A note the field should create now, for an event due at `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub lane: Lane,
    pub timestamp: f64,
}

/// Releases key-log events once they come within `spawn_window` seconds.
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    stream: TimestampStream,
    spawn_window: f64,
}

impl SpawnScheduler {
    pub fn new(stream: TimestampStream, spawn_window: f64) -> Self {
        Self {
            stream,
            spawn_window,
        }
    }

    pub fn spawn_window(&self) -> f64 {
        self.spawn_window
    }

    /// Due time of the earliest pending event.
    pub fn next_pending(&self) -> Option<f64> {
        self.stream.peek().map(|e| e.timestamp)
    }

    pub fn pending(&self) -> usize {
        self.stream.len()
    }

    pub fn is_drained(&self) -> bool {
        self.stream.is_empty()
    }

    /// Pops every head event with `0 <= timestamp - now <= spawn_window` and asks
    /// `strategy` for its lanes. A head already in the past can never enter the
    /// window, so it is dropped instead of blocking the queue.
    pub fn poll(&mut self, now: f64, strategy: &mut dyn LaneStrategy) -> Vec<SpawnRequest> {
        let mut requests = Vec::new();

        while let Some(head) = self.stream.peek() {
            let lead = head.timestamp - now;
            if lead < 0.0 {
                if let Some(stale) = self.stream.pop() {
                    warn!(
                        timestamp = stale.timestamp,
                        now, "dropping event that was never spawned in time"
                    );
                }
                continue;
            }
            if lead > self.spawn_window {
                break;
            }

            let Some(event) = self.stream.pop() else {
                break;
            };
            let lanes = strategy.select(&event);
            if lanes.is_empty() {
                let err = EngineError::data("event has no lanes").with_timestamp(event.timestamp);
                warn!("{err}");
                continue;
            }
            debug!(timestamp = event.timestamp, now, ?lanes, "event entered spawn window");
            requests.extend(lanes.into_iter().map(|lane| SpawnRequest {
                lane,
                timestamp: event.timestamp,
            }));
        }

        requests
    }
}
