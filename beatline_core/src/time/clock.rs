use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use atomic_float::AtomicF64;

/// Raw monotonic seconds. Only differences are meaningful.
pub trait TimeSource {
    fn now(&self) -> f64;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Time source advanced explicitly. Clones share the same time, so a test or a
/// headless driver can hold one handle while the clock reads another.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    time: Arc<AtomicF64>,
}

impl ManualTimeSource {
    pub fn new(start: f64) -> Self {
        Self {
            time: Arc::new(AtomicF64::new(start)),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.time.store(seconds, Ordering::Release);
    }

    pub fn advance(&self, seconds: f64) {
        self.time.fetch_add(seconds, Ordering::AcqRel);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> f64 {
        self.time.load(Ordering::Acquire)
    }
}

/// Session clock. Elapsed time excludes every paused interval and freezes while paused.
pub struct Clock<S> {
    source: S,
    start_time: f64,
    paused_accumulated: f64,
    paused_at: Option<f64>,
}

impl<S: TimeSource> Clock<S> {
    /// Starts counting from the source's current time.
    pub fn new(source: S) -> Self {
        let start_time = source.now();
        Self {
            source,
            start_time,
            paused_accumulated: 0.0,
            paused_at: None,
        }
    }

    pub fn elapsed(&self) -> f64 {
        let now = self.paused_at.unwrap_or_else(|| self.source.now());
        (now - self.start_time - self.paused_accumulated).max(0.0)
    }

    /// No-op while already paused.
    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(self.source.now());
        }
    }

    /// No-op while running.
    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_accumulated += (self.source.now() - paused_at).max(0.0);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
