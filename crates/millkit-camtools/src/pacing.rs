//! Cooperative status pacing
//!
//! Long surfacing passes enqueue many moves back to back. Every second or
//! so the emitter yields to the sink so the surrounding system can process
//! idle work and refresh its status display. Pacing never alters geometry.

use std::time::{Duration, Instant};

use millkit_core::CommandSink;

/// Wall-clock pacer for cooperative yields
#[derive(Debug, Clone)]
pub struct StatusPacer {
    interval: Duration,
    last: Instant,
    yields: usize,
}

impl StatusPacer {
    /// Default time between yields
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    /// Create a pacer with the default one second interval
    pub fn new() -> Self {
        Self::with_interval(Self::DEFAULT_INTERVAL)
    }

    /// Create a pacer with a custom interval
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
            yields: 0,
        }
    }

    /// Yield to the sink if the interval has elapsed; returns whether it did
    pub fn tick<S: CommandSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        if self.last.elapsed() < self.interval {
            return false;
        }
        sink.service_idle();
        self.last = Instant::now();
        self.yields += 1;
        true
    }

    /// Number of yields performed so far
    pub fn yields(&self) -> usize {
        self.yields
    }
}

impl Default for StatusPacer {
    fn default() -> Self {
        Self::new()
    }
}
