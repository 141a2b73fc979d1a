//! Time budget and search cutoff for one build attempt

use std::time::{Duration, Instant};

use crate::error::ShapeBuildFailure;

/// Wall-clock budget checked cooperatively at every expensive step
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    max: Option<Duration>,
}

impl Deadline {
    /// A budget that never runs out
    pub fn unbounded() -> Self {
        Self {
            start: Instant::now(),
            max: None,
        }
    }

    /// Start a budget of `max_millis`; negative values mean unbounded
    pub fn from_millis(max_millis: i64) -> Self {
        Self {
            start: Instant::now(),
            max: u64::try_from(max_millis).ok().map(Duration::from_millis),
        }
    }

    /// A budget measured from an earlier instant
    pub fn starting_at(start: Instant, max: Option<Duration>) -> Self {
        Self { start, max }
    }

    pub fn is_bounded(&self) -> bool {
        self.max.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        match self.max {
            Some(max) => self.elapsed() >= max,
            None => false,
        }
    }

    /// Fail with `BuildTimeout` once the elapsed time reaches the budget
    pub fn check(&self, shape: &str) -> Result<(), ShapeBuildFailure> {
        let Some(max) = self.max else {
            return Ok(());
        };
        let elapsed = self.elapsed();
        if elapsed >= max {
            log::info!(
                "building {} exceeded its time budget ({} ms of {} ms)",
                shape,
                elapsed.as_millis(),
                max.as_millis()
            );
            return Err(ShapeBuildFailure::timeout(shape, elapsed.as_millis(), max.as_millis()));
        }
        Ok(())
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Counts partial assignments generated by the exhaustive search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    generated: u64,
    cutoff: u64,
}

impl SearchBudget {
    pub fn new(cutoff: u64) -> Self {
        Self { generated: 0, cutoff }
    }

    /// Record one more partial assignment; false once the cutoff is passed
    pub fn spend(&mut self) -> bool {
        self.generated += 1;
        self.generated <= self.cutoff
    }

    pub fn generated(&self) -> u64 {
        self.generated
    }

    pub fn cutoff(&self) -> u64 {
        self.cutoff
    }

    pub fn is_exhausted(&self) -> bool {
        self.generated > self.cutoff
    }
}
