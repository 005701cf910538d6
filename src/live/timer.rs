// Cancellable countdown deadline used for hysteresis and unlock delays

use std::time::{Duration, Instant};

/// Single countdown deadline with start, cancel, and poll
///
/// Expiry is always evaluated against a caller-supplied instant so the
/// orchestrator stays deterministic under test.
#[derive(Debug, Default)]
pub struct DelayTimer {
    deadline: Option<Instant>,
}

impl DelayTimer {
    /// Create a timer with no deadline set
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the countdown relative to `now`
    pub fn start(&mut self, now: Instant, duration: Duration) {
        self.deadline = Some(now + duration);
    }

    /// Cancel any active countdown
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a countdown is currently armed
    pub fn armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check for expiry; returns true at most once per started countdown
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
