#![forbid(unsafe_code)]

//! Fixed pause between consecutive remote calls of one stage.

use std::thread;
use std::time::Duration;

pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Sleeps `delay` before every call except the first one it gates.
#[derive(Debug, Clone)]
pub struct Pacer {
    delay: Duration,
    calls: usize,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, calls: 0 }
    }

    /// Call right before issuing a remote request.
    pub fn before_call(&mut self) {
        if self.calls > 0 && !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.calls += 1;
    }

    /// Number of calls gated so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}
