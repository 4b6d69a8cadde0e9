//! Jittered exponential backoff for worker retry loops.
//!
//! Spec §7 says a Transient failure just waits for the next tick interval;
//! in practice that tick interval *is* the retry delay, but if the interval
//! is short (e.g. a 10s health tick hammering a down index) we still want to
//! back off rather than retry every 10 seconds forever. `Backoff` is used to
//! lengthen the wait between consecutive failed ticks and is reset on the
//! first success.

use rand::Rng;
use std::{cmp, time::Duration};

#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            failures: 0,
        }
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Returns the delay to wait before the next retry and records a failure.
    pub fn fail(&mut self, rng: &mut impl Rng) -> Duration {
        // https://aws.amazon.com/blogs/architecture/exponential-backoff-and-jitter/
        let factor = 2u32.checked_pow(self.failures).unwrap_or(u32::MAX);
        self.failures += 1;
        let jitter = rng.gen::<f32>();
        let backoff = self.initial.checked_mul(factor).unwrap_or(self.max);
        cmp::min(backoff, self.max).mul_f32(jitter)
    }
}
