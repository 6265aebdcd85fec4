//! Explicit retry policy for provider I/O.
//!
//! Bounded exponential backoff with uniform jitter. Wraps only the network
//! edge; the computation stages never retry because they perform no I/O.

use rand::Rng;
use std::time::Duration;

/// Retry policy: `max_attempts` tries, delay doubling from `base_delay` and
/// capped at `max_delay`, each sleep jittered uniformly in [0.5x, 1.5x].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Backoff before attempt `attempt` (1-based; attempt 1 has no backoff).
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exp = self.base_delay.saturating_mul(1u32 << (attempt - 2).min(16));
        let capped = exp.min(self.max_delay);
        let jitter = rand::thread_rng().gen_range(0.5..1.5);
        capped.mul_f64(jitter)
    }

    /// Run `op` up to `max_attempts` times, sleeping the jittered backoff
    /// between attempts. Returns the last error if every attempt fails.
    pub fn run<T, E>(&self, mut op: impl FnMut() -> Result<T, E>) -> Result<T, (u32, E)> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let pause = self.backoff(attempt);
            if !pause.is_zero() {
                std::thread::sleep(pause);
            }
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= attempts => return Err((attempts, e)),
                Err(_) => attempt += 1,
            }
        }
    }
}
