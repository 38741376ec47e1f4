//! Bounded retry with a fixed pause between attempts.
//!
//! Connect and request dispatch each get one retry by default. The policy is
//! a value so callers (and tests) can widen or disable it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{CONNECT_RETRY_DELAY, DEFAULT_MAX_ATTEMPTS, SEND_RETRY_DELAY};

/// Maximum attempts and the pause between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero behaves like one.
    pub max_attempts: u32,
    /// Pause before each retry, in microseconds.
    #[serde(rename = "delay_us", with = "duration_micros")]
    pub delay: Duration,
}

impl RetryPolicy {
    /// Policy with the given attempt budget and pause.
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Single attempt, never retried.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Default connect policy: one retry after 300 µs.
    #[must_use]
    pub const fn connect_default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, CONNECT_RETRY_DELAY)
    }

    /// Default request-send policy: one retry after 300 µs.
    #[must_use]
    pub const fn send_default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, SEND_RETRY_DELAY)
    }

    /// Run `op` until it succeeds, fails with an error `retryable` rejects,
    /// or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. The last error is returned
    /// when every attempt failed.
    pub fn run<T, E, F, R>(&self, label: &str, mut op: F, retryable: R) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut(u32) -> Result<T, E>,
        R: Fn(&E) -> bool,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && retryable(&e) => {
                    log::info!(
                        "[llhls] {label} failed (attempt {attempt}/{attempts}): {e}, retrying in {:?}",
                        self.delay
                    );
                    if !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::connect_default()
    }
}

mod duration_micros {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_micros() as u64)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_micros)
    }
}
