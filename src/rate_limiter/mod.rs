//! Sliding-window submission limiter keyed by client (IP or fingerprint).

mod error;
pub mod service;

pub use error::*;
pub use service::*;

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_attempts: u32,
    pub window_secs: i64,
    /// Upper bound on keys held in memory.
    pub max_tracked_keys: usize,
    /// Run a full stale-key sweep every this many checks.
    pub sweep_interval: u32,
}

impl RateLimitConfig {
    /// Saturates instead of panicking on windows `TimeDelta` cannot hold.
    pub fn window(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.window_secs).unwrap_or(TimeDelta::MAX)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            window_secs: 3600,
            max_tracked_keys: 10_000,
            sweep_interval: 256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied { retry_after: TimeDelta },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

/// Attempt history per key. Not thread-safe on its own; share it through
/// [`RateLimitService`].
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    attempts: HashMap<String, VecDeque<DateTime<Utc>>>,
    checks_since_sweep: u32,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            attempts: HashMap::new(),
            checks_since_sweep: 0,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admits the attempt iff fewer than `max_attempts` attempts for `key`
    /// fall inside `(now - window, now]`. Only admitted attempts are
    /// recorded.
    pub fn check_and_record(&mut self, key: &str, now: DateTime<Utc>) -> Admission {
        let window = self.config.window();
        let cutoff = self.cutoff(now);
        let max_attempts = self.config.max_attempts as usize;

        let timestamps = self.attempts.entry(key.to_string()).or_default();
        timestamps.retain(|at| *at > cutoff);

        let admission = if timestamps.len() < max_attempts {
            timestamps.push_back(now);
            Admission::Allowed
        } else {
            let oldest = timestamps.iter().min().copied().unwrap_or(now);
            Admission::Denied {
                retry_after: oldest
                    .checked_add_signed(window)
                    .map_or(window, |until| until - now)
                    .max(TimeDelta::zero()),
            }
        };

        let recorded = timestamps.len();
        if recorded == 0 {
            self.attempts.remove(key);
        }

        match admission {
            Admission::Allowed => debug!(key = %key, recorded, "Submission admitted"),
            Admission::Denied { retry_after } => warn!(
                key = %key,
                recorded,
                max_attempts,
                retry_after_secs = retry_after.num_seconds(),
                "Submission rate limited"
            ),
        }

        self.checks_since_sweep += 1;
        if self.checks_since_sweep >= self.config.sweep_interval
            || self.attempts.len() > self.config.max_tracked_keys
        {
            self.sweep(now);
        }

        admission
    }

    /// Start of the window ending at `now`, clamped to the earliest
    /// representable instant.
    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.config.window()).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Drops keys with no attempt inside the window, then, if still over
    /// the key bound, the keys whose latest attempt is oldest.
    pub fn sweep(&mut self, now: DateTime<Utc>) {
        let cutoff = self.cutoff(now);
        let before = self.attempts.len();
        self.attempts.retain(|_, timestamps| {
            timestamps.retain(|at| *at > cutoff);
            !timestamps.is_empty()
        });
        self.checks_since_sweep = 0;

        let overflow = self.attempts.len().saturating_sub(self.config.max_tracked_keys);
        if overflow > 0 {
            let mut by_recency: Vec<(DateTime<Utc>, String)> = self
                .attempts
                .iter()
                .map(|(key, timestamps)| {
                    let latest = timestamps.iter().max().copied().unwrap_or(cutoff);
                    (latest, key.clone())
                })
                .collect();
            by_recency.sort();
            for (_, key) in by_recency.into_iter().take(overflow) {
                self.attempts.remove(&key);
            }
            warn!(evicted = overflow, "Rate limiter over key bound, evicted least recent keys");
        }

        debug!(before, after = self.attempts.len(), "Rate limiter swept");
    }

    pub fn tracked_keys(&self) -> usize {
        self.attempts.len()
    }

    /// Attempts currently held for `key`, stale ones included until the
    /// next check or sweep.
    pub fn recorded(&self, key: &str) -> usize {
        self.attempts.get(key).map_or(0, VecDeque::len)
    }

    pub fn reset(&mut self, key: &str) {
        self.attempts.remove(key);
    }
}
