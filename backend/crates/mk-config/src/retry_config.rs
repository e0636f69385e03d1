use crate::error::ensure_in_range;
use crate::{ConfigError, ConfigErrorResult};

use std::ops::RangeInclusive;

use serde::Deserialize;

const SECTION: &str = "retry";

pub const MAX_ATTEMPTS_RANGE: RangeInclusive<u32> = 1..=10;
pub const INITIAL_DELAY_MS_RANGE: RangeInclusive<u64> = 10..=10_000;
pub const MAX_DELAY_MS_RANGE: RangeInclusive<u64> = 100..=30_000;
pub const BACKOFF_MULTIPLIER_RANGE: RangeInclusive<f64> = 1.0..=10.0;

/// Longest time `connect` may spend sleeping between open attempts.
/// Counted at the top of the jitter band.
pub const CONNECT_BACKOFF_BUDGET_MS: u64 = 60_000;

/// Jitter scales each delay by a factor in 0.5..1.5
const JITTER_CEILING: f64 = 1.5;

/// How hard the dispatcher tries to open its upstream channel before
/// handing `ConnectionFailed` back to the caller.
///
/// The default makes one attempt. Only transient transport failures are
/// retried; a rejected channel fails on the first attempt regardless.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Open attempts, including the first
    pub max_attempts: u32,
    /// Pause after the first failed attempt
    pub initial_delay_ms: u64,
    /// Ceiling for any single pause
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 100,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// True when a failed open is reported without another attempt
    pub fn is_fail_fast(&self) -> bool {
        self.max_attempts <= 1
    }

    /// Pauses between consecutive open attempts, before jitter
    pub fn backoff_schedule_ms(&self) -> Vec<u64> {
        let retries = self.max_attempts.saturating_sub(1) as usize;
        let ceiling = self.max_delay_ms as f64;
        let mut delay = self.initial_delay_ms as f64;
        let mut schedule = Vec::with_capacity(retries);

        for _ in 0..retries {
            schedule.push(delay.round() as u64);
            delay = (delay * self.backoff_multiplier).min(ceiling);
        }
        schedule
    }

    /// Upper bound on the total time spent waiting between attempts
    pub fn worst_case_backoff_ms(&self) -> u64 {
        let total: u64 = self.backoff_schedule_ms().iter().sum();
        if self.jitter {
            (total as f64 * JITTER_CEILING).ceil() as u64
        } else {
            total
        }
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        ensure_in_range(SECTION, "max_attempts", self.max_attempts, MAX_ATTEMPTS_RANGE)?;
        ensure_in_range(
            SECTION,
            "initial_delay_ms",
            self.initial_delay_ms,
            INITIAL_DELAY_MS_RANGE,
        )?;
        ensure_in_range(SECTION, "max_delay_ms", self.max_delay_ms, MAX_DELAY_MS_RANGE)?;
        ensure_in_range(
            SECTION,
            "backoff_multiplier",
            self.backoff_multiplier,
            BACKOFF_MULTIPLIER_RANGE,
        )?;

        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ConfigError::invalid(
                SECTION,
                "max_delay_ms",
                format!(
                    "must not be below initial_delay_ms ({}), got {}",
                    self.initial_delay_ms, self.max_delay_ms
                ),
            ));
        }

        let worst_case = self.worst_case_backoff_ms();
        if worst_case > CONNECT_BACKOFF_BUDGET_MS {
            return Err(ConfigError::invalid(
                SECTION,
                "max_attempts",
                format!(
                    "{} attempts could wait {}ms before connect gives up, limit is {}ms",
                    self.max_attempts, worst_case, CONNECT_BACKOFF_BUDGET_MS
                ),
            ));
        }

        Ok(())
    }
}
