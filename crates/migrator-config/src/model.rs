//! Typed configuration models for the deletion coordinator.

use std::num::NonZeroU32;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use crate::defaults::{
    ENV_OPERATION_POLL_INTERVAL_MS, ENV_OPERATION_TIMEOUT_SECS, ENV_RATE_LIMIT_MAX,
    ENV_RATE_LIMIT_PERIOD_SECS, POLL_INTERVAL_MS, RATE_LIMIT_MAX_COUNT, RATE_LIMIT_PERIOD_SECS,
};
use crate::error::{ConfigError, ConfigResult};
use crate::validate::{
    millis_field, parse_max_count, parse_positive_millis, parse_positive_secs, positive_u64_field,
    section,
};

/// Window-based limit applied to destructive disk calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskRateLimit {
    /// Maximum number of deletions admitted within any `period`.
    pub max_count: NonZeroU32,
    /// Length of the window.
    pub period: Duration,
}

impl DiskRateLimit {
    /// Construct a limit of `max_count` grants per `period`.
    #[must_use]
    pub const fn new(max_count: NonZeroU32, period: Duration) -> Self {
        Self { max_count, period }
    }

    /// Serialise the limit into a stable JSON representation.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "max_count": self.max_count.get(),
            "period_ms": whole_millis(self.period),
        })
    }
}

impl Default for DiskRateLimit {
    fn default() -> Self {
        Self {
            max_count: NonZeroU32::new(RATE_LIMIT_MAX_COUNT).unwrap_or(NonZeroU32::MIN),
            period: Duration::from_secs(RATE_LIMIT_PERIOD_SECS),
        }
    }
}

/// Polling cadence for asynchronous zonal operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationPolling {
    /// Delay between status polls.
    pub interval: Duration,
    /// Optional deadline for the whole wait; `None` waits until a terminal state.
    pub timeout: Option<Duration>,
}

impl OperationPolling {
    /// Serialise the polling cadence into a stable JSON representation.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "interval_ms": whole_millis(self.interval),
            "timeout_ms": self.timeout.map(whole_millis),
        })
    }
}

impl Default for OperationPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(POLL_INTERVAL_MS),
            timeout: None,
        }
    }
}

/// Milliseconds in `duration`, rounded up so a positive duration never serialises as zero.
fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

/// Complete coordinator configuration, fixed at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskDeletionConfig {
    /// Shared limit on disk deletions.
    pub rate_limit: DiskRateLimit,
    /// Operation polling cadence.
    pub polling: OperationPolling,
}

impl DiskDeletionConfig {
    /// Load configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a variable is set but does not
    /// hold a positive integer.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup; unset keys keep defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when a value is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_RATE_LIMIT_MAX) {
            config.rate_limit.max_count = parse_max_count("rate_limit.max_count", &raw)?;
        }
        if let Some(raw) = lookup(ENV_RATE_LIMIT_PERIOD_SECS) {
            config.rate_limit.period = parse_positive_secs("rate_limit.period_secs", &raw)?;
        }
        if let Some(raw) = lookup(ENV_OPERATION_POLL_INTERVAL_MS) {
            config.polling.interval = parse_positive_millis("polling.interval_ms", &raw)?;
        }
        if let Some(raw) = lookup(ENV_OPERATION_TIMEOUT_SECS) {
            config.polling.timeout = Some(parse_positive_secs("polling.timeout_secs", &raw)?);
        }

        debug!(
            max_count = config.rate_limit.max_count.get(),
            period = ?config.rate_limit.period,
            poll_interval = ?config.polling.interval,
            timeout = ?config.polling.timeout,
            "loaded disk deletion configuration"
        );
        Ok(config)
    }

    /// Parse configuration from a JSON document; absent sections keep defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when the document or one of its fields is malformed.
    pub fn from_json(document: &Value) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(rate_limit) = section(document, "rate_limit")? {
            if let Some(max_count) =
                positive_u64_field(rate_limit, "max_count", "rate_limit.max_count")?
            {
                let count = u32::try_from(max_count).map_err(|_| ConfigError::InvalidField {
                    field: "rate_limit.max_count",
                    reason: "out_of_range",
                    value: Some(max_count.to_string()),
                })?;
                config.rate_limit.max_count = NonZeroU32::new(count).unwrap_or(NonZeroU32::MIN);
            }
            if let Some(period) = millis_field(rate_limit, "period_ms", "rate_limit.period_ms")? {
                config.rate_limit.period = period;
            }
        }

        if let Some(polling) = section(document, "polling")? {
            if let Some(interval) = millis_field(polling, "interval_ms", "polling.interval_ms")? {
                config.polling.interval = interval;
            }
            config.polling.timeout = millis_field(polling, "timeout_ms", "polling.timeout_ms")?;
        }

        Ok(config)
    }

    /// Serialise the configuration into the document shape accepted by [`Self::from_json`].
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "rate_limit": self.rate_limit.to_json(),
            "polling": self.polling.to_json(),
        })
    }
}
