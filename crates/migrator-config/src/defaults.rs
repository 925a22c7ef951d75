//! Default limits and environment keys for the deletion coordinator.
//!
//! # Design
//! - The rate limit default matches the provider's disk-delete quota headroom.
//! - Keep environment keys public so deployment tooling can reference them.

/// Maximum disk deletions admitted per window.
pub(crate) const RATE_LIMIT_MAX_COUNT: u32 = 2_000;
/// Length of the rate-limit window in seconds.
pub(crate) const RATE_LIMIT_PERIOD_SECS: u64 = 100;
/// Delay between zonal operation polls in milliseconds.
pub(crate) const POLL_INTERVAL_MS: u64 = 2_000;
/// Upper bound for every configured duration (31 days).
pub(crate) const MAX_DURATION_SECS: u64 = 31 * 24 * 60 * 60;

/// Environment key overriding the per-window deletion budget.
pub const ENV_RATE_LIMIT_MAX: &str = "MIGRATOR_DISK_RATE_LIMIT_MAX";
/// Environment key overriding the rate-limit window length (seconds).
pub const ENV_RATE_LIMIT_PERIOD_SECS: &str = "MIGRATOR_DISK_RATE_LIMIT_PERIOD_SECS";
/// Environment key overriding the operation poll interval (milliseconds).
pub const ENV_OPERATION_POLL_INTERVAL_MS: &str = "MIGRATOR_OPERATION_POLL_INTERVAL_MS";
/// Environment key enabling an operation wait deadline (seconds).
pub const ENV_OPERATION_TIMEOUT_SECS: &str = "MIGRATOR_OPERATION_TIMEOUT_SECS";
