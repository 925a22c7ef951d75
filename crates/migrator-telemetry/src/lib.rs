#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Logging setup and Prometheus metrics for disk deletion workflows.
//!
//! Layout: `init.rs` (tracing subscriber), `error.rs` (`TelemetryError`),
//! and the [`Metrics`] registry below.

pub mod error;
pub mod init;

use std::sync::Arc;
use std::time::Duration;

use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};

/// Deletion metrics; clones share one registry.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    disk_deletions_total: IntCounterVec,
    disk_deletions_in_flight: IntGauge,
    rate_limit_wait_ms: IntGauge,
    rate_limit_throttled_total: IntCounter,
    operation_polls_total: IntCounter,
}

/// Point-in-time view of the scalar metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Deletions currently between rate-limit admission and completion.
    pub disk_deletions_in_flight: i64,
    /// Most recent rate-limit wait in milliseconds.
    pub rate_limit_wait_ms: i64,
    /// Acquisitions that had to wait for the window to open.
    pub rate_limit_throttled_total: u64,
    /// Zonal operation status polls issued.
    pub operation_polls_total: u64,
}

impl Metrics {
    /// Build a fresh registry with every deletion collector registered.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Collector`] if a collector cannot be created
    /// or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let disk_deletions_total = registered(
            &registry,
            "disk_deletions_total",
            IntCounterVec::new(
                Opts::new("disk_deletions_total", "Disk deletion workflows by outcome"),
                &["outcome"],
            ),
        )?;
        let disk_deletions_in_flight = registered(
            &registry,
            "disk_deletions_in_flight",
            IntGauge::new(
                "disk_deletions_in_flight",
                "Disk deletion workflows admitted by the rate limiter and not yet finished",
            ),
        )?;
        let rate_limit_wait_ms = registered(
            &registry,
            "disk_rate_limit_wait_ms",
            IntGauge::new(
                "disk_rate_limit_wait_ms",
                "Most recent wait for a disk deletion rate-limit slot in milliseconds",
            ),
        )?;
        let rate_limit_throttled_total = registered(
            &registry,
            "disk_rate_limit_throttled_total",
            IntCounter::new(
                "disk_rate_limit_throttled_total",
                "Disk deletions delayed by the rate limiter",
            ),
        )?;
        let operation_polls_total = registered(
            &registry,
            "zonal_operation_polls_total",
            IntCounter::new(
                "zonal_operation_polls_total",
                "Zonal operation status polls issued",
            ),
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                disk_deletions_total,
                disk_deletions_in_flight,
                rate_limit_wait_ms,
                rate_limit_throttled_total,
                operation_polls_total,
            }),
        })
    }

    /// Count a finished workflow under `outcome`.
    pub fn inc_disk_deletion(&self, outcome: &str) {
        self.inner
            .disk_deletions_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Workflows counted under `outcome` so far.
    #[must_use]
    pub fn disk_deletions(&self, outcome: &str) -> u64 {
        self.inner
            .disk_deletions_total
            .with_label_values(&[outcome])
            .get()
    }

    /// A workflow was admitted by the rate limiter.
    pub fn deletion_started(&self) {
        self.inner.disk_deletions_in_flight.inc();
    }

    /// An admitted workflow returned.
    pub fn deletion_finished(&self) {
        self.inner.disk_deletions_in_flight.dec();
    }

    /// Record a rate-limit wait; non-zero waits also count as throttled.
    pub fn observe_rate_limit_wait(&self, waited: Duration) {
        let millis = i64::try_from(waited.as_millis()).unwrap_or(i64::MAX);
        self.inner.rate_limit_wait_ms.set(millis);
        if !waited.is_zero() {
            self.inner.rate_limit_throttled_total.inc();
        }
    }

    /// Count one zonal operation status poll.
    pub fn inc_operation_poll(&self) {
        self.inner.operation_polls_total.inc();
    }

    /// Encode the registry in Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Render`] or [`TelemetryError::RenderUtf8`]
    /// when encoding fails.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.inner.registry.gather(), &mut buffer)
            .map_err(|source| TelemetryError::Render { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::RenderUtf8 { source })
    }

    /// Read the scalar metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            disk_deletions_in_flight: self.inner.disk_deletions_in_flight.get(),
            rate_limit_wait_ms: self.inner.rate_limit_wait_ms.get(),
            rate_limit_throttled_total: self.inner.rate_limit_throttled_total.get(),
            operation_polls_total: self.inner.operation_polls_total.get(),
        }
    }
}

fn registered<C>(
    registry: &Registry,
    name: &'static str,
    built: prometheus::Result<C>,
) -> Result<C>
where
    C: Collector + Clone + 'static,
{
    let collector = built.map_err(|source| TelemetryError::Collector { name, source })?;
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::Collector { name, source })?;
    Ok(collector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_output_names_every_collector() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_disk_deletion("deleted");
        metrics.inc_operation_poll();
        let rendered = metrics.render()?;
        for name in [
            "disk_deletions_total",
            "disk_deletions_in_flight",
            "disk_rate_limit_wait_ms",
            "disk_rate_limit_throttled_total",
            "zonal_operation_polls_total",
        ] {
            assert!(rendered.contains(name), "missing {name}");
        }
        assert_eq!(metrics.disk_deletions("deleted"), 1);
        assert_eq!(metrics.disk_deletions("already_absent"), 0);
        Ok(())
    }

    #[test]
    fn only_nonzero_waits_count_as_throttled() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.observe_rate_limit_wait(Duration::ZERO);
        metrics.observe_rate_limit_wait(Duration::from_millis(1_500));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rate_limit_wait_ms, 1_500);
        assert_eq!(snapshot.rate_limit_throttled_total, 1);
        Ok(())
    }

    #[test]
    fn clones_share_the_in_flight_gauge() -> Result<()> {
        let metrics = Metrics::new()?;
        let clone = metrics.clone();
        metrics.deletion_started();
        clone.deletion_started();
        metrics.deletion_finished();
        assert_eq!(clone.snapshot().disk_deletions_in_flight, 1);
        Ok(())
    }
}
