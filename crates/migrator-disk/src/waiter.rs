//! Polls zonal operations until they reach a terminal state.
//!
//! # Design
//! - First poll is immediate; later polls are spaced by the configured interval.
//! - With no timeout configured the waiter polls until the provider says `DONE`.
//! - A provider error payload on `DONE` is a failed outcome, not a provider fault.

use std::time::Duration;

use migrator_compute::{OperationHandle, OperationStatus, SharedCompute};
use migrator_config::OperationPolling;
use migrator_telemetry::Metrics;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::error::{DiskError, DiskResult, OperationFailure};

/// Terminal result of waiting on an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// The operation finished without error.
    Completed,
    /// The operation finished with an error or the wait deadline passed.
    Failed(OperationFailure),
}

/// Blocks the calling task until a zonal operation finishes.
#[derive(Clone)]
pub struct OperationWaiter {
    compute: SharedCompute,
    polling: OperationPolling,
    metrics: Option<Metrics>,
}

impl OperationWaiter {
    /// Construct a waiter with the given polling policy.
    #[must_use]
    pub const fn new(compute: SharedCompute, polling: OperationPolling) -> Self {
        Self {
            compute,
            polling,
            metrics: None,
        }
    }

    /// Count every status poll in `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Polling policy in effect.
    #[must_use]
    pub const fn polling(&self) -> OperationPolling {
        self.polling
    }

    /// Poll `handle` until it is `DONE` or the optional deadline passes.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::TransientProviderFault`] if a status poll fails.
    pub async fn wait(&self, handle: &OperationHandle) -> DiskResult<OperationOutcome> {
        let started = Instant::now();
        let mut polls: u32 = 0;

        loop {
            let status = self
                .compute
                .get_zonal_operation(&handle.project, &handle.zone, &handle.name)
                .await
                .map_err(|err| DiskError::provider("get_zonal_operation", err))?;
            polls = polls.saturating_add(1);
            if let Some(metrics) = &self.metrics {
                metrics.inc_operation_poll();
            }
            debug!(
                operation = %handle.name,
                poll = polls,
                status = ?status,
                "polled zonal operation"
            );

            match status {
                OperationStatus::Done { error: None } => return Ok(OperationOutcome::Completed),
                OperationStatus::Done { error: Some(error) } => {
                    return Ok(OperationOutcome::Failed(OperationFailure::Provider {
                        code: error.code,
                        message: error.message,
                    }));
                }
                OperationStatus::Pending | OperationStatus::Running => {}
            }

            let pause = match self.polling.timeout {
                Some(limit) => {
                    let waited = started.elapsed();
                    if waited >= limit {
                        return Ok(OperationOutcome::Failed(OperationFailure::Timeout { waited }));
                    }
                    self.polling.interval.min(limit - waited)
                }
                None => self.polling.interval,
            };
            sleep(pause.max(Duration::from_millis(1))).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrator_compute::{ComputeProvider, OperationError};
    use migrator_test_support::fixtures::sample_disk;
    use migrator_test_support::mocks::{FakeCall, FakeCompute, FakeFault};
    use std::sync::Arc;

    fn polling(timeout: Option<Duration>) -> OperationPolling {
        OperationPolling {
            interval: Duration::from_millis(5),
            timeout,
        }
    }

    async fn started(fake: FakeCompute) -> anyhow::Result<(Arc<FakeCompute>, OperationHandle)> {
        let disk = sample_disk("disk-1");
        let fake = Arc::new(fake.with_disk(&disk));
        let handle = fake.delete_disk(&disk).await?;
        Ok((fake, handle))
    }

    #[tokio::test]
    async fn completes_after_running_then_done() -> anyhow::Result<()> {
        let (fake, handle) = started(FakeCompute::new().with_operation_script(vec![
            OperationStatus::Pending,
            OperationStatus::Running,
            OperationStatus::done(),
        ]))
        .await?;
        let metrics = Metrics::new()?;
        let waiter = OperationWaiter::new(fake.clone(), polling(None)).with_metrics(metrics.clone());

        assert_eq!(waiter.wait(&handle).await?, OperationOutcome::Completed);
        assert_eq!(fake.calls(FakeCall::GetZonalOperation), 3);
        assert_eq!(metrics.snapshot().operation_polls_total, 3);
        Ok(())
    }

    #[tokio::test]
    async fn done_with_error_is_failed_outcome() -> anyhow::Result<()> {
        let (fake, handle) = started(FakeCompute::new().with_operation_script(vec![
            OperationStatus::Done {
                error: Some(OperationError {
                    code: "RESOURCE_IN_USE_BY_ANOTHER_RESOURCE".to_string(),
                    message: "disk is attached".to_string(),
                }),
            },
        ]))
        .await?;
        let waiter = OperationWaiter::new(fake, polling(None));

        let outcome = waiter.wait(&handle).await?;
        assert!(matches!(
            outcome,
            OperationOutcome::Failed(OperationFailure::Provider { ref code, .. })
                if code == "RESOURCE_IN_USE_BY_ANOTHER_RESOURCE"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn stuck_operation_times_out() -> anyhow::Result<()> {
        let (fake, handle) =
            started(FakeCompute::new().with_operation_script(vec![OperationStatus::Running]))
                .await?;
        let limit = Duration::from_millis(40);
        let waiter = OperationWaiter::new(fake.clone(), polling(Some(limit)));

        let outcome = waiter.wait(&handle).await?;
        assert!(matches!(
            outcome,
            OperationOutcome::Failed(OperationFailure::Timeout { waited }) if waited >= limit
        ));
        assert!(fake.calls(FakeCall::GetZonalOperation) >= 2);
        Ok(())
    }

    #[tokio::test]
    async fn poll_faults_propagate() -> anyhow::Result<()> {
        let (fake, handle) = started(
            FakeCompute::new().with_fault(FakeCall::GetZonalOperation, FakeFault::MalformedResponse),
        )
        .await?;
        let waiter = OperationWaiter::new(fake, polling(None));

        assert!(matches!(
            waiter.wait(&handle).await,
            Err(DiskError::TransientProviderFault {
                call: "get_zonal_operation",
                ..
            })
        ));
        Ok(())
    }
}
