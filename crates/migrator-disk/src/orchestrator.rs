//! End-to-end disk deletion workflow.
//!
//! # Design
//! - Every workflow takes a slot from the shared limiter before touching the provider.
//! - A missing machine image aborts before any lookup or destructive call.
//! - A missing disk is a successful no-op and skips the operation wait.
//! - Failures are logged once here, tagged with the stage they came from, and
//!   returned unchanged. Nothing is retried.

use std::sync::Arc;

use migrator_compute::{ResourceLocator, SharedCompute};
use migrator_config::{DiskDeletionConfig, OperationPolling};
use migrator_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::error::{DiskError, DiskResult};
use crate::executor::DeletionExecutor;
use crate::guard::{BackupCheck, SafetyGuard};
use crate::lookup::{DiskLookup, ResourceLookup};
use crate::rate_limit::RateLimiter;
use crate::waiter::{OperationOutcome, OperationWaiter};

/// Disk to delete, addressed through the instance it was attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskDeletionRequest {
    /// Instance whose machine image must exist before deletion.
    pub instance: ResourceLocator,
    /// Disk name in the instance's project and zone.
    pub disk_name: String,
}

impl DiskDeletionRequest {
    /// Build a request for `disk_name` next to `instance`.
    #[must_use]
    pub fn new(instance: ResourceLocator, disk_name: impl Into<String>) -> Self {
        Self {
            instance,
            disk_name: disk_name.into(),
        }
    }

    /// Locator of the disk itself.
    #[must_use]
    pub fn disk(&self) -> ResourceLocator {
        self.instance.sibling(&self.disk_name)
    }
}

/// Successful result of a deletion workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeletionOutcome {
    /// The disk existed and its delete operation completed.
    Deleted {
        /// Deleted disk.
        disk_name: String,
        /// Provider operation that performed the delete.
        operation: String,
    },
    /// The disk was already gone; no delete was issued.
    AlreadyAbsent {
        /// Disk that was looked up.
        disk_name: String,
    },
}

impl DeletionOutcome {
    /// Name of the disk the workflow handled.
    #[must_use]
    pub fn disk_name(&self) -> &str {
        match self {
            Self::Deleted { disk_name, .. } | Self::AlreadyAbsent { disk_name } => disk_name,
        }
    }

    /// Metric label for this outcome.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Deleted { .. } => "deleted",
            Self::AlreadyAbsent { .. } => "already_absent",
        }
    }
}

/// Workflow stage, reported alongside failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStage {
    /// Waiting for a rate-limit slot.
    RateLimitWait,
    /// Checking for the protective machine image.
    GuardCheck,
    /// Looking up the disk.
    Lookup,
    /// Issuing the delete call.
    DeleteIssued,
    /// Polling the delete operation.
    WaitComplete,
}

impl DeletionStage {
    /// Stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimitWait => "rate_limit_wait",
            Self::GuardCheck => "guard_check",
            Self::Lookup => "lookup",
            Self::DeleteIssued => "delete_issued",
            Self::WaitComplete => "wait_complete",
        }
    }
}

/// Counts one admitted workflow in the in-flight gauge until dropped,
/// including when the caller abandons the `delete` future.
struct InFlight<'a> {
    metrics: &'a Metrics,
}

impl<'a> InFlight<'a> {
    fn enter(metrics: &'a Metrics) -> Self {
        metrics.deletion_started();
        Self { metrics }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.metrics.deletion_finished();
    }
}

/// Sequences limiter, guard, lookup, executor and waiter for each disk.
///
/// Clones share the same rate limiter and metrics registry.
#[derive(Clone)]
pub struct DiskDeletionOrchestrator {
    limiter: Arc<RateLimiter>,
    guard: SafetyGuard,
    lookup: ResourceLookup,
    executor: DeletionExecutor,
    waiter: OperationWaiter,
    metrics: Metrics,
}

impl DiskDeletionOrchestrator {
    /// Wire the workflow around an existing shared limiter.
    #[must_use]
    pub fn new(
        compute: SharedCompute,
        limiter: Arc<RateLimiter>,
        polling: OperationPolling,
        metrics: Metrics,
    ) -> Self {
        Self {
            limiter,
            guard: SafetyGuard::new(Arc::clone(&compute)),
            lookup: ResourceLookup::new(Arc::clone(&compute)),
            executor: DeletionExecutor::new(Arc::clone(&compute)),
            waiter: OperationWaiter::new(compute, polling).with_metrics(metrics.clone()),
            metrics,
        }
    }

    /// Build an orchestrator and its limiter from loaded configuration.
    #[must_use]
    pub fn from_config(
        compute: SharedCompute,
        config: &DiskDeletionConfig,
        metrics: Metrics,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit));
        Self::new(compute, limiter, config.polling, metrics)
    }

    /// Limiter shared by every workflow this orchestrator runs.
    #[must_use]
    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Delete one disk, returning the disk name on success or when it was
    /// already absent.
    ///
    /// # Errors
    ///
    /// - [`DiskError::PreconditionNotMet`] when no machine image protects the instance.
    /// - [`DiskError::OperationFailed`] when the delete operation fails or times out.
    /// - [`DiskError::TransientProviderFault`] for any provider fault.
    pub async fn delete(&self, request: &DiskDeletionRequest) -> DiskResult<DeletionOutcome> {
        let span = info_span!(
            "disk_delete",
            task_id = %Uuid::new_v4(),
            project = %request.instance.project,
            zone = %request.instance.zone,
            instance = %request.instance.name,
            disk = %request.disk_name,
        );

        async {
            let waited = self.limiter.acquire().await;
            self.metrics.observe_rate_limit_wait(waited);
            debug!(
                stage = DeletionStage::RateLimitWait.as_str(),
                waited = ?waited,
                "rate limit slot acquired"
            );
            let in_flight = InFlight::enter(&self.metrics);
            let mut stage = DeletionStage::GuardCheck;
            let result = self.run_admitted(request, &mut stage).await;
            drop(in_flight);

            match &result {
                Ok(outcome) => {
                    self.metrics.inc_disk_deletion(outcome.label());
                }
                Err(err @ DiskError::PreconditionNotMet { .. }) => {
                    self.metrics.inc_disk_deletion(err.kind());
                    warn!(
                        stage = stage.as_str(),
                        kind = err.kind(),
                        error = %err,
                        "disk deletion refused"
                    );
                }
                Err(err) => {
                    self.metrics.inc_disk_deletion(err.kind());
                    error!(
                        stage = stage.as_str(),
                        kind = err.kind(),
                        error = %err,
                        "disk deletion failed"
                    );
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_admitted(
        &self,
        request: &DiskDeletionRequest,
        stage: &mut DeletionStage,
    ) -> DiskResult<DeletionOutcome> {
        if self.guard.check(&request.instance).await? == BackupCheck::Absent {
            return Err(DiskError::PreconditionNotMet {
                instance: request.instance.clone(),
                disk_name: request.disk_name.clone(),
            });
        }

        *stage = DeletionStage::Lookup;
        let disk = request.disk();
        if self.lookup.get(&disk).await? == DiskLookup::NotPresent {
            info!("disk not found; nothing to delete");
            return Ok(DeletionOutcome::AlreadyAbsent {
                disk_name: request.disk_name.clone(),
            });
        }

        *stage = DeletionStage::DeleteIssued;
        let handle = self.executor.issue_delete(&disk).await?;

        *stage = DeletionStage::WaitComplete;
        match self.waiter.wait(&handle).await? {
            OperationOutcome::Completed => {
                info!(operation = %handle.name, "disk deleted");
                Ok(DeletionOutcome::Deleted {
                    disk_name: request.disk_name.clone(),
                    operation: handle.name,
                })
            }
            OperationOutcome::Failed(reason) => Err(DiskError::OperationFailed {
                disk_name: request.disk_name.clone(),
                operation: handle.name,
                reason,
            }),
        }
    }

    /// Run one workflow per request concurrently; results keep request order.
    ///
    /// All workflows share this orchestrator's rate limiter.
    pub async fn delete_all(
        &self,
        requests: Vec<DiskDeletionRequest>,
    ) -> Vec<DiskResult<DeletionOutcome>> {
        let tasks: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let orchestrator = self.clone();
                let disk_name = request.disk_name.clone();
                let task = tokio::spawn(async move { orchestrator.delete(&request).await });
                (disk_name, task)
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (disk_name, task) in tasks {
            results.push(match task.await {
                Ok(result) => result,
                Err(source) => Err(DiskError::TaskJoin { disk_name, source }),
            });
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrator_test_support::fixtures::{fast_config, sample_instance};
    use migrator_test_support::mocks::FakeCompute;

    #[test]
    fn request_derives_disk_locator_from_instance() {
        let request = DiskDeletionRequest::new(sample_instance(), "disk-1");
        let disk = request.disk();
        assert_eq!(disk.project, request.instance.project);
        assert_eq!(disk.zone, request.instance.zone);
        assert_eq!(disk.name, "disk-1");
    }

    #[test]
    fn request_deserializes_from_json() -> anyhow::Result<()> {
        let request: DiskDeletionRequest = serde_json::from_value(serde_json::json!({
            "instance": {"project": "p", "zone": "z", "name": "vm-1"},
            "disk_name": "disk-1"
        }))?;
        assert_eq!(request.disk().to_string(), "projects/p/zones/z/disk-1");
        Ok(())
    }

    #[test]
    fn outcome_exposes_disk_name_and_label() -> anyhow::Result<()> {
        let deleted = DeletionOutcome::Deleted {
            disk_name: "disk-1".to_string(),
            operation: "operation-1".to_string(),
        };
        let absent = DeletionOutcome::AlreadyAbsent {
            disk_name: "disk-2".to_string(),
        };
        assert_eq!(deleted.disk_name(), "disk-1");
        assert_eq!(absent.disk_name(), "disk-2");
        assert_eq!(deleted.label(), "deleted");
        assert_eq!(absent.label(), "already_absent");
        assert_eq!(serde_json::to_value(&absent)?["outcome"], "already_absent");
        Ok(())
    }

    #[test]
    fn stage_labels_are_stable() {
        assert_eq!(DeletionStage::RateLimitWait.as_str(), "rate_limit_wait");
        assert_eq!(DeletionStage::GuardCheck.as_str(), "guard_check");
        assert_eq!(DeletionStage::WaitComplete.as_str(), "wait_complete");
    }

    #[tokio::test]
    async fn clones_share_one_rate_limiter() -> anyhow::Result<()> {
        let orchestrator = DiskDeletionOrchestrator::from_config(
            Arc::new(FakeCompute::new()),
            &fast_config(),
            Metrics::new()?,
        );
        let clone = orchestrator.clone();
        assert!(Arc::ptr_eq(&orchestrator.rate_limiter(), &clone.rate_limiter()));
        assert_eq!(orchestrator.rate_limiter().config().max_count.get(), 1_000);
        Ok(())
    }
}
