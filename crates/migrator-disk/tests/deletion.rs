use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use migrator_compute::ComputeError;
use migrator_config::{DiskDeletionConfig, OperationPolling};
use migrator_disk::{
    DeletionOutcome, DiskDeletionOrchestrator, DiskDeletionRequest, DiskError, OperationFailure,
};
use migrator_telemetry::Metrics;
use migrator_test_support::fixtures::{fast_config, rate_limit, sample_disk, sample_instance};
use migrator_test_support::mocks::{FakeCall, FakeCompute, FakeFault};

fn orchestrator(
    fake: &Arc<FakeCompute>,
    config: &DiskDeletionConfig,
) -> Result<(DiskDeletionOrchestrator, Metrics)> {
    let metrics = Metrics::new()?;
    let orchestrator = DiskDeletionOrchestrator::from_config(fake.clone(), config, metrics.clone());
    Ok((orchestrator, metrics))
}

fn request(disk_name: &str) -> DiskDeletionRequest {
    DiskDeletionRequest::new(sample_instance(), disk_name)
}

fn protected_disks(names: &[&str]) -> FakeCompute {
    names.iter().fold(
        FakeCompute::new().with_machine_image(&sample_instance()),
        |fake, name| fake.with_disk(&sample_disk(name)),
    )
}

#[tokio::test]
async fn deletes_existing_disk_behind_machine_image() -> Result<()> {
    let fake = Arc::new(protected_disks(&["disk-1"]));
    let (orchestrator, metrics) = orchestrator(&fake, &fast_config())?;

    let outcome = orchestrator.delete(&request("disk-1")).await?;

    assert_eq!(outcome.disk_name(), "disk-1");
    assert_eq!(
        outcome,
        DeletionOutcome::Deleted {
            disk_name: "disk-1".to_string(),
            operation: "operation-1".to_string(),
        }
    );
    assert_eq!(
        fake.call_log(),
        vec![
            FakeCall::GetMachineImage,
            FakeCall::GetDisk,
            FakeCall::DeleteDisk,
            FakeCall::GetZonalOperation,
            FakeCall::GetZonalOperation,
        ]
    );
    assert!(!fake.has_disk(&sample_disk("disk-1")));
    assert_eq!(metrics.disk_deletions("deleted"), 1);
    assert_eq!(metrics.snapshot().operation_polls_total, 2);
    assert_eq!(metrics.snapshot().disk_deletions_in_flight, 0);
    Ok(())
}

#[tokio::test]
async fn absent_disk_is_a_no_op_success() -> Result<()> {
    let fake = Arc::new(FakeCompute::new().with_machine_image(&sample_instance()));
    let (orchestrator, metrics) = orchestrator(&fake, &fast_config())?;

    let outcome = orchestrator.delete(&request("disk-1")).await?;

    assert_eq!(
        outcome,
        DeletionOutcome::AlreadyAbsent {
            disk_name: "disk-1".to_string()
        }
    );
    assert_eq!(fake.call_log(), vec![FakeCall::GetMachineImage, FakeCall::GetDisk]);
    assert_eq!(fake.calls(FakeCall::DeleteDisk), 0);
    assert_eq!(metrics.disk_deletions("already_absent"), 1);
    Ok(())
}

#[tokio::test]
async fn missing_machine_image_blocks_every_destructive_call() -> Result<()> {
    let fake = Arc::new(FakeCompute::new().with_disk(&sample_disk("disk-1")));
    let (orchestrator, metrics) = orchestrator(&fake, &fast_config())?;

    let result = orchestrator.delete(&request("disk-1")).await;

    match result {
        Err(DiskError::PreconditionNotMet { instance, disk_name }) => {
            assert_eq!(instance, sample_instance());
            assert_eq!(disk_name, "disk-1");
        }
        other => panic!("expected precondition failure, got {other:?}"),
    }
    assert_eq!(fake.call_log(), vec![FakeCall::GetMachineImage]);
    assert!(fake.has_disk(&sample_disk("disk-1")));
    assert_eq!(metrics.disk_deletions("precondition_not_met"), 1);
    Ok(())
}

#[tokio::test]
async fn provider_faults_propagate_from_every_call() -> Result<()> {
    let cases = [
        (FakeCall::GetMachineImage, FakeFault::Transport, "get_machine_image"),
        (FakeCall::GetDisk, FakeFault::PermissionDenied, "get_disk"),
        (FakeCall::DeleteDisk, FakeFault::QuotaExceeded, "delete_disk"),
        (
            FakeCall::GetZonalOperation,
            FakeFault::MalformedResponse,
            "get_zonal_operation",
        ),
    ];

    for (call, fault, expected_call) in cases {
        let fake = Arc::new(protected_disks(&["disk-1"]).with_fault(call, fault));
        let (orchestrator, metrics) = orchestrator(&fake, &fast_config())?;

        let err = orchestrator
            .delete(&request("disk-1"))
            .await
            .expect_err("injected fault must surface");

        assert!(
            matches!(err, DiskError::TransientProviderFault { call, .. } if call == expected_call),
            "unexpected error for {expected_call}: {err:?}"
        );
        assert_eq!(fake.calls(call), 1, "{expected_call} must not be retried");
        assert_eq!(metrics.disk_deletions("provider_fault"), 1);
    }
    Ok(())
}

#[tokio::test]
async fn quota_fault_keeps_provider_classification() -> Result<()> {
    let fake = Arc::new(
        protected_disks(&["disk-1"]).with_fault(FakeCall::DeleteDisk, FakeFault::QuotaExceeded),
    );
    let (orchestrator, _metrics) = orchestrator(&fake, &fast_config())?;

    let err = orchestrator
        .delete(&request("disk-1"))
        .await
        .expect_err("quota fault must surface");
    assert!(matches!(
        err.provider_error(),
        Some(ComputeError::QuotaExceeded { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn failed_operation_surfaces_provider_error() -> Result<()> {
    let fake = Arc::new(
        protected_disks(&["disk-1"])
            .with_failing_operations("RESOURCE_IN_USE_BY_ANOTHER_RESOURCE", "disk is attached"),
    );
    let (orchestrator, metrics) = orchestrator(&fake, &fast_config())?;

    let err = orchestrator
        .delete(&request("disk-1"))
        .await
        .expect_err("operation failure must surface");

    match err {
        DiskError::OperationFailed {
            disk_name,
            operation,
            reason: OperationFailure::Provider { code, message },
        } => {
            assert_eq!(disk_name, "disk-1");
            assert_eq!(operation, "operation-1");
            assert_eq!(code, "RESOURCE_IN_USE_BY_ANOTHER_RESOURCE");
            assert_eq!(message, "disk is attached");
        }
        other => panic!("expected provider operation failure, got {other:?}"),
    }
    assert_eq!(fake.calls(FakeCall::DeleteDisk), 1);
    assert_eq!(metrics.disk_deletions("operation_failed"), 1);
    Ok(())
}

#[tokio::test]
async fn stuck_operation_times_out_when_deadline_configured() -> Result<()> {
    let fake = Arc::new(
        protected_disks(&["disk-1"])
            .with_operation_script(vec![migrator_compute::OperationStatus::Running]),
    );
    let config = DiskDeletionConfig {
        polling: OperationPolling {
            interval: Duration::from_millis(5),
            timeout: Some(Duration::from_millis(50)),
        },
        ..fast_config()
    };
    let (orchestrator, _metrics) = orchestrator(&fake, &config)?;

    let err = orchestrator
        .delete(&request("disk-1"))
        .await
        .expect_err("stuck operation must time out");

    assert!(matches!(
        err,
        DiskError::OperationFailed {
            reason: OperationFailure::Timeout { .. },
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn abandoned_delete_leaves_no_deletion_in_flight() -> Result<()> {
    let fake = Arc::new(
        protected_disks(&["disk-1"])
            .with_operation_script(vec![migrator_compute::OperationStatus::Running]),
    );
    let (orchestrator, metrics) = orchestrator(&fake, &fast_config())?;

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), orchestrator.delete(&request("disk-1")))
            .await;

    assert!(abandoned.is_err(), "operation never finishes without a deadline");
    assert_eq!(fake.calls(FakeCall::DeleteDisk), 1);
    assert_eq!(metrics.snapshot().disk_deletions_in_flight, 0);
    Ok(())
}

#[tokio::test]
async fn delete_all_returns_results_in_request_order() -> Result<()> {
    let fake = Arc::new(protected_disks(&["disk-1", "disk-3"]));
    let (orchestrator, metrics) = orchestrator(&fake, &fast_config())?;

    let results = orchestrator
        .delete_all(vec![request("disk-1"), request("disk-2"), request("disk-3")])
        .await;

    let names: Vec<_> = results
        .iter()
        .map(|result| result.as_ref().ok().map(DeletionOutcome::disk_name))
        .collect();
    assert_eq!(names, vec![Some("disk-1"), Some("disk-2"), Some("disk-3")]);
    assert!(matches!(results[1], Ok(DeletionOutcome::AlreadyAbsent { .. })));
    assert_eq!(fake.calls(FakeCall::DeleteDisk), 2);
    assert_eq!(metrics.disk_deletions("deleted"), 2);
    assert_eq!(metrics.disk_deletions("already_absent"), 1);
    Ok(())
}

#[tokio::test]
async fn delete_all_shares_one_rate_window() -> Result<()> {
    let names = ["disk-1", "disk-2", "disk-3", "disk-4", "disk-5"];
    let fake = Arc::new(protected_disks(&names));
    let period = Duration::from_millis(200);
    let config = DiskDeletionConfig {
        rate_limit: rate_limit(2, period),
        ..fast_config()
    };
    let (orchestrator, metrics) = orchestrator(&fake, &config)?;
    let started = Instant::now();

    let results = orchestrator
        .delete_all(names.iter().copied().map(request).collect())
        .await;

    assert!(results.iter().all(Result::is_ok));
    let first_window = fake
        .delete_instants()
        .iter()
        .filter(|at| at.duration_since(started) < period)
        .count();
    assert!(first_window <= 2, "{first_window} deletes in first window");
    assert!(started.elapsed() >= period * 2);
    assert!(metrics.snapshot().rate_limit_throttled_total >= 3);
    Ok(())
}
