//! # Design
//!
//! - Separate "refused to act" (`PreconditionNotMet`) from "acted and failed".
//! - Carry the provider's `ComputeError` untouched so callers keep its classification.
//! - Keep messages constant; identifiers travel as fields.

use std::time::Duration;

use migrator_compute::{ComputeError, ResourceLocator};
use thiserror::Error;

/// Result type for disk deletion workflows.
pub type DiskResult<T> = Result<T, DiskError>;

/// Why an issued delete operation did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationFailure {
    /// The provider finished the operation with an error payload.
    #[error("provider reported operation failure")]
    Provider {
        /// Provider error code.
        code: String,
        /// Provider error message.
        message: String,
    },
    /// The configured wait deadline passed before the operation finished.
    #[error("operation wait timed out")]
    Timeout {
        /// Time spent polling before giving up.
        waited: Duration,
    },
}

/// Errors produced by the disk deletion coordinator.
#[derive(Debug, Error)]
pub enum DiskError {
    /// No machine image protects the instance; nothing was deleted.
    #[error("cannot delete disk: no protective backup exists")]
    PreconditionNotMet {
        /// Instance whose machine image was missing.
        instance: ResourceLocator,
        /// Disk that was left untouched.
        disk_name: String,
    },
    /// The delete operation was issued but did not complete successfully.
    #[error("disk delete operation failed")]
    OperationFailed {
        /// Disk targeted by the operation.
        disk_name: String,
        /// Provider operation name.
        operation: String,
        /// Failure observed while waiting.
        #[source]
        reason: OperationFailure,
    },
    /// A provider call failed (network, auth, quota, malformed response).
    #[error("compute provider call failed")]
    TransientProviderFault {
        /// Provider call that failed.
        call: &'static str,
        /// Fault as classified by the provider.
        #[source]
        source: ComputeError,
    },
    /// A concurrently scheduled deletion task panicked or was aborted.
    #[error("disk deletion task did not complete")]
    TaskJoin {
        /// Disk the task was deleting.
        disk_name: String,
        /// Underlying join failure.
        #[source]
        source: tokio::task::JoinError,
    },
}

impl DiskError {
    pub(crate) const fn provider(call: &'static str, source: ComputeError) -> Self {
        Self::TransientProviderFault { call, source }
    }

    /// Stable label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PreconditionNotMet { .. } => "precondition_not_met",
            Self::OperationFailed { .. } => "operation_failed",
            Self::TransientProviderFault { .. } => "provider_fault",
            Self::TaskJoin { .. } => "task_join",
        }
    }

    /// Provider fault carried by this error, if any.
    #[must_use]
    pub const fn provider_error(&self) -> Option<&ComputeError> {
        match self {
            Self::TransientProviderFault { source, .. } => Some(source),
            _ => None,
        }
    }
}
