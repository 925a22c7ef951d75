//! Error types for compute provider calls.
//!
//! # Design
//! - Classify provider faults so callers can match on the failure class.
//! - Keep messages constant; identifiers travel as fields.
//! - `NotFound` is a classification, not a verdict: lookups decide whether it is fatal.

use std::error::Error;

use thiserror::Error;

/// Convenience alias for provider call results.
pub type ComputeResult<T> = Result<T, ComputeError>;

/// Faults reported by a compute provider.
#[derive(Debug, Error)]
pub enum ComputeError {
    /// The requested resource does not exist.
    #[error("compute resource not found")]
    NotFound {
        /// Resource kind (`disk`, `machine_image`, `operation`).
        resource: &'static str,
        /// Name of the missing resource.
        name: String,
    },
    /// Caller lacks permission for the call.
    #[error("compute permission denied")]
    PermissionDenied {
        /// Provider call that was rejected.
        operation: &'static str,
        /// Provider supplied detail.
        detail: String,
    },
    /// Resource is in a state that conflicts with the call (e.g. disk still attached).
    #[error("compute resource conflict")]
    Conflict {
        /// Provider call that was rejected.
        operation: &'static str,
        /// Provider supplied detail.
        detail: String,
    },
    /// Provider quota for the call was exhausted.
    #[error("compute quota exceeded")]
    QuotaExceeded {
        /// Provider call that was rejected.
        operation: &'static str,
        /// Provider supplied detail.
        detail: String,
    },
    /// Network or transport level failure.
    #[error("compute transport failure")]
    Transport {
        /// Provider call that failed.
        operation: &'static str,
        /// Underlying transport failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The provider answered with a payload that could not be interpreted.
    #[error("malformed compute response")]
    MalformedResponse {
        /// Provider call that produced the payload.
        operation: &'static str,
        /// Description of what was wrong with the payload.
        detail: String,
    },
}

impl ComputeError {
    /// Build a not-found classification for the given resource.
    #[must_use]
    pub fn not_found(resource: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            name: name.into(),
        }
    }

    /// Wrap a transport failure raised while executing `operation`.
    #[must_use]
    pub fn transport(
        operation: &'static str,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            operation,
            source: source.into(),
        }
    }

    /// Returns `true` when the provider reported the resource as absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Stable label for the fault class, suitable for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Conflict { .. } => "conflict",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::Transport { .. } => "transport",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }
}
