//! Machine image precondition checked before any disk is destroyed.
//!
//! # Design
//! - Re-read the image on every call; a cached answer could outlive the image.
//! - A missing image is an answer (`Absent`), not a provider fault.

use migrator_compute::{BackupArtifactRecord, ResourceLocator, SharedCompute};
use tracing::info;

use crate::error::{DiskError, DiskResult};

/// Whether a machine image protects the instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupCheck {
    /// A machine image of the instance exists.
    Present(BackupArtifactRecord),
    /// No machine image exists; deleting disks would lose data.
    Absent,
}

/// Verifies a recovery artifact exists before deletion is allowed.
#[derive(Clone)]
pub struct SafetyGuard {
    compute: SharedCompute,
}

impl SafetyGuard {
    /// Construct a guard over the shared compute backend.
    #[must_use]
    pub const fn new(compute: SharedCompute) -> Self {
        Self { compute }
    }

    /// Look up the machine image named after `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::TransientProviderFault`] for provider faults other
    /// than "not found".
    pub async fn check(&self, instance: &ResourceLocator) -> DiskResult<BackupCheck> {
        match self
            .compute
            .get_machine_image(&instance.project, &instance.name)
            .await
        {
            Ok(image) => {
                info!(
                    machine_image = %image.name,
                    status = image.status.as_deref().unwrap_or("unknown"),
                    "found machine image; disk can be deleted safely"
                );
                Ok(BackupCheck::Present(image))
            }
            Err(err) if err.is_not_found() => Ok(BackupCheck::Absent),
            Err(err) => Err(DiskError::provider("get_machine_image", err)),
        }
    }
}
