//! Provider trait implemented by compute API adapters.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ComputeResult;
use crate::model::{
    BackupArtifactRecord, DiskRecord, OperationHandle, OperationStatus, ResourceLocator,
};

/// Compute API surface consumed by the disk deletion coordinator.
///
/// Implementations must report absent resources as [`ComputeError::NotFound`]
/// so callers can tell "gone" apart from genuine faults.
///
/// [`ComputeError::NotFound`]: crate::ComputeError::NotFound
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Fetch the machine image taken from `instance_name`.
    async fn get_machine_image(
        &self,
        project: &str,
        instance_name: &str,
    ) -> ComputeResult<BackupArtifactRecord>;

    /// Fetch a disk by locator.
    async fn get_disk(&self, disk: &ResourceLocator) -> ComputeResult<DiskRecord>;

    /// Start deleting a disk; returns as soon as the provider accepted the request.
    async fn delete_disk(&self, disk: &ResourceLocator) -> ComputeResult<OperationHandle>;

    /// Read the current status of a zonal operation.
    async fn get_zonal_operation(
        &self,
        project: &str,
        zone: &str,
        operation: &str,
    ) -> ComputeResult<OperationStatus>;
}

/// Shared reference to the compute backend.
pub type SharedCompute = Arc<dyn ComputeProvider>;
