//! Issues the destructive delete call.

use migrator_compute::{OperationHandle, ResourceLocator, SharedCompute};
use tracing::info;

use crate::error::{DiskError, DiskResult};

/// Sends delete requests to the provider. Callers are expected to hold a
/// rate-limit slot and a passed backup check before calling in.
#[derive(Clone)]
pub struct DeletionExecutor {
    compute: SharedCompute,
}

impl DeletionExecutor {
    /// Construct an executor over the shared compute backend.
    #[must_use]
    pub const fn new(compute: SharedCompute) -> Self {
        Self { compute }
    }

    /// Request deletion of `disk` and return the operation to poll.
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::TransientProviderFault`] when the provider rejects
    /// the request.
    pub async fn issue_delete(&self, disk: &ResourceLocator) -> DiskResult<OperationHandle> {
        let handle = self
            .compute
            .delete_disk(disk)
            .await
            .map_err(|err| DiskError::provider("delete_disk", err))?;
        info!(disk = %disk, operation = %handle.name, "disk delete requested");
        Ok(handle)
    }
}
