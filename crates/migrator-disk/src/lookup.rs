//! Point lookups for disks about to be deleted.

use migrator_compute::{DiskRecord, ResourceLocator, SharedCompute};

use crate::error::{DiskError, DiskResult};

/// Result of a disk lookup; absence is an expected answer, not a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskLookup {
    /// The disk exists.
    Found(DiskRecord),
    /// The provider has no such disk.
    NotPresent,
}

/// Reads current disk state from the provider.
#[derive(Clone)]
pub struct ResourceLookup {
    compute: SharedCompute,
}

impl ResourceLookup {
    /// Construct a lookup over the shared compute backend.
    #[must_use]
    pub const fn new(compute: SharedCompute) -> Self {
        Self { compute }
    }

    /// Fetch the disk; provider "not found" becomes [`DiskLookup::NotPresent`].
    ///
    /// # Errors
    ///
    /// Returns [`DiskError::TransientProviderFault`] for every other provider fault.
    pub async fn get(&self, disk: &ResourceLocator) -> DiskResult<DiskLookup> {
        match self.compute.get_disk(disk).await {
            Ok(record) if record.exists => Ok(DiskLookup::Found(record)),
            Ok(_) => Ok(DiskLookup::NotPresent),
            Err(err) if err.is_not_found() => Ok(DiskLookup::NotPresent),
            Err(err) => Err(DiskError::provider("get_disk", err)),
        }
    }
}
