//! Test fixtures for deletion workflows.

use std::num::NonZeroU32;
use std::time::Duration;

use migrator_compute::ResourceLocator;
use migrator_config::{DiskDeletionConfig, DiskRateLimit, OperationPolling};

/// Project used by the sample locators.
pub const SAMPLE_PROJECT: &str = "migration-project";
/// Zone used by the sample locators.
pub const SAMPLE_ZONE: &str = "us-central1-a";
/// Instance used by the sample locators.
pub const SAMPLE_INSTANCE: &str = "vm-1";

/// Locator for the sample instance.
#[must_use]
pub fn sample_instance() -> ResourceLocator {
    ResourceLocator::new(SAMPLE_PROJECT, SAMPLE_ZONE, SAMPLE_INSTANCE)
}

/// Locator for a disk next to the sample instance.
#[must_use]
pub fn sample_disk(name: &str) -> ResourceLocator {
    sample_instance().sibling(name)
}

/// Configuration with a generous rate limit and millisecond polling.
#[must_use]
pub fn fast_config() -> DiskDeletionConfig {
    DiskDeletionConfig {
        rate_limit: rate_limit(1_000, Duration::from_secs(60)),
        polling: OperationPolling {
            interval: Duration::from_millis(5),
            timeout: None,
        },
    }
}

/// Rate limit of `max_count` per `period`; zero is clamped to one.
#[must_use]
pub fn rate_limit(max_count: u32, period: Duration) -> DiskRateLimit {
    DiskRateLimit::new(NonZeroU32::new(max_count).unwrap_or(NonZeroU32::MIN), period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_disk_shares_instance_project_and_zone() {
        let disk = sample_disk("disk-1");
        assert_eq!(disk.project, SAMPLE_PROJECT);
        assert_eq!(disk.zone, SAMPLE_ZONE);
        assert_eq!(disk.name, "disk-1");
    }

    #[test]
    fn rate_limit_clamps_zero() {
        assert_eq!(rate_limit(0, Duration::from_secs(1)).max_count.get(), 1);
    }
}
