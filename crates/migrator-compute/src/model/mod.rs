//! Core compute domain types shared across the workspace.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies a zonal resource (disk or instance) within a provider account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceLocator {
    /// Project that owns the resource.
    pub project: String,
    /// Zone the resource lives in.
    pub zone: String,
    /// Resource name, unique within the project and zone.
    pub name: String,
}

impl ResourceLocator {
    /// Construct a locator from its parts.
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        zone: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            zone: zone.into(),
            name: name.into(),
        }
    }

    /// Locator for a sibling resource in the same project and zone.
    #[must_use]
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self {
            project: self.project.clone(),
            zone: self.zone.clone(),
            name: name.into(),
        }
    }
}

impl Display for ResourceLocator {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "projects/{}/zones/{}/{}",
            self.project, self.zone, self.name
        )
    }
}

/// Snapshot of a disk as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskRecord {
    /// Disk name.
    pub name: String,
    /// Whether the provider still reports the disk as existing.
    pub exists: bool,
    /// Provisioned size when reported.
    #[serde(default)]
    pub size_gb: Option<u64>,
    /// Fully qualified provider URL when reported.
    #[serde(default)]
    pub self_link: Option<String>,
}

impl DiskRecord {
    /// Minimal record for an existing disk.
    #[must_use]
    pub fn existing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exists: true,
            size_gb: None,
            self_link: None,
        }
    }
}

/// Evidence that a machine image of an instance exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupArtifactRecord {
    /// Machine image name.
    pub name: String,
    /// Instance the image was taken from, when reported.
    #[serde(default)]
    pub source_instance: Option<String>,
    /// Provider status string (e.g. `READY`, `CREATING`).
    #[serde(default)]
    pub status: Option<String>,
    /// Creation time reported by the provider.
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

/// Handle to an asynchronous zonal operation started by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationHandle {
    /// Operation name used for polling.
    pub name: String,
    /// Project the operation runs in.
    pub project: String,
    /// Zone the operation is scoped to.
    pub zone: String,
}

/// Error payload attached to a finished operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// Provider error code (e.g. `RESOURCE_IN_USE_BY_ANOTHER_RESOURCE`).
    pub code: String,
    /// Human readable provider message.
    pub message: String,
}

/// Status of a zonal operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    /// Queued by the provider.
    Pending,
    /// In progress.
    Running,
    /// Terminal; carries the provider error when the operation failed.
    Done {
        /// Failure reported by the provider, if any.
        #[serde(default)]
        error: Option<OperationError>,
    },
}

impl OperationStatus {
    /// Terminal success.
    #[must_use]
    pub const fn done() -> Self {
        Self::Done { error: None }
    }

    /// Returns `true` once the provider reports `DONE`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn locator_display_is_resource_path() {
        let locator = ResourceLocator::new("project-a", "us-east1-b", "vm-1");
        assert_eq!(locator.to_string(), "projects/project-a/zones/us-east1-b/vm-1");
        let disk = locator.sibling("disk-1");
        assert_eq!(disk.project, "project-a");
        assert_eq!(disk.zone, "us-east1-b");
        assert_eq!(disk.name, "disk-1");
    }

    #[test]
    fn operation_status_parses_provider_payloads() -> anyhow::Result<()> {
        let running: OperationStatus = serde_json::from_value(json!({"status": "RUNNING"}))?;
        assert_eq!(running, OperationStatus::Running);
        assert!(!running.is_terminal());

        let failed: OperationStatus = serde_json::from_value(json!({
            "status": "DONE",
            "error": {"code": "RESOURCE_IN_USE_BY_ANOTHER_RESOURCE", "message": "attached"}
        }))?;
        assert!(failed.is_terminal());
        assert!(matches!(failed, OperationStatus::Done { error: Some(_) }));

        let done: OperationStatus = serde_json::from_value(json!({"status": "DONE"}))?;
        assert_eq!(done, OperationStatus::done());
        Ok(())
    }
}
