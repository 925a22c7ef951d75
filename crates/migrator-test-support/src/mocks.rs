//! In-memory compute provider that records every call.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use migrator_compute::{
    BackupArtifactRecord, ComputeError, ComputeProvider, ComputeResult, DiskRecord,
    OperationError, OperationHandle, OperationStatus, ResourceLocator,
};

/// Provider calls observed by [`FakeCompute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeCall {
    /// `get_machine_image`.
    GetMachineImage,
    /// `get_disk`.
    GetDisk,
    /// `delete_disk`.
    DeleteDisk,
    /// `get_zonal_operation`.
    GetZonalOperation,
}

impl FakeCall {
    const fn operation(self) -> &'static str {
        match self {
            Self::GetMachineImage => "get_machine_image",
            Self::GetDisk => "get_disk",
            Self::DeleteDisk => "delete_disk",
            Self::GetZonalOperation => "get_zonal_operation",
        }
    }
}

/// Fault classes the fake can inject into a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFault {
    /// [`ComputeError::PermissionDenied`].
    PermissionDenied,
    /// [`ComputeError::Conflict`].
    Conflict,
    /// [`ComputeError::QuotaExceeded`].
    QuotaExceeded,
    /// [`ComputeError::Transport`].
    Transport,
    /// [`ComputeError::MalformedResponse`].
    MalformedResponse,
}

impl FakeFault {
    fn into_error(self, call: FakeCall) -> ComputeError {
        let operation = call.operation();
        let detail = format!("injected {self:?} for {operation}");
        match self {
            Self::PermissionDenied => ComputeError::PermissionDenied { operation, detail },
            Self::Conflict => ComputeError::Conflict { operation, detail },
            Self::QuotaExceeded => ComputeError::QuotaExceeded { operation, detail },
            Self::Transport => ComputeError::transport(operation, detail),
            Self::MalformedResponse => ComputeError::MalformedResponse { operation, detail },
        }
    }
}

#[derive(Default)]
struct FakeState {
    images: HashMap<(String, String), BackupArtifactRecord>,
    disks: HashMap<ResourceLocator, DiskRecord>,
    operation_script: Vec<OperationStatus>,
    operations: HashMap<String, VecDeque<OperationStatus>>,
    faults: HashMap<FakeCall, FakeFault>,
    calls: Vec<FakeCall>,
    deleted: Vec<ResourceLocator>,
    delete_instants: Vec<Instant>,
    next_operation: u64,
}

/// Recording [`ComputeProvider`] backed by in-memory maps.
///
/// Deleting a disk removes it immediately and starts an operation that walks
/// through the configured status script (`RUNNING`, then `DONE` by default).
/// The last scripted status repeats once the script is exhausted.
#[derive(Default)]
pub struct FakeCompute {
    state: Mutex<FakeState>,
}

impl FakeCompute {
    /// Empty provider: no images, no disks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a machine image named after `instance`.
    #[must_use]
    pub fn with_machine_image(mut self, instance: &ResourceLocator) -> Self {
        let record = BackupArtifactRecord {
            name: instance.name.clone(),
            source_instance: Some(instance.to_string()),
            status: Some("READY".to_string()),
            creation_timestamp: Some(Utc::now()),
        };
        self.state_mut()
            .images
            .insert((instance.project.clone(), instance.name.clone()), record);
        self
    }

    /// Register an existing disk.
    #[must_use]
    pub fn with_disk(mut self, disk: &ResourceLocator) -> Self {
        self.state_mut()
            .disks
            .insert(disk.clone(), DiskRecord::existing(disk.name.clone()));
        self
    }

    /// Register a disk the provider still reports, but with `exists == false`.
    #[must_use]
    pub fn with_tombstoned_disk(mut self, disk: &ResourceLocator) -> Self {
        let record = DiskRecord {
            exists: false,
            ..DiskRecord::existing(disk.name.clone())
        };
        self.state_mut().disks.insert(disk.clone(), record);
        self
    }

    /// Replace the status sequence every new delete operation walks through.
    #[must_use]
    pub fn with_operation_script(mut self, script: Vec<OperationStatus>) -> Self {
        self.state_mut().operation_script = script;
        self
    }

    /// Make every delete operation finish with a provider error.
    #[must_use]
    pub fn with_failing_operations(self, code: &str, message: &str) -> Self {
        self.with_operation_script(vec![
            OperationStatus::Running,
            OperationStatus::Done {
                error: Some(OperationError {
                    code: code.to_string(),
                    message: message.to_string(),
                }),
            },
        ])
    }

    /// Inject a fault into every invocation of `call`.
    #[must_use]
    pub fn with_fault(mut self, call: FakeCall, fault: FakeFault) -> Self {
        self.state_mut().faults.insert(call, fault);
        self
    }

    /// Number of times `call` was invoked.
    #[must_use]
    pub fn calls(&self, call: FakeCall) -> usize {
        self.lock().calls.iter().filter(|seen| **seen == call).count()
    }

    /// Every call in invocation order.
    #[must_use]
    pub fn call_log(&self) -> Vec<FakeCall> {
        self.lock().calls.clone()
    }

    /// Disks passed to `delete_disk`, in order.
    #[must_use]
    pub fn deleted_disks(&self) -> Vec<ResourceLocator> {
        self.lock().deleted.clone()
    }

    /// When each `delete_disk` call was accepted.
    #[must_use]
    pub fn delete_instants(&self) -> Vec<Instant> {
        self.lock().delete_instants.clone()
    }

    /// Whether the disk is still present.
    #[must_use]
    pub fn has_disk(&self, disk: &ResourceLocator) -> bool {
        self.lock().disks.contains_key(disk)
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut FakeState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(state: &mut FakeState, call: FakeCall) -> ComputeResult<()> {
        state.calls.push(call);
        match state.faults.get(&call) {
            Some(fault) => Err(fault.into_error(call)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ComputeProvider for FakeCompute {
    async fn get_machine_image(
        &self,
        project: &str,
        instance_name: &str,
    ) -> ComputeResult<BackupArtifactRecord> {
        let mut state = self.lock();
        Self::record(&mut state, FakeCall::GetMachineImage)?;
        state
            .images
            .get(&(project.to_string(), instance_name.to_string()))
            .cloned()
            .ok_or_else(|| ComputeError::not_found("machine_image", instance_name))
    }

    async fn get_disk(&self, disk: &ResourceLocator) -> ComputeResult<DiskRecord> {
        let mut state = self.lock();
        Self::record(&mut state, FakeCall::GetDisk)?;
        state
            .disks
            .get(disk)
            .cloned()
            .ok_or_else(|| ComputeError::not_found("disk", disk.name.clone()))
    }

    async fn delete_disk(&self, disk: &ResourceLocator) -> ComputeResult<OperationHandle> {
        let mut state = self.lock();
        Self::record(&mut state, FakeCall::DeleteDisk)?;
        if state.disks.remove(disk).is_none() {
            return Err(ComputeError::not_found("disk", disk.name.clone()));
        }
        state.deleted.push(disk.clone());
        state.delete_instants.push(Instant::now());

        state.next_operation += 1;
        let name = format!("operation-{}", state.next_operation);
        let script = if state.operation_script.is_empty() {
            vec![OperationStatus::Running, OperationStatus::done()]
        } else {
            state.operation_script.clone()
        };
        state.operations.insert(name.clone(), script.into());

        Ok(OperationHandle {
            name,
            project: disk.project.clone(),
            zone: disk.zone.clone(),
        })
    }

    async fn get_zonal_operation(
        &self,
        _project: &str,
        _zone: &str,
        operation: &str,
    ) -> ComputeResult<OperationStatus> {
        let mut state = self.lock();
        Self::record(&mut state, FakeCall::GetZonalOperation)?;
        let queue = state
            .operations
            .get_mut(operation)
            .ok_or_else(|| ComputeError::not_found("operation", operation))?;
        let status = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        status.ok_or_else(|| ComputeError::MalformedResponse {
            operation: "get_zonal_operation",
            detail: "empty operation script".to_string(),
        })
    }
}
