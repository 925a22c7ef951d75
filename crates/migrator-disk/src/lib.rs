//! Rate-limited, backup-guarded deletion of migrated VM disks.
#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Layout: `rate_limit.rs` (shared window limiter), `guard.rs` (machine image
//! precondition), `lookup.rs` (disk existence), `executor.rs` (destructive call),
//! `waiter.rs` (zonal operation polling), `orchestrator.rs` (end-to-end workflow).

pub mod error;
pub mod executor;
pub mod guard;
pub mod lookup;
pub mod orchestrator;
pub mod rate_limit;
pub mod waiter;

pub use error::{DiskError, DiskResult, OperationFailure};
pub use executor::DeletionExecutor;
pub use guard::{BackupCheck, SafetyGuard};
pub use lookup::{DiskLookup, ResourceLookup};
pub use orchestrator::{
    DeletionOutcome, DeletionStage, DiskDeletionOrchestrator, DiskDeletionRequest,
};
pub use rate_limit::RateLimiter;
pub use waiter::{OperationOutcome, OperationWaiter};
