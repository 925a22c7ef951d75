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

//! Provider-agnostic compute interfaces and DTOs used by the migrator.
//!
//! Layout: `model` (locators, disk/image/operation records), `service`
//! (`ComputeProvider` trait), `error` (`ComputeError` classification).

pub mod error;
pub mod model;
pub mod service;

pub use error::{ComputeError, ComputeResult};
pub use model::{
    BackupArtifactRecord, DiskRecord, OperationError, OperationHandle, OperationStatus,
    ResourceLocator,
};
pub use service::{ComputeProvider, SharedCompute};
