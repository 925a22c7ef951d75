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

//! Configuration for the disk deletion coordinator.
//!
//! Layout: `model.rs` (typed config and loaders), `validate.rs`
//! (parsing helpers for env values and JSON documents), `defaults.rs`
//! (default limits and environment keys).

mod defaults;
pub mod error;
pub mod model;
mod validate;

pub use defaults::{
    ENV_OPERATION_POLL_INTERVAL_MS, ENV_OPERATION_TIMEOUT_SECS, ENV_RATE_LIMIT_MAX,
    ENV_RATE_LIMIT_PERIOD_SECS,
};
pub use error::{ConfigError, ConfigResult};
pub use model::{DiskDeletionConfig, DiskRateLimit, OperationPolling};
