//! Error types for configuration loading.

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a deletion configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable or document field held an unusable value.
    #[error("configuration field rejected")]
    InvalidField {
        /// Dotted field path (e.g. `rate_limit.max_count`).
        field: &'static str,
        /// Short reason code (`not_an_integer`, `must_be_positive`, `out_of_range`).
        reason: &'static str,
        /// Raw value as supplied.
        value: Option<String>,
    },
    /// A JSON document or section was not an object.
    #[error("configuration document malformed")]
    InvalidDocument {
        /// Section name, or `root` for the document itself.
        section: &'static str,
        /// Short reason code.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid_field(
        field: &'static str,
        reason: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            field,
            reason,
            value: Some(value.into()),
        }
    }
}
