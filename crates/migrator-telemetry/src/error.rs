//! Error types for telemetry setup and metrics rendering.

use std::string::FromUtf8Error;

use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed.
    #[error("tracing subscriber could not be installed")]
    SubscriberInstall {
        /// Error reported by `tracing-subscriber`.
        #[source]
        source: TryInitError,
    },
    /// A Prometheus collector could not be built or registered.
    #[error("metrics collector could not be set up")]
    Collector {
        /// Metric name.
        name: &'static str,
        /// Error reported by Prometheus.
        #[source]
        source: prometheus::Error,
    },
    /// The registry could not be encoded in text exposition format.
    #[error("metrics could not be rendered")]
    Render {
        /// Error reported by Prometheus.
        #[source]
        source: prometheus::Error,
    },
    /// The encoder produced bytes that are not UTF-8.
    #[error("rendered metrics were not utf-8")]
    RenderUtf8 {
        /// Conversion error.
        #[source]
        source: FromUtf8Error,
    },
}
