//! Error taxonomy for the tracing client.
//!
//! Nothing here ever propagates into instrumented application code: span
//! creation and completion are infallible, and delivery failures are logged
//! by the export worker and the affected batch dropped. These errors surface
//! only from construction paths and explicit shutdown hooks.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by tracer/exporter construction and shutdown.
#[derive(Debug, Error)]
pub enum TraceError {
    /// A sink or client could not be configured. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The file sink could not be opened or flushed.
    #[error("trace sink I/O error: {0}")]
    Sink(#[from] std::io::Error),

    /// A span batch could not be serialized to the wire payload.
    #[error("failed to serialize span batch: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The network request itself failed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The collector answered with a non-success status.
    #[error("collector returned status {0}")]
    Collector(reqwest::StatusCode),

    /// The exporter was already shut down.
    #[error("exporter already shut down")]
    AlreadyShutdown,

    /// The export worker did not acknowledge within the grace period.
    #[error("export worker did not drain within {0:?}")]
    ShutdownTimedOut(Duration),
}
