//! Span delivery.
//!
//! [`Exporter`] is the seam between span completion and delivery. The
//! batching HTTP exporter is the production path; the file and in-memory
//! exporters serve local sinks and tests.

pub mod batch;
pub mod file;
pub mod http;
pub mod memory;

pub use batch::{BatchConfig, BatchExporter, BatchSink};
pub use file::FileExporter;
pub use http::HttpSink;
pub use memory::InMemoryExporter;

use crate::error::TraceError;
use crate::trace::span::SpanRecord;

/// Consumer of completed spans.
///
/// `submit` is called from [`Span::end`](crate::trace::Span::end) on the
/// application's call chain and must never fail the caller: errors on the
/// delivery path are logged by the implementation and the affected data
/// dropped.
pub trait Exporter: Send + Sync {
    /// Accept a completed span for delivery.
    fn submit(&self, span: SpanRecord);

    /// Release underlying resources, draining pending data best-effort.
    fn shutdown(&self) -> Result<(), TraceError> {
        Ok(())
    }
}
