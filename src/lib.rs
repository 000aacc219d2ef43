//! Aeonis Tracer - Embedded tracing client core
//!
//! This crate records causally-related units of work ("spans") inside an
//! application process, scrubs sensitive data from their attributes, and
//! ships completed spans to an Aeonis collector in batches, off the
//! application's call chains. The implementation prioritizes:
//!
//! 1. **Causal linkage** - every span carries its trace identity and parent
//!    through an immutable context carrier
//! 2. **Redaction before storage** - attributes never land on a span
//!    without passing the configured sanitizer
//! 3. **Best-effort delivery** - tracing never fails the business operation
//!    it observes; delivery failures are logged and dropped
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `trace` - span model, tracer, call-chain context carrier
//! - `sanitize` - attribute sanitization (no-op and PII-redacting)
//! - `export` - batching HTTP exporter, file and in-memory sinks
//! - `logging` - structured logging with trace context
//! - `error` - error taxonomy for construction and shutdown paths
//!
//! ## Usage
//!
//! ```no_run
//! use aeonis_tracer::{PiiSanitizer, TraceError, Tracer};
//!
//! fn main() -> Result<(), TraceError> {
//!     let tracer = Tracer::new(
//!         "checkout",
//!         "https://collector.example.com/v1/traces",
//!         Some("api-key"),
//!         Box::new(PiiSanitizer::new()),
//!     )?;
//!
//!     let root = tracer.start_span(None, "handle-request");
//!     let cx = root.context();
//!
//!     let mut child = tracer.start_span(Some(&cx), "db.query");
//!     child.set_attributes(
//!         serde_json::json!({"db.statement": "SELECT 1"})
//!             .as_object()
//!             .cloned()
//!             .unwrap(),
//!     );
//!     child.end();
//!     root.end();
//!
//!     tracer.shutdown()
//! }
//! ```

pub mod error;
pub mod export;
pub mod logging;
pub mod sanitize;
pub mod trace;

pub use error::TraceError;
pub use export::{
    BatchConfig, BatchExporter, BatchSink, Exporter, FileExporter, HttpSink, InMemoryExporter,
};
pub use sanitize::{Attributes, NoopSanitizer, PiiSanitizer, Sanitizer};
pub use trace::{Span, SpanError, SpanRecord, TraceContext, Tracer};
