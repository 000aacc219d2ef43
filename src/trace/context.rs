//! Call-chain context carrier.
//!
//! The carrier is an immutable snapshot of trace identity. It is everything
//! a callee needs to link its spans under the caller's trace, so the live
//! span never has to leave the call chain that owns it.

use crate::logging::structured::LogContext;

/// Immutable `(trace_id, span_id)` snapshot propagated through a call chain.
///
/// Obtained from [`Span::context`](crate::trace::Span::context) and passed
/// by value (or reference) to nested operations, which hand it to
/// [`Tracer::start_span`](crate::trace::Tracer::start_span) to create child
/// spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    trace_id: String,
    span_id: String,
}

impl TraceContext {
    pub(crate) fn new(trace_id: &str, span_id: &str) -> Self {
        Self {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
        }
    }

    /// Identifier of the trace the active span belongs to.
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Identifier of the active span.
    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    pub(crate) fn log_context(&self) -> LogContext {
        LogContext::new(&self.trace_id).with_span(&self.span_id)
    }
}
