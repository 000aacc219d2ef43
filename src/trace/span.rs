//! Span model and live span handle.
//!
//! [`SpanRecord`] is the wire form of one unit of work; [`Span`] is the
//! live handle a call chain mutates until it calls [`Span::end`], at which
//! point the record is handed to the exporter and the handle is consumed.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logging::structured::LogContext;
use crate::sanitize::Attributes;
use crate::trace::context::TraceContext;
use crate::trace::tracer::TracerShared;

/// Error recorded on a span. At most one per span; a later write replaces
/// the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

/// One unit of work in wire form.
///
/// Empty optional fields (`parent_span_id`, `attributes`, `error`) are
/// omitted from the serialized record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanRecord {
    pub trace_id: String,
    pub span_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_span_id: String,
    pub name: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SpanError>,
}

impl SpanRecord {
    /// Whether this span roots its trace.
    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_empty()
    }
}

/// Live handle to an in-flight span.
///
/// The handle is owned by the call chain that created it; only the
/// immutable [`TraceContext`] identity leaves it. [`Span::end`] consumes
/// the handle, so mutation after end is a compile error rather than a
/// runtime condition.
pub struct Span {
    record: SpanRecord,
    shared: Arc<TracerShared>,
}

impl Span {
    pub(crate) fn new(record: SpanRecord, shared: Arc<TracerShared>) -> Self {
        Self { record, shared }
    }

    /// Immutable identity carrier for propagation to nested operations.
    pub fn context(&self) -> TraceContext {
        TraceContext::new(&self.record.trace_id, &self.record.span_id)
    }

    pub fn trace_id(&self) -> &str {
        &self.record.trace_id
    }

    pub fn span_id(&self) -> &str {
        &self.record.span_id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Sanitize `attributes` and merge them into the span, key-wise.
    ///
    /// May be called repeatedly; the last write per key wins. Keys owned by
    /// the tracer's resource attributes are reserved and left untouched.
    pub fn set_attributes(&mut self, attributes: Attributes) {
        let ctx = self.log_context();
        let sanitized = self.shared.sanitizer.sanitize(&attributes, &ctx);
        for (key, value) in sanitized {
            if self.shared.resource.contains_key(&key) {
                log::debug!("{} ATTR_RESERVED key={}", ctx, key);
                continue;
            }
            self.record.attributes.insert(key, value);
        }
    }

    /// Record an error on the span. Repeated calls replace the prior record.
    pub fn set_error(&mut self, message: impl Into<String>, stack_trace: Option<String>) {
        self.record.error = Some(SpanError {
            message: message.into(),
            stack_trace,
        });
    }

    /// Complete the span and hand it off for delivery.
    ///
    /// Stamps the end timestamp and submits the record to the exporter; the
    /// record now belongs to the delivery path. Never blocks on network
    /// I/O, though it may block briefly while the exporter's bounded queue
    /// is full.
    pub fn end(self) {
        let Span { mut record, shared } = self;
        record.end_time = Some(Utc::now());
        log::debug!(
            "{} SPAN_END name={}",
            LogContext::new(&record.trace_id).with_span(&record.span_id),
            record.name
        );
        shared.exporter.submit(record);
    }

    fn log_context(&self) -> LogContext {
        LogContext::new(&self.record.trace_id).with_span(&self.record.span_id)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}
