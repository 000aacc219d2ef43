//! Tracer construction and span creation.
//!
//! The tracer is built once per process, holds the configured sanitizer,
//! exporter and resource attributes, and is shared read-only by every call
//! chain that creates spans.

use std::env;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::error::TraceError;
use crate::export::batch::BatchExporter;
use crate::export::http::HttpSink;
use crate::export::Exporter;
use crate::logging;
use crate::sanitize::{Attributes, Sanitizer};
use crate::trace::context::TraceContext;
use crate::trace::span::{Span, SpanRecord};

/// Environment variable holding the build/commit identifier stamped onto
/// every span. Falls back to `"local"` when absent.
pub const COMMIT_SHA_ENV: &str = "AEONIS_COMMIT_SHA";

pub(crate) struct TracerShared {
    pub(crate) service_name: String,
    pub(crate) resource: Attributes,
    pub(crate) sanitizer: Box<dyn Sanitizer>,
    pub(crate) exporter: Arc<dyn Exporter>,
}

/// Entry point for creating spans.
///
/// Cheap to clone; clones share the same sanitizer, exporter and resource
/// attributes. Immutable after construction and safe for concurrent use.
#[derive(Clone)]
pub struct Tracer {
    shared: Arc<TracerShared>,
}

impl Tracer {
    /// Create a tracer that ships spans to an Aeonis collector endpoint
    /// through the batching HTTP exporter.
    pub fn new(
        service_name: &str,
        endpoint_url: &str,
        api_key: Option<&str>,
        sanitizer: Box<dyn Sanitizer>,
    ) -> Result<Self, TraceError> {
        let sink = HttpSink::new(endpoint_url, api_key)?;
        let exporter = Arc::new(BatchExporter::new(sink));
        Ok(Self::with_exporter(service_name, exporter, sanitizer))
    }

    /// Create a tracer over a caller-supplied exporter.
    pub fn with_exporter(
        service_name: &str,
        exporter: Arc<dyn Exporter>,
        sanitizer: Box<dyn Sanitizer>,
    ) -> Self {
        logging::init();
        let resource = resource_attributes(service_name);
        log::info!(
            "TRACER_INIT service={} commit={}",
            service_name,
            resource
                .get("vcs.commit")
                .and_then(Value::as_str)
                .unwrap_or("local")
        );

        Self {
            shared: Arc::new(TracerShared {
                service_name: service_name.to_string(),
                resource,
                sanitizer,
                exporter,
            }),
        }
    }

    /// Start a span.
    ///
    /// With a parent carrier the new span joins the carried trace and
    /// records the carried span as its parent; without one it roots a new
    /// trace. Resource attributes are stamped onto the span before it is
    /// returned. Propagate [`Span::context`] to nested operations.
    pub fn start_span(&self, parent: Option<&TraceContext>, name: &str) -> Span {
        let (trace_id, parent_span_id) = match parent {
            Some(cx) => (cx.trace_id().to_string(), cx.span_id().to_string()),
            None => (Uuid::new_v4().to_string(), String::new()),
        };

        let record = SpanRecord {
            trace_id,
            span_id: Uuid::new_v4().to_string(),
            parent_span_id,
            name: name.to_string(),
            start_time: Utc::now(),
            end_time: None,
            attributes: self.shared.resource.clone(),
            error: None,
        };

        let span = Span::new(record, self.shared.clone());
        log::debug!("{} SPAN_START name={}", span.context().log_context(), name);
        span
    }

    /// Run `f` inside a span, ending it on every return path.
    ///
    /// An `Err` from the closure is recorded on the span via
    /// [`Span::set_error`] before it ends; the result is returned unchanged
    /// either way. Nested operations can derive their carrier from the
    /// span handle passed to the closure.
    pub fn in_span<T, E, F>(&self, parent: Option<&TraceContext>, name: &str, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Span) -> Result<T, E>,
        E: fmt::Display,
    {
        let mut span = self.start_span(parent, name);
        let result = f(&mut span);
        if let Err(err) = &result {
            span.set_error(err.to_string(), None);
        }
        span.end();
        result
    }

    pub fn service_name(&self) -> &str {
        &self.shared.service_name
    }

    /// Shut down the underlying exporter, draining queued spans
    /// best-effort within its grace period.
    pub fn shutdown(&self) -> Result<(), TraceError> {
        self.shared.exporter.shutdown()
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("service_name", &self.shared.service_name)
            .field("resource", &self.shared.resource)
            .finish_non_exhaustive()
    }
}

/// Process-wide resource attributes stamped onto every span.
fn resource_attributes(service_name: &str) -> Attributes {
    let commit = env::var(COMMIT_SHA_ENV).unwrap_or_else(|_| "local".to_string());

    let mut resource = Attributes::new();
    resource.insert(
        "service.name".to_string(),
        Value::String(service_name.to_string()),
    );
    resource.insert(
        "telemetry.sdk.name".to_string(),
        Value::String("aeonis-tracer".to_string()),
    );
    resource.insert(
        "telemetry.sdk.version".to_string(),
        Value::String(env!("CARGO_PKG_VERSION").to_string()),
    );
    resource.insert(
        "telemetry.sdk.language".to_string(),
        Value::String("rust".to_string()),
    );
    resource.insert("vcs.commit".to_string(), Value::String(commit));
    resource
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::export::memory::InMemoryExporter;
    use crate::sanitize::{NoopSanitizer, PiiSanitizer};

    use super::*;

    fn test_tracer(exporter: &InMemoryExporter) -> Tracer {
        Tracer::with_exporter(
            "test-service",
            Arc::new(exporter.clone()),
            Box::new(NoopSanitizer),
        )
    }

    #[test]
    fn test_root_span() {
        let exporter = InMemoryExporter::new();
        let tracer = test_tracer(&exporter);

        let span = tracer.start_span(None, "root-operation");
        span.end();

        let spans = exporter.finished_spans();
        assert_eq!(spans.len(), 1);
        let exported = &spans[0];
        assert!(!exported.trace_id.is_empty());
        assert!(exported.parent_span_id.is_empty());
        assert_eq!(exported.name, "root-operation");
        assert!(exported.end_time.unwrap() >= exported.start_time);
    }

    #[test]
    fn test_child_span_links_to_parent() {
        let exporter = InMemoryExporter::new();
        let tracer = test_tracer(&exporter);

        let parent = tracer.start_span(None, "parent-op");
        let cx = parent.context();
        let child = tracer.start_span(Some(&cx), "child-op");
        child.end();
        parent.end();

        let spans = exporter.finished_spans();
        assert_eq!(spans.len(), 2);
        let exported_child = spans.iter().find(|s| s.name == "child-op").unwrap();
        let exported_parent = spans.iter().find(|s| s.name == "parent-op").unwrap();
        assert_eq!(exported_child.trace_id, exported_parent.trace_id);
        assert_eq!(exported_child.parent_span_id, exported_parent.span_id);
        assert!(exported_parent.is_root());
        assert!(!exported_child.is_root());
    }

    #[test]
    fn test_independent_roots_get_distinct_traces() {
        let exporter = InMemoryExporter::new();
        let tracer = test_tracer(&exporter);

        let a = tracer.start_span(None, "a");
        let b = tracer.start_span(None, "b");
        assert_ne!(a.trace_id(), b.trace_id());
        assert_ne!(a.span_id(), b.span_id());
        a.end();
        b.end();
    }

    #[test]
    fn test_resource_attributes_stamped() {
        let exporter = InMemoryExporter::new();
        let tracer = test_tracer(&exporter);

        tracer.start_span(None, "op").end();

        let spans = exporter.finished_spans();
        let attrs = &spans[0].attributes;
        assert_eq!(attrs["service.name"], "test-service");
        assert_eq!(attrs["telemetry.sdk.name"], "aeonis-tracer");
        assert_eq!(attrs["telemetry.sdk.version"], env!("CARGO_PKG_VERSION"));
        assert!(attrs.contains_key("vcs.commit"));
    }

    #[test]
    fn test_commit_sha_from_environment() {
        temp_env::with_var(COMMIT_SHA_ENV, Some("abc1234"), || {
            let exporter = InMemoryExporter::new();
            let tracer = test_tracer(&exporter);
            tracer.start_span(None, "op").end();
            assert_eq!(exporter.finished_spans()[0].attributes["vcs.commit"], "abc1234");
        });

        temp_env::with_var_unset(COMMIT_SHA_ENV, || {
            let exporter = InMemoryExporter::new();
            let tracer = test_tracer(&exporter);
            tracer.start_span(None, "op").end();
            assert_eq!(exporter.finished_spans()[0].attributes["vcs.commit"], "local");
        });
    }

    #[test]
    fn test_set_attributes_passes_through_sanitizer() {
        let exporter = InMemoryExporter::new();
        let tracer = Tracer::with_exporter(
            "pii-test-service",
            Arc::new(exporter.clone()),
            Box::new(PiiSanitizer::new()),
        );

        let mut span = tracer.start_span(None, "pii-op");
        span.set_attributes(json!({"email": "test@example.com"}).as_object().cloned().unwrap());
        span.end();

        let spans = exporter.finished_spans();
        assert_eq!(spans[0].attributes["email"], "test...example.com");
    }

    #[test]
    fn test_attribute_merge_last_write_wins() {
        let exporter = InMemoryExporter::new();
        let tracer = test_tracer(&exporter);

        let mut span = tracer.start_span(None, "op");
        span.set_attributes(json!({"a": 1, "b": "first"}).as_object().cloned().unwrap());
        span.set_attributes(json!({"b": "second", "c": true}).as_object().cloned().unwrap());
        span.end();

        let attrs = exporter.finished_spans()[0].attributes.clone();
        assert_eq!(attrs["a"], 1);
        assert_eq!(attrs["b"], "second");
        assert_eq!(attrs["c"], true);
    }

    #[test]
    fn test_resource_keys_are_reserved() {
        let exporter = InMemoryExporter::new();
        let tracer = test_tracer(&exporter);

        let mut span = tracer.start_span(None, "op");
        span.set_attributes(
            json!({"service.name": "spoofed", "custom": "kept"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        span.end();

        let attrs = exporter.finished_spans()[0].attributes.clone();
        assert_eq!(attrs["service.name"], "test-service");
        assert_eq!(attrs["custom"], "kept");
    }

    #[test]
    fn test_set_error_last_write_wins() {
        let exporter = InMemoryExporter::new();
        let tracer = test_tracer(&exporter);

        let mut span = tracer.start_span(None, "op");
        span.set_error("first", None);
        span.set_error("second", Some("at line 3".to_string()));
        span.end();

        let error = exporter.finished_spans()[0].error.clone().unwrap();
        assert_eq!(error.message, "second");
        assert_eq!(error.stack_trace.as_deref(), Some("at line 3"));
    }

    #[test]
    fn test_in_span_ends_on_success() {
        let exporter = InMemoryExporter::new();
        let tracer = test_tracer(&exporter);

        let result: Result<i32, String> = tracer.in_span(None, "scoped-op", |span| {
            span.set_attributes(json!({"step": "ran"}).as_object().cloned().unwrap());
            Ok(7)
        });

        assert_eq!(result.unwrap(), 7);
        let spans = exporter.finished_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "scoped-op");
        assert!(spans[0].error.is_none());
        assert!(spans[0].end_time.is_some());
    }

    #[test]
    fn test_in_span_records_error_and_ends() {
        let exporter = InMemoryExporter::new();
        let tracer = test_tracer(&exporter);

        let result: Result<(), String> =
            tracer.in_span(None, "failing-op", |_span| Err("query timed out".to_string()));

        assert!(result.is_err());
        let spans = exporter.finished_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].error.as_ref().unwrap().message, "query timed out");
        assert!(spans[0].end_time.is_some());
    }

    #[test]
    fn test_in_span_supports_nesting() {
        let exporter = InMemoryExporter::new();
        let tracer = test_tracer(&exporter);

        let result: Result<(), String> = tracer.in_span(None, "outer", |outer| {
            let cx = outer.context();
            tracer.in_span(Some(&cx), "inner", |_inner| Ok(()))
        });

        assert!(result.is_ok());
        let spans = exporter.finished_spans();
        assert_eq!(spans.len(), 2);
        let inner = spans.iter().find(|s| s.name == "inner").unwrap();
        let outer = spans.iter().find(|s| s.name == "outer").unwrap();
        assert_eq!(inner.trace_id, outer.trace_id);
        assert_eq!(inner.parent_span_id, outer.span_id);
    }
}
