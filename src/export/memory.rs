//! In-memory exporter for tests and assertions.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::trace::span::SpanRecord;

use super::Exporter;

/// Exporter that stores submitted spans in memory.
///
/// Clones share the same storage, so a test can keep one handle for
/// assertions and hand another to the tracer.
#[derive(Clone, Debug, Default)]
pub struct InMemoryExporter {
    spans: Arc<Mutex<Vec<SpanRecord>>>,
}

impl InMemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spans submitted so far, in arrival order.
    pub fn finished_spans(&self) -> Vec<SpanRecord> {
        self.spans.lock().clone()
    }

    pub fn clear(&self) {
        self.spans.lock().clear();
    }
}

impl Exporter for InMemoryExporter {
    fn submit(&self, span: SpanRecord) {
        self.spans.lock().push(span);
    }
}
