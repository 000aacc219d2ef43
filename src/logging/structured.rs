//! Structured logging utilities.
//!
//! Provides context-aware logging with trace_id and span_id included
//! in every log message.

use std::fmt;

/// Logging context for one span's call chain.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub trace_id: String,
    pub span_id: Option<String>,
}

impl LogContext {
    pub fn new(trace_id: &str) -> Self {
        Self {
            trace_id: trace_id.to_string(),
            span_id: None,
        }
    }

    pub fn with_span(&self, span_id: &str) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: Some(span_id.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span_id {
            Some(sid) => write!(f, "[trace={}] [span={}]", self.trace_id, sid),
            None => write!(f, "[trace={}]", self.trace_id),
        }
    }
}

/// Initialize the process-level logger.
///
/// Tolerant of repeat calls; only the first initialization takes effect.
pub fn init() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .try_init();
}
