//! File sink for spans.
//!
//! Appends one JSON-encoded span record per line to a target file. A local
//! collaborator for development setups; requires no acknowledgment.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use parking_lot::Mutex;

use crate::error::TraceError;
use crate::trace::span::SpanRecord;

use super::Exporter;

/// Exporter that appends spans to a file, one JSON record per line.
pub struct FileExporter {
    file: Mutex<File>,
}

impl FileExporter {
    /// Open (or create) the target file in append mode.
    ///
    /// An unopenable sink has no fallback: the error is returned and
    /// startup should abort.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl Exporter for FileExporter {
    fn submit(&self, span: SpanRecord) {
        let line = match serde_json::to_string(&span) {
            Ok(line) => line,
            Err(err) => {
                log::warn!("SPAN_SERIALIZE_FAILED span={} error={}", span.span_id, err);
                return;
            }
        };

        let mut file = self.file.lock();
        if let Err(err) = writeln!(file, "{}", line) {
            log::warn!("SPAN_WRITE_FAILED span={} error={}", span.span_id, err);
        }
    }

    fn shutdown(&self) -> Result<(), TraceError> {
        self.file.lock().flush()?;
        Ok(())
    }
}
