//! Attribute sanitization.
//!
//! Every attribute write on a span passes through a [`Sanitizer`] before it
//! is stored, so no caller can record unscrubbed values. Two strategies are
//! provided: [`NoopSanitizer`] and the PII-redacting [`PiiSanitizer`].

pub mod pii;

pub use pii::*;

use serde_json::{Map, Value};

use crate::logging::structured::LogContext;

/// Attribute mapping carried on spans: string keys to JSON values.
pub type Attributes = Map<String, Value>;

/// Strategy for scrubbing attribute trees before they are stored on a span.
///
/// Implementations must be pure with respect to their input: the argument
/// is never mutated and a fresh mapping is returned. Implementations hold
/// no mutable state and are shared across call chains without locking.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, attributes: &Attributes, ctx: &LogContext) -> Attributes;
}

/// Sanitizer that returns attributes unchanged.
#[derive(Debug, Default)]
pub struct NoopSanitizer;

impl Sanitizer for NoopSanitizer {
    fn sanitize(&self, attributes: &Attributes, _ctx: &LogContext) -> Attributes {
        attributes.clone()
    }
}
