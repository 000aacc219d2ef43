//! Structured logging with trace context.
//!
//! Provides a display prefix carrying trace and span identity so log lines
//! from concurrent call chains can be correlated.

pub mod structured;

pub use structured::*;
