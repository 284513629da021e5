//! Observability for twinmem: structured logging to stderr with optional
//! OpenTelemetry span export.

pub mod tracing_setup;
