//! Tracing setup shared by kv-router binaries: fmt logging with optional OTLP export.

pub mod config;
pub mod otlp;
pub mod spans;

pub use config::{LogFormat, OtlpProtocol, TracingConfig};
pub use otlp::{init_tracing, TracingGuard};
