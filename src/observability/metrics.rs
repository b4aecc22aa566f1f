//! Metrics collection.
//!
//! # Metrics
//! - `json_response_built_total` (counter): responses built, by body path
//!   (`stream`, `error`, `empty`, `mapped`, `fallback`)
//! - `json_stream_finished_total` (counter): streamed bodies by terminal
//!   state (`completed`, `failed`, `cancelled`)
//! - `json_stream_bytes` (histogram): bytes handed to the reader per stream
//!
//! # Design Decisions
//! - No exporter is installed here; without a recorder every call is a no-op
//! - Labels are static strings to keep cardinality fixed

/// Record a built response by body path.
pub fn record_response_built(path: &'static str) {
    ::metrics::counter!("json_response_built_total", "path" => path).increment(1);
}

/// Record a streamed body reaching a terminal state.
pub fn record_stream_finished(outcome: &'static str, bytes: u64) {
    ::metrics::counter!("json_stream_finished_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("json_stream_bytes").record(bytes as f64);
}
