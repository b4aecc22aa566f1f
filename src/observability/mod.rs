//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Response construction and stream workers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap (no-op without an installed recorder)

pub mod logging;
pub mod metrics;
