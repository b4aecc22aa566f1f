//! HTTP response construction subsystem.
//!
//! # Data Flow
//! ```text
//! handler decides an outcome
//!     → response.rs (ResponseBuilder: classify by status family)
//!         → error family: envelope.rs, encoded synchronously
//!         → success + entity: streaming.rs (worker + BodySource)
//!         → success, no entity: empty body
//! handler fails or panics
//!     → failure.rs (Failure) → mapper.rs (GlobalErrorMapper)
//!     → ResponseBuilder::map_failure
//! → JsonResponse → axum Response → transport drains the body
//! ```

pub mod envelope;
pub mod failure;
pub mod handlers;
pub mod mapper;
pub mod response;
pub mod server;
pub mod status;
pub mod streaming;

pub use envelope::{ErrorEnvelope, FailureDetail};
pub use failure::Failure;
pub use mapper::GlobalErrorMapper;
pub use response::{JsonResponse, Outcome, ResponseBody, ResponseBuilder, ResponseError};
pub use server::HttpServer;
pub use status::StatusFamily;
pub use streaming::{BodySource, StreamError, StreamMonitor, StreamState, StreamingEncoder};
