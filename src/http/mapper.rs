//! Last-resort failure mapping.
//!
//! # Responsibilities
//! - Convert failures returned by handlers into error envelopes
//! - Convert panics caught at the handler boundary into error envelopes
//!
//! # Data Flow
//! ```text
//! handler → Err(Failure) → Failure::into_response (fallback + extension)
//!     → map_failures middleware → GlobalErrorMapper::to_response
//! handler panics → CatchPanicLayer → GlobalErrorMapper::handle_panic
//! ```
//!
//! # Design Decisions
//! - Built once at start-up, shared via `Arc`, never mutated
//! - Delegates to `ResponseBuilder::map_failure`, which cannot fail

use std::any::Any;
use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::http::failure::Failure;
use crate::http::response::{JsonResponse, ResponseBuilder};

/// Process-wide failure-to-response hook.
#[derive(Debug, Clone)]
pub struct GlobalErrorMapper {
    builder: ResponseBuilder,
}

impl GlobalErrorMapper {
    pub fn new(builder: ResponseBuilder) -> Self {
        Self { builder }
    }

    pub fn to_response(&self, failure: &Failure) -> JsonResponse {
        tracing::debug!(
            kind = failure.kind(),
            failure_message = failure.message(),
            cause = failure.cause_kind(),
            "Failure during request handling"
        );
        self.builder.map_failure(failure)
    }

    /// Response for a panic payload caught at the handler boundary.
    pub fn handle_panic(&self, payload: Box<dyn Any + Send + 'static>) -> Response {
        let failure = Failure::from_panic(payload);
        tracing::error!(panic_message = failure.message(), "Handler panicked");
        self.to_response(&failure).into_response()
    }
}

/// Middleware replacing responses that carry a [`Failure`] with its envelope.
pub async fn map_failures(
    State(mapper): State<Arc<GlobalErrorMapper>>,
    mut response: Response,
) -> Response {
    match response.extensions_mut().remove::<Failure>() {
        Some(failure) => mapper.to_response(&failure).into_response(),
        None => response,
    }
}
