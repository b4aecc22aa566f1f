//! Response construction.
//!
//! # Responsibilities
//! - Classify an outcome by status family
//! - Build error envelopes synchronously
//! - Delegate success entities to the streaming encoder
//! - Map escaped failures to envelopes without ever failing
//!
//! # Design Decisions
//! - Success bodies are the bare entity; only errors are enveloped
//! - Error bodies are small by convention, so they are encoded up front
//!   instead of streamed
//! - `map_failure` encodes with plain compact `serde_json` rather than the
//!   configured serializer, and falls back to a fixed body if even that fails

use std::io;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::config::StreamingConfig;
use crate::http::envelope::{ErrorEnvelope, FailureDetail};
use crate::http::failure::Failure;
use crate::http::status::StatusFamily;
use crate::http::streaming::{BodySource, StreamError, StreamingEncoder};
use crate::observability::metrics;
use crate::serializer::JsonSerializer;

/// Body served when even the failure mapper cannot encode its envelope.
pub const FALLBACK_BODY: &str = "Internal Server Error";

const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Errors raised while building a response.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// The entity accompanying an error could not be encoded.
    #[error("failed to encode error envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// A handler's decided result, before it becomes a response.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T = ()> {
    status: StatusCode,
    entity: Option<T>,
    message: Option<String>,
}

impl Outcome {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            entity: None,
            message: None,
        }
    }
}

impl<T> Outcome<T> {
    pub fn with_entity<U>(self, entity: U) -> Outcome<U> {
        Outcome {
            status: self.status,
            entity: Some(entity),
            message: self.message,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// What a response carries.
#[derive(Debug)]
pub enum ResponseBody {
    Empty,
    /// Fully encoded up front (error paths).
    Full(Bytes),
    /// Produced by a background worker (success with entity).
    Stream(BodySource),
}

/// Wire-ready response handed to the transport layer.
#[derive(Debug)]
pub struct JsonResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl JsonResponse {
    fn json(status: StatusCode, body: ResponseBody) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Fixed `500` plain-text response of last resort.
    pub fn fallback() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            headers,
            body: ResponseBody::Full(Bytes::from_static(FALLBACK_BODY.as_bytes())),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.body, ResponseBody::Stream(_))
    }

    /// Collect the body, draining a stream to its end.
    pub async fn into_bytes(self) -> io::Result<Bytes> {
        match self.body {
            ResponseBody::Empty => Ok(Bytes::new()),
            ResponseBody::Full(bytes) => Ok(bytes),
            ResponseBody::Stream(source) => source.read_to_end().await.map(Bytes::from),
        }
    }
}

impl IntoResponse for JsonResponse {
    fn into_response(self) -> Response {
        let body = match self.body {
            ResponseBody::Empty => Body::empty(),
            ResponseBody::Full(bytes) => Body::from(bytes),
            ResponseBody::Stream(source) => Body::from_stream(source),
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Turns outcomes and failures into [`JsonResponse`]s.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    serializer: Arc<JsonSerializer>,
    encoder: StreamingEncoder,
}

impl ResponseBuilder {
    pub fn new(serializer: Arc<JsonSerializer>, streaming: &StreamingConfig) -> Self {
        let encoder = StreamingEncoder::new(Arc::clone(&serializer), streaming);
        Self {
            serializer,
            encoder,
        }
    }

    /// Error envelope with only a message and the status code.
    pub fn build_error(&self, status: StatusCode, message: Option<&str>) -> JsonResponse {
        let envelope = ErrorEnvelope::new(message.map(str::to_owned), Some(status));
        match self.serializer.to_vec(&envelope) {
            Ok(body) => {
                metrics::record_response_built("error");
                JsonResponse::json(status, ResponseBody::Full(Bytes::from(body)))
            }
            Err(e) => {
                tracing::error!(error = %e, status = %status, "Failed to encode error envelope");
                metrics::record_response_built("fallback");
                JsonResponse::fallback()
            }
        }
    }

    /// Build a response for `status`.
    ///
    /// Outside the success family the result is an error envelope carrying
    /// `message`, the code and a snapshot of `entity`. Inside it, the entity
    /// alone is streamed, and `message` is ignored.
    pub fn build<T>(
        &self,
        status: StatusCode,
        entity: Option<T>,
        message: Option<&str>,
    ) -> Result<JsonResponse, ResponseError>
    where
        T: Serialize + Send + 'static,
    {
        if !StatusFamily::of(status).is_success() {
            return self.error_with_entity(status, entity.as_ref(), message);
        }

        match entity {
            None => {
                metrics::record_response_built("empty");
                Ok(JsonResponse::json(status, ResponseBody::Empty))
            }
            Some(entity) => {
                let source = self.encoder.start(entity)?;
                metrics::record_response_built("stream");
                Ok(JsonResponse::json(status, ResponseBody::Stream(source)))
            }
        }
    }

    /// [`build`](Self::build) for an [`Outcome`].
    pub fn respond<T>(&self, outcome: Outcome<T>) -> Result<JsonResponse, ResponseError>
    where
        T: Serialize + Send + 'static,
    {
        self.build(outcome.status, outcome.entity, outcome.message.as_deref())
    }

    fn error_with_entity<T: Serialize>(
        &self,
        status: StatusCode,
        entity: Option<&T>,
        message: Option<&str>,
    ) -> Result<JsonResponse, ResponseError> {
        let mut envelope = ErrorEnvelope::new(message.map(str::to_owned), Some(status));
        if let Some(entity) = entity {
            let snapshot = self
                .serializer
                .to_value(entity)
                .map_err(ResponseError::Envelope)?;
            envelope = envelope.with_entity(snapshot);
        }

        let body = self
            .serializer
            .to_vec(&envelope)
            .map_err(ResponseError::Envelope)?;
        metrics::record_response_built("error");
        Ok(JsonResponse::json(status, ResponseBody::Full(Bytes::from(body))))
    }

    /// Envelope for a failure that escaped handler logic. Never fails.
    ///
    /// Web failures keep their own status; everything else is a `500`.
    pub fn map_failure(&self, failure: &Failure) -> JsonResponse {
        let status = failure.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = ErrorEnvelope::new(failure.message().map(str::to_owned), Some(status))
            .with_failure(FailureDetail::from(failure));

        match serde_json::to_string(&envelope) {
            Ok(text) => {
                metrics::record_response_built("mapped");
                JsonResponse::json(status, ResponseBody::Full(Bytes::from(text)))
            }
            Err(e) => {
                tracing::error!(error = %e, kind = failure.kind(), "Failed to encode failure envelope");
                metrics::record_response_built("fallback");
                JsonResponse::fallback()
            }
        }
    }
}
