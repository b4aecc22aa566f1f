//! JSON error envelope.
//!
//! # Wire Shape
//! ```text
//! { "error": { "message": ..., "http-code": ...,
//!              "exception": { "class", "message", "localized-message", "cause" } },
//!   "entity": ... }
//! ```
//!
//! # Design Decisions
//! - Absent values are omitted, never written as `null`
//! - The accompanying entity sits beside `error`, not inside it, so payload
//!   fields can never collide with envelope fields
//! - Envelopes are immutable once built; the `with_*` methods consume `self`

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::http::failure::Failure;

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    error: ErrorBody,

    #[serde(skip_serializing_if = "Option::is_none")]
    entity: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,

    #[serde(rename = "http-code", skip_serializing_if = "Option::is_none")]
    http_code: Option<u16>,

    #[serde(rename = "exception", skip_serializing_if = "Option::is_none")]
    failure: Option<FailureDetail>,
}

/// Description of a captured failure, one cause level deep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    class: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,

    #[serde(rename = "localized-message", skip_serializing_if = "Option::is_none")]
    localized_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(message: Option<String>, status: Option<StatusCode>) -> Self {
        Self {
            error: ErrorBody {
                message,
                http_code: status.map(|s| s.as_u16()),
                failure: None,
            },
            entity: None,
        }
    }

    /// Attach a snapshot of the entity that accompanied the error.
    pub fn with_entity(mut self, entity: Value) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn with_failure(mut self, failure: FailureDetail) -> Self {
        self.error.failure = Some(failure);
        self
    }

    pub fn message(&self) -> Option<&str> {
        self.error.message.as_deref()
    }

    pub fn http_code(&self) -> Option<u16> {
        self.error.http_code
    }

    pub fn entity(&self) -> Option<&Value> {
        self.entity.as_ref()
    }

    pub fn failure(&self) -> Option<&FailureDetail> {
        self.error.failure.as_ref()
    }
}

impl FailureDetail {
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

impl From<&Failure> for FailureDetail {
    fn from(failure: &Failure) -> Self {
        Self {
            class: failure.kind().to_string(),
            message: failure.message().map(str::to_owned),
            localized_message: failure.localized_message().map(str::to_owned),
            cause: failure.cause_kind().map(str::to_owned),
        }
    }
}
