//! Handler failures.
//!
//! A [`Failure`] is what a handler gives up with instead of an outcome. It
//! records the failure kind, its message, the kind of its direct cause and,
//! for web failures, the HTTP status the handler wants reported.
//!
//! # Design Decisions
//! - Kinds are type names (`std::any::type_name`) for typed errors
//! - Only the direct cause is kept, never the full chain
//! - `IntoResponse` answers with the fixed fallback and stashes the failure in
//!   the response extensions; the `GlobalErrorMapper` middleware replaces it
//!   with a proper envelope

use std::any::{type_name, Any};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::response::{JsonResponse, ResponseError};
use crate::http::streaming::StreamError;

/// Kind reported for panics caught at the handler boundary.
pub const PANIC_KIND: &str = "panic";

/// Kind reported for failures that carry their own HTTP status.
pub const WEB_KIND: &str = "web_application";

/// Kind reported when a cause cannot be identified.
pub const UNKNOWN_KIND: &str = "unknown";

/// A failure that escaped handler logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    kind: Cow<'static, str>,
    message: Option<String>,
    status: Option<StatusCode>,
    cause: Option<Cow<'static, str>>,
}

impl Failure {
    pub fn new(kind: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind: kind.into(),
            message: None,
            status: None,
            cause: None,
        }
    }

    /// A failure that already knows which status to answer with.
    pub fn web(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(WEB_KIND).with_status(status).with_message(message)
    }

    /// Capture a typed error, its message and the kind of its direct source.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: Error + 'static,
    {
        let mut failure = Self::new(type_name::<E>());
        failure.message = non_empty(err.to_string());
        failure.cause = err.source().map(error_kind);
        failure
    }

    /// Capture a panic payload as caught by `catch_unwind`.
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            Some((*s).to_string())
        } else {
            payload.downcast_ref::<String>().cloned()
        };

        let mut failure = Self::new(PANIC_KIND);
        failure.message = message.and_then(non_empty);
        failure
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = non_empty(message.into());
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_cause_kind(mut self, kind: impl Into<Cow<'static, str>>) -> Self {
        self.cause = Some(kind.into());
        self
    }

    /// Record `cause` as the direct cause of this failure.
    ///
    /// A nested `Failure` contributes its own kind rather than its type name.
    pub fn caused_by<E>(self, cause: &E) -> Self
    where
        E: Error + 'static,
    {
        let kind = match (cause as &dyn Error).downcast_ref::<Failure>() {
            Some(failure) => failure.kind.clone(),
            None => Cow::Borrowed(type_name::<E>()),
        };
        self.with_cause_kind(kind)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// There is no localization; this mirrors `message`.
    pub fn localized_message(&self) -> Option<&str> {
        self.message()
    }

    /// The HTTP status carried by a web failure.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn cause_kind(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    pub fn is_web(&self) -> bool {
        self.status.is_some()
    }
}

fn non_empty(message: String) -> Option<String> {
    if message.is_empty() {
        None
    } else {
        Some(message)
    }
}

/// Best-effort kind name for a type-erased error.
fn error_kind(err: &(dyn Error + 'static)) -> Cow<'static, str> {
    if let Some(failure) = err.downcast_ref::<Failure>() {
        return failure.kind.clone();
    }

    let kind = if err.is::<std::io::Error>() {
        type_name::<std::io::Error>()
    } else if err.is::<serde_json::Error>() {
        type_name::<serde_json::Error>()
    } else if err.is::<ResponseError>() {
        type_name::<ResponseError>()
    } else if err.is::<StreamError>() {
        type_name::<StreamError>()
    } else if err.is::<std::fmt::Error>() {
        type_name::<std::fmt::Error>()
    } else {
        UNKNOWN_KIND
    };
    Cow::Borrowed(kind)
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.kind, message),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Error for Failure {}

impl From<ResponseError> for Failure {
    fn from(err: ResponseError) -> Self {
        Self::from_error(&err)
    }
}

impl From<StreamError> for Failure {
    fn from(err: StreamError) -> Self {
        Self::from_error(&err)
    }
}

impl From<serde_json::Error> for Failure {
    fn from(err: serde_json::Error) -> Self {
        Self::from_error(&err)
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        Self::from_error(&err)
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let mut response = JsonResponse::fallback().into_response();
        response.extensions_mut().insert(self);
        response
    }
}
