//! Demo handlers exercising every response path.

use std::io;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{StatusCode, Uri},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::http::failure::Failure;
use crate::http::response::{JsonResponse, Outcome};
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

/// `GET /status`: success entity, streamed.
pub async fn status(State(state): State<AppState>) -> Result<JsonResponse, Failure> {
    let entity = ServiceStatus {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    };
    Ok(state
        .responses
        .respond(Outcome::new(StatusCode::OK).with_entity(entity))?)
}

/// `POST /echo`: streams the posted JSON document back.
pub async fn echo(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<JsonResponse, Failure> {
    match payload {
        Ok(Json(value)) => Ok(state.responses.build(StatusCode::OK, Some(value), None)?),
        Err(rejection) => Ok(state
            .responses
            .build_error(rejection.status(), Some(&rejection.body_text()))),
    }
}

/// `GET /empty`: success without an entity.
pub async fn empty(State(state): State<AppState>) -> Result<JsonResponse, Failure> {
    Ok(state.responses.respond(Outcome::new(StatusCode::NO_CONTENT))?)
}

/// `GET /errors/{code}`: plain error envelope for any valid status code.
pub async fn error_status(State(state): State<AppState>, Path(code): Path<u16>) -> JsonResponse {
    match StatusCode::from_u16(code) {
        Ok(status) => state.responses.build_error(status, status.canonical_reason()),
        Err(_) => state.responses.build_error(
            StatusCode::BAD_REQUEST,
            Some(&format!("{code} is not a valid status code")),
        ),
    }
}

/// `GET /fail`: handler gives up with a failure that has a cause.
pub async fn fail() -> Result<JsonResponse, Failure> {
    let cause = io::Error::new(io::ErrorKind::ConnectionRefused, "backing store refused connection");
    Err(Failure::new("demo::StoreUnavailable")
        .with_message("backing store unavailable")
        .caused_by(&cause))
}

/// `GET /unavailable`: failure that carries its own status.
pub async fn unavailable() -> Result<JsonResponse, Failure> {
    Err(Failure::web(StatusCode::SERVICE_UNAVAILABLE, "service is draining"))
}

/// `GET /panic`: the safety net answers for a panicking handler.
pub async fn panic() -> JsonResponse {
    panic!("requested panic")
}

pub async fn not_found(State(state): State<AppState>, uri: Uri) -> JsonResponse {
    state
        .responses
        .build_error(StatusCode::NOT_FOUND, Some(&format!("no route for {}", uri.path())))
}
