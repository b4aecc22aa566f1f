//! Route-level tests driving the demo router in-process.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use json_stream_response::config::ServiceConfig;
use json_stream_response::http::HttpServer;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn call(method: Method, uri: &str, body: Body) -> Response {
    let router = HttpServer::new(ServiceConfig::default()).router();
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    router.oneshot(request).await.unwrap()
}

async fn get(uri: &str) -> Response {
    call(Method::GET, uri, Body::empty()).await
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_status_streams_bare_entity() {
    let response = get("/status").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

    let body = body_json(response).await;
    assert_eq!(body["name"], "json-stream-response");
    assert_eq!(body["status"], "operational");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_echo_round_trip() {
    let response = call(Method::POST, "/echo", Body::from(r#"{"id":"x"}"#)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, br#"{"id":"x"}"#);
}

#[tokio::test]
async fn test_echo_large_document() {
    let document = json!({
        "rows": (0..20_000).map(|i| json!({"n": i, "name": format!("row-{i}")})).collect::<Vec<_>>()
    });
    let response = call(
        Method::POST,
        "/echo",
        Body::from(serde_json::to_vec(&document).unwrap()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, document);
}

#[tokio::test]
async fn test_echo_rejects_malformed_json() {
    let response = call(Method::POST, "/echo", Body::from("{\"id\":")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["http-code"], 400);
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_empty_success() {
    let response = get("/empty").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_error_envelope_route() {
    let response = get("/errors/404").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"error": {"message": "Not Found", "http-code": 404}})
    );
}

#[tokio::test]
async fn test_invalid_status_code_route() {
    let response = get("/errors/1000").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "1000 is not a valid status code");
}

#[tokio::test]
async fn test_failure_is_mapped_with_cause() {
    let response = get("/fail").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "backing store unavailable");
    assert_eq!(body["error"]["http-code"], 500);
    assert_eq!(body["error"]["exception"]["class"], "demo::StoreUnavailable");
    assert_eq!(body["error"]["exception"]["cause"], "std::io::error::Error");
}

#[tokio::test]
async fn test_web_failure_keeps_status() {
    let response = get("/unavailable").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["http-code"], 503);
    assert_eq!(body["error"]["exception"]["class"], "web_application");
}

#[tokio::test]
async fn test_panic_is_mapped() {
    let response = get("/panic").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"]["exception"]["class"], "panic");
    assert_eq!(body["error"]["exception"]["message"], "requested panic");
    assert!(body["error"]["exception"].get("cause").is_none());
}

#[tokio::test]
async fn test_unknown_route_gets_envelope() {
    let response = get("/nowhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "no route for /nowhere");
}
