//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the demo handlers
//! - Wire up middleware (tracing, timeout, panic catching, failure mapping)
//! - Bind server to listener
//! - Build the shared serializer, response builder and failure mapper once
//!
//! # Design Decisions
//! - Layer order, outermost first: trace → timeout → catch-panic →
//!   failure mapping → handler, so a panic never reaches the transport
//! - Unknown routes answer with an error envelope, not an empty 404

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::mapper::{map_failures, GlobalErrorMapper};
use crate::http::response::ResponseBuilder;
use crate::serializer::JsonSerializer;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub responses: ResponseBuilder,
}

/// HTTP server exposing the response subsystem.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Self {
        let serializer = Arc::new(JsonSerializer::new(&config.serializer));
        let responses = ResponseBuilder::new(serializer, &config.streaming);
        let mapper = Arc::new(GlobalErrorMapper::new(responses.clone()));

        let state = AppState { responses };
        let router = Self::build_router(&config, state, mapper);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState, mapper: Arc<GlobalErrorMapper>) -> Router {
        let panic_mapper = Arc::clone(&mapper);

        Router::new()
            .route("/status", get(handlers::status))
            .route("/echo", post(handlers::echo))
            .route("/empty", get(handlers::empty))
            .route("/errors/{code}", get(handlers::error_status))
            .route("/fail", get(handlers::fail))
            .route("/unavailable", get(handlers::unavailable))
            .route("/panic", get(handlers::panic))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(middleware::map_response_with_state(mapper, map_failures))
            .layer(CatchPanicLayer::custom(
                move |payload: Box<dyn std::any::Any + Send + 'static>| {
                    panic_mapper.handle_panic(payload)
                },
            ))
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The configured router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
