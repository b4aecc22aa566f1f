//! Streaming JSON response construction and error envelopes.

pub mod config;
pub mod http;
pub mod observability;
pub mod serializer;

pub use config::schema::ServiceConfig;
pub use http::{Failure, GlobalErrorMapper, HttpServer, JsonResponse, Outcome, ResponseBuilder};
pub use serializer::JsonSerializer;
