//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (capacities > 0, chunk sizes bounded)
//! - Check the bind address and log level are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// Largest accepted chunk size (1 MiB).
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("server.request_timeout_secs must be at least 1")]
    ZeroRequestTimeout,

    #[error("streaming.pipe_capacity must be at least 1")]
    ZeroPipeCapacity,

    #[error("streaming.chunk_size {0} is outside 1..=1048576")]
    ChunkSizeOutOfRange(usize),

    #[error("streaming.worker_name must not be empty")]
    EmptyWorkerName,

    #[error("observability.log_level `{0}` is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.server.bind_address.clone(),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.streaming.pipe_capacity == 0 {
        errors.push(ValidationError::ZeroPipeCapacity);
    }
    if !(1..=MAX_CHUNK_SIZE).contains(&config.streaming.chunk_size) {
        errors.push(ValidationError::ChunkSizeOutOfRange(config.streaming.chunk_size));
    }
    if config.streaming.worker_name.trim().is_empty() {
        errors.push(ValidationError::EmptyWorkerName);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
