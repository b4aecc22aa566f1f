//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the response
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the response service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings for the demo binary.
    pub server: ServerConfig,

    /// Streaming body pipe settings.
    pub streaming: StreamingConfig,

    /// Shared JSON serializer options.
    pub serializer: SerializerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout applied by the transport layer, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Streaming body configuration.
///
/// The pipe between a serialization worker and the response reader holds at
/// most `pipe_capacity` chunks. The worker hands a chunk over once at least
/// `chunk_size` bytes are buffered.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Number of chunks the pipe buffers before the worker blocks.
    pub pipe_capacity: usize,

    /// Chunk size in bytes.
    pub chunk_size: usize,

    /// Thread name given to serialization workers.
    pub worker_name: String,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            pipe_capacity: 16,
            chunk_size: 8 * 1024,
            worker_name: "json-stream".to_string(),
        }
    }
}

/// JSON serializer options.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SerializerConfig {
    /// Emit indented JSON.
    pub pretty: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
