//! Shared JSON serializer configuration.
//!
//! # Design Decisions
//! - Built once at start-up and shared via `Arc`; never mutated afterwards
//! - Honoured by streamed success bodies and error envelopes. The failure
//!   mapper deliberately bypasses it and writes compact JSON on its own.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::config::SerializerConfig;

/// Read-only JSON encoder settings.
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    pub fn new(config: &SerializerConfig) -> Self {
        Self {
            pretty: config.pretty,
        }
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    /// Encode `value` incrementally into `writer`.
    pub fn to_writer<W, T>(&self, writer: W, value: &T) -> serde_json::Result<()>
    where
        W: Write,
        T: Serialize + ?Sized,
    {
        if self.pretty {
            serde_json::to_writer_pretty(writer, value)
        } else {
            serde_json::to_writer(writer, value)
        }
    }

    /// Encode `value` into a byte buffer.
    pub fn to_vec<T>(&self, value: &T) -> serde_json::Result<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
    }

    /// Snapshot `value` as a JSON tree.
    pub fn to_value<T>(&self, value: &T) -> serde_json::Result<Value>
    where
        T: Serialize + ?Sized,
    {
        serde_json::to_value(value)
    }
}
