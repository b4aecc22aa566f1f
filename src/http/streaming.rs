//! Streaming JSON bodies.
//!
//! # Responsibilities
//! - Serialize a success entity off the request thread
//! - Hand the reader a [`BodySource`] before serialization starts
//! - Bound memory with a fixed-capacity pipe between worker and reader
//!
//! # Data Flow
//! ```text
//! StreamingEncoder::start(entity)
//!     → bounded pipe (pipe_capacity chunks)
//!     → detached worker thread: serde_json::to_writer → PipeWriter
//!     → BodySource (Stream<Item = io::Result<Bytes>>) → transport drains it
//! ```
//!
//! # State Transitions
//! ```text
//! Created → Writing → Completed   (entity fully written, pipe closed)
//! Created → Writing → Failed      (encoder or pipe error, logged once)
//! Created → Writing → Cancelled   (reader closed the BodySource first)
//! ```
//!
//! # Design Decisions
//! - One plain OS thread per body, never joined, so it cannot hold up exit
//! - The worker blocks when the pipe is full; closing the reader wakes it
//!   with a broken pipe so it terminates instead of waiting forever
//! - A failed stream ends with an error item, so the transport aborts the
//!   response instead of terminating a truncated body cleanly
//! - A panic in the entity's `Serialize` impl is caught on the worker and
//!   treated as a failure

use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Bytes;
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::config::StreamingConfig;
use crate::http::failure::Failure;
use crate::observability::metrics;
use crate::serializer::JsonSerializer;

/// Errors raised while starting a stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The worker thread could not be spawned.
    #[error("failed to spawn serialization worker: {0}")]
    Spawn(#[source] io::Error),
}

/// Lifecycle of a single streamed body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    Created,
    Writing,
    Completed,
    Failed,
    Cancelled,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Writing => "writing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Move to `next` unless a terminal state was already reached.
fn advance(state: &watch::Sender<StreamState>, next: StreamState) {
    state.send_if_modified(|current| {
        if current.is_terminal() || *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}

/// Read-only view of a stream's state, usable after the body is gone.
#[derive(Debug, Clone)]
pub struct StreamMonitor {
    state: watch::Receiver<StreamState>,
}

impl StreamMonitor {
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Wait until the worker reaches a terminal state.
    pub async fn wait_terminal(&mut self) -> StreamState {
        let waited = self.state.wait_for(|s| s.is_terminal()).await.map(|s| *s);
        match waited {
            Ok(state) => state,
            Err(_) => *self.state.borrow(),
        }
    }
}

type Chunk = io::Result<Bytes>;

/// Write end of the pipe, owned by the worker.
struct PipeWriter {
    tx: mpsc::Sender<Chunk>,
    buf: Vec<u8>,
    chunk_size: usize,
    sent: u64,
}

impl PipeWriter {
    fn new(tx: mpsc::Sender<Chunk>, chunk_size: usize) -> Self {
        Self {
            tx,
            buf: Vec::with_capacity(chunk_size),
            chunk_size,
            sent: 0,
        }
    }

    fn reader_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.buf, Vec::with_capacity(self.chunk_size));
        let len = chunk.len() as u64;
        self.tx
            .blocking_send(Ok(Bytes::from(chunk)))
            .map_err(|_| broken_pipe())?;
        self.sent += len;
        Ok(())
    }

    /// Hand over what was produced so far, then an error marking truncation.
    fn abort(&mut self, reason: String) {
        if self.send_buffered().is_ok() {
            let _ = self.tx.blocking_send(Err(io::Error::other(reason)));
        }
    }
}

impl Write for PipeWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.reader_closed() {
            return Err(broken_pipe());
        }
        self.buf.extend_from_slice(data);
        if self.buf.len() >= self.chunk_size {
            self.send_buffered()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}

fn broken_pipe() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "response body reader closed")
}

/// Starts background serialization of success entities.
#[derive(Debug, Clone)]
pub struct StreamingEncoder {
    serializer: Arc<JsonSerializer>,
    pipe_capacity: usize,
    chunk_size: usize,
    worker_name: String,
}

impl StreamingEncoder {
    pub fn new(serializer: Arc<JsonSerializer>, config: &StreamingConfig) -> Self {
        Self {
            serializer,
            pipe_capacity: config.pipe_capacity.max(1),
            chunk_size: config.chunk_size.max(1),
            worker_name: config.worker_name.clone(),
        }
    }

    /// Spawn a worker serializing `entity` and return the read end at once.
    ///
    /// The caller blocks only for pipe construction and the thread spawn.
    /// The worker inherits the caller's tracing dispatcher and current span.
    pub fn start<T>(&self, entity: T) -> Result<BodySource, StreamError>
    where
        T: Serialize + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.pipe_capacity);
        let (state_tx, state_rx) = watch::channel(StreamState::Created);
        let writer = PipeWriter::new(tx, self.chunk_size);
        let serializer = Arc::clone(&self.serializer);

        let dispatch = tracing::dispatcher::get_default(|d| d.clone());
        let span = tracing::Span::current();

        std::thread::Builder::new()
            .name(self.worker_name.clone())
            .spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    span.in_scope(|| write_entity(&serializer, &entity, writer, &state_tx))
                })
            })
            .map_err(StreamError::Spawn)?;

        Ok(BodySource {
            rx,
            monitor: StreamMonitor { state: state_rx },
        })
    }
}

fn write_entity<T: Serialize>(
    serializer: &JsonSerializer,
    entity: &T,
    mut writer: PipeWriter,
    state: &watch::Sender<StreamState>,
) {
    advance(state, StreamState::Writing);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        serializer
            .to_writer(&mut writer, entity)
            .and_then(|()| writer.flush().map_err(serde_json::Error::io))
    }));

    let outcome = match result {
        Ok(Ok(())) => StreamState::Completed,
        Ok(Err(_)) if writer.reader_closed() => {
            tracing::debug!(bytes_sent = writer.sent, "Response body closed before JSON stream completed");
            StreamState::Cancelled
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, bytes_sent = writer.sent, "Error streaming JSON response body");
            writer.abort(e.to_string());
            StreamState::Failed
        }
        Err(payload) => {
            let failure = Failure::from_panic(payload);
            tracing::error!(error = %failure, bytes_sent = writer.sent, "Entity panicked while streaming JSON response body");
            writer.abort(failure.to_string());
            StreamState::Failed
        }
    };

    metrics::record_stream_finished(outcome.as_str(), writer.sent);
    advance(state, outcome);
}

/// Read end of a streamed body.
///
/// Yields chunks in the order the worker wrote them. Ends cleanly only when
/// the entity was fully written; a failed stream ends with an `Err` item.
/// Dropping or closing it cancels the worker.
#[derive(Debug)]
pub struct BodySource {
    rx: mpsc::Receiver<Chunk>,
    monitor: StreamMonitor,
}

impl BodySource {
    pub fn state(&self) -> StreamState {
        self.monitor.state()
    }

    pub fn monitor(&self) -> StreamMonitor {
        self.monitor.clone()
    }

    /// Stop reading. A worker still writing fails its next write and exits.
    pub fn close(mut self) {
        self.rx.close();
    }

    /// Drain the whole body.
    pub async fn read_to_end(mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }
}

impl Stream for BodySource {
    type Item = Chunk;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::{Error as _, SerializeSeq, SerializeStruct, Serializer};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    fn encoder(pipe_capacity: usize, chunk_size: usize) -> StreamingEncoder {
        StreamingEncoder::new(
            Arc::new(JsonSerializer::default()),
            &StreamingConfig {
                pipe_capacity,
                chunk_size,
                worker_name: "json-stream-test".into(),
            },
        )
    }

    /// Serializes only once the test releases it.
    struct Gated(Mutex<std::sync::mpsc::Receiver<()>>);

    impl Serialize for Gated {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let gate = self.0.lock().map_err(|_| S::Error::custom("gate poisoned"))?;
            gate.recv().map_err(|_| S::Error::custom("gate dropped"))?;
            serializer.serialize_str("released")
        }
    }

    /// Writes one field and then fails.
    struct FailsMidway;

    impl Serialize for FailsMidway {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut s = serializer.serialize_struct("FailsMidway", 2)?;
            s.serialize_field("id", "x")?;
            Err(S::Error::custom("entity exploded"))
        }
    }

    /// Writes ten elements and then panics.
    struct PanicsPartway;

    impl Serialize for PanicsPartway {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(None)?;
            for n in 0..10 {
                seq.serialize_element(&n)?;
            }
            panic!("entity blew up partway");
        }
    }

    #[tokio::test]
    async fn test_round_trip_matches_direct_encoding() {
        let entity = json!({
            "id": "x",
            "items": (0..500).map(|i| json!({"n": i, "label": format!("item-{i}")})).collect::<Vec<_>>(),
        });
        let expected = serde_json::to_vec(&entity).unwrap();

        let source = encoder(2, 64).start(entity).unwrap();
        let mut monitor = source.monitor();
        let body = source.read_to_end().await.unwrap();

        assert_eq!(body, expected);
        assert_eq!(monitor.wait_terminal().await, StreamState::Completed);
    }

    #[tokio::test]
    async fn test_start_returns_before_serialization() {
        let (release, gate) = std::sync::mpsc::channel();
        let source = encoder(4, 1024).start(Gated(Mutex::new(gate))).unwrap();

        assert!(!source.state().is_terminal());

        release.send(()).unwrap();
        let body = source.read_to_end().await.unwrap();
        assert_eq!(body, br#""released""#);
    }

    #[tokio::test]
    async fn test_reader_may_start_late() {
        let source = encoder(1, 8).start(json!({"id": "x"})).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.read_to_end().await.unwrap(), br#"{"id":"x"}"#);
    }

    #[tokio::test]
    async fn test_close_cancels_blocked_worker() {
        let entity: Vec<String> = (0..100_000).map(|i| format!("row-{i}")).collect();
        let mut source = encoder(1, 32).start(entity).unwrap();
        let mut monitor = source.monitor();

        // Pipe holds one chunk; the worker is now blocked on backpressure.
        let first = source.next().await.unwrap().unwrap();
        assert!(!first.is_empty());
        source.close();

        let state = tokio::time::timeout(Duration::from_secs(5), monitor.wait_terminal())
            .await
            .expect("worker did not stop after the reader closed");
        assert_eq!(state, StreamState::Cancelled);
    }

    #[tokio::test]
    async fn test_drop_before_reading_cancels() {
        let entity: Vec<u64> = (0..200_000).collect();
        let source = encoder(1, 16).start(entity).unwrap();
        let mut monitor = source.monitor();
        drop(source);

        let state = tokio::time::timeout(Duration::from_secs(5), monitor.wait_terminal())
            .await
            .unwrap();
        assert_eq!(state, StreamState::Cancelled);
    }

    #[tokio::test]
    async fn test_failure_truncates_with_error() {
        let mut source = encoder(4, 1024).start(FailsMidway).unwrap();
        let mut monitor = source.monitor();

        let mut received = Vec::new();
        let mut saw_error = false;
        while let Some(chunk) = source.next().await {
            match chunk {
                Ok(bytes) => received.extend_from_slice(&bytes),
                Err(_) => {
                    saw_error = true;
                    break;
                }
            }
        }

        assert!(saw_error);
        assert!(!received.is_empty());
        assert!(serde_json::from_slice::<serde_json::Value>(&received).is_err());
        assert_eq!(monitor.wait_terminal().await, StreamState::Failed);
    }

    #[tokio::test]
    async fn test_panic_in_entity_fails_stream() {
        let mut source = encoder(4, 1024).start(PanicsPartway).unwrap();
        let mut monitor = source.monitor();

        let mut received = Vec::new();
        let mut error = None;
        while let Some(chunk) = source.next().await {
            match chunk {
                Ok(bytes) => received.extend_from_slice(&bytes),
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        }

        let error = error.expect("a panicking entity must end the body with an error");
        assert!(error.to_string().contains("entity blew up partway"));
        assert_eq!(received, b"[0,1,2,3,4,5,6,7,8,9");

        let state = tokio::time::timeout(Duration::from_secs(5), monitor.wait_terminal())
            .await
            .unwrap();
        assert_eq!(state, StreamState::Failed);
    }

    #[test]
    fn test_terminal_state_is_final() {
        let (tx, rx) = watch::channel(StreamState::Created);
        advance(&tx, StreamState::Writing);
        advance(&tx, StreamState::Cancelled);
        advance(&tx, StreamState::Completed);
        assert_eq!(*rx.borrow(), StreamState::Cancelled);
    }
}
