//! Transport seam between the session channel and a concrete socket.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Sink, stream::BoxStream};
use thiserror::Error;

/// Transport error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connect failed: {0}")]
    Connect(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Connection closed")]
    Closed,
}

/// Outgoing half of a connection. Frames are JSON text.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;

/// Incoming half of a connection. Ends when the peer goes away.
pub type FrameStream = BoxStream<'static, Result<String, TransportError>>;

/// An open, ordered, bidirectional text channel.
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Connection {
    #[must_use]
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }
}

/// Opens connections to one fixed backend endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection.
    async fn connect(&self) -> Result<Connection, TransportError>;

    /// Endpoint this connector dials, for logging.
    fn endpoint(&self) -> &str;
}
