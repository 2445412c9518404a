//! WebSocket connector for the agent backend.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt, future};
use goku_core::{Connection, Connector, TransportError};
use tokio_tungstenite::tungstenite::{self, Message};

/// The backend's chat endpoint when run locally.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8000/ws/chat";

/// Dials a fixed WebSocket URL.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// Create a connector for the given `ws://` or `wss://` URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<Connection, TransportError> {
        let (socket, _response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let (sink, stream) = socket.split();

        let sink = sink
            .with(|text: String| {
                future::ready(Ok::<_, tungstenite::Error>(Message::Text(text.into())))
            })
            .sink_map_err(|e| TransportError::Protocol(e.to_string()));

        let stream = stream
            .take_while(|frame| future::ready(!matches!(frame, Ok(Message::Close(_)))))
            .filter_map(|frame| future::ready(text_frame(frame)));

        Ok(Connection::new(Box::pin(sink), stream.boxed()))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

fn text_frame(
    frame: Result<Message, tungstenite::Error>,
) -> Option<Result<String, TransportError>> {
    match frame {
        Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
        Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
            Ok(text) => Some(Ok(text)),
            Err(_) => {
                tracing::debug!("Ignoring non-UTF-8 binary frame");
                None
            }
        },
        Ok(_) => None,
        Err(e) => Some(Err(TransportError::Protocol(e.to_string()))),
    }
}
