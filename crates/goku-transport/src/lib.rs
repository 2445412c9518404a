//! Transport layer for the Goku agent client.
//!
//! Provides:
//! - Session channel with fixed-delay reconnection
//! - WebSocket connector (feature: websocket)

pub mod channel;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use channel::{ChannelConfig, ChannelError, DEFAULT_RECONNECT_DELAY, SessionHandle, spawn};

#[cfg(feature = "websocket")]
pub use websocket::{DEFAULT_ENDPOINT, WsConnector};
