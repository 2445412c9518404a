//! Core abstractions for the Goku agent client.
//!
//! This crate provides the fundamental building blocks:
//! - `InboundEvent` / `OutboundEvent` - The wire protocol
//! - `Session` - Transcript, activity log and connectivity state machine
//! - `Connector` - Trait seam for the transport

pub mod event;
pub mod session;
pub mod traits;

pub use event::{DecodeError, InboundEvent, OutboundEvent, PlanTask, TaskStatus};
pub use session::{ActivityEntry, ConnectionStatus, Effect, Message, Role, Session, SessionId};
pub use traits::{Connection, Connector, FrameSink, FrameStream, TransportError};
