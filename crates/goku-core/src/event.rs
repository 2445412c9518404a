//! Wire protocol between the client and the agent backend.
//!
//! Every frame is a JSON object discriminated by its `type` field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event received from the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Intermediate reasoning step.
    Thought { content: String },
    /// The agent invoked a tool.
    ToolCall { name: String, args: Value },
    /// A tool returned. Correlated with its call by `name` only.
    ToolResult { name: String, result: Value },
    /// A complete agent turn.
    Message { content: String },
    /// Incremental piece of a streamed agent turn.
    Chunk { content: String },
    /// Backend-reported failure.
    Error { content: String },
    /// Backend notice, e.g. the acknowledgement of a stop request.
    Status { content: String },
    /// The agent's current plan, replacing any earlier one.
    TaskUpdate { tasks: Vec<PlanTask> },
    /// Well-formed frame of a kind this client does not handle.
    Unknown { kind: String },
}

/// One step of the agent's plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTask {
    pub desc: String,
    #[serde(default)]
    pub status: TaskStatus,
}

/// Progress of a plan step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    #[serde(other)]
    Unknown,
}

/// Frame that could not be turned into an [`InboundEvent`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame has no string `type` field")]
    MissingType,
    #[error("malformed `{kind}` event: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    Thought {
        content: String,
    },
    ToolCall {
        name: String,
        #[serde(default = "empty_object")]
        args: Value,
    },
    ToolResult {
        name: String,
        #[serde(default)]
        content: Value,
    },
    Message {
        content: String,
    },
    Content {
        #[serde(default)]
        role: Option<String>,
        content: String,
    },
    Chunk {
        content: String,
    },
    Error {
        content: String,
    },
    Status {
        content: String,
    },
    TaskUpdate {
        #[serde(default)]
        tasks: Vec<PlanTask>,
    },
    #[serde(other)]
    Unknown,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl InboundEvent {
    /// Decode a text frame.
    ///
    /// Unknown event kinds decode successfully to [`InboundEvent::Unknown`];
    /// only frames that are not JSON objects with a `type`, or known kinds
    /// missing required fields, are errors.
    ///
    /// # Errors
    /// Returns [`DecodeError`] if the frame cannot be interpreted.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(text)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingType)?
            .to_owned();

        let wire: WireEvent =
            serde_json::from_value(value).map_err(|source| DecodeError::Malformed {
                kind: kind.clone(),
                source,
            })?;

        Ok(match wire {
            WireEvent::Thought { content } => Self::Thought { content },
            WireEvent::ToolCall { name, args } => Self::ToolCall { name, args },
            WireEvent::ToolResult { name, content } => Self::ToolResult {
                name,
                result: content,
            },
            WireEvent::Message { content } => Self::Message { content },
            WireEvent::Content { role, content } if role.as_deref() == Some("agent") => {
                Self::Message { content }
            }
            WireEvent::Content { .. } | WireEvent::Unknown => Self::Unknown { kind },
            WireEvent::Chunk { content } => Self::Chunk { content },
            WireEvent::Error { content } => Self::Error { content },
            WireEvent::Status { content } => Self::Status { content },
            WireEvent::TaskUpdate { tasks } => Self::TaskUpdate { tasks },
        })
    }

    /// The wire `type` tag this event was decoded from.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Thought { .. } => "thought",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Message { .. } => "message",
            Self::Chunk { .. } => "chunk",
            Self::Error { .. } => "error",
            Self::Status { .. } => "status",
            Self::TaskUpdate { .. } => "task_update",
            Self::Unknown { kind } => kind,
        }
    }
}

/// Event sent from the client to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// A user turn.
    Message { content: String },
    /// Ask the backend to terminate the current action.
    Stop,
}

impl OutboundEvent {
    /// Create a user message.
    #[must_use]
    pub fn message(content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
        }
    }

    /// Serialize to a text frame.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
