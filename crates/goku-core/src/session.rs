//! Client-side session state machine.
//!
//! A [`Session`] is the aggregate the dashboard renders: the conversation
//! transcript, the side activity log, and connectivity. Events are applied
//! one at a time; every mutation goes through the methods here, so entries
//! are only ever appended, with one exception: a `chunk` extends the text of
//! the last transcript entry when that entry is agent-authored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::event::{InboundEvent, OutboundEvent, PlanTask};

/// Session identifier, used to correlate log lines.
pub type SessionId = Uuid;

/// Connectivity of the session channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
}

/// One turn in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Position in the transcript.
    pub ordinal: usize,
}

/// One entry of the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityEntry {
    Thought { content: String },
    ToolCall { name: String, args: Value },
    ToolResult { name: String, result: Value },
}

/// What applying an event did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// An entry was appended to the activity log.
    Activity,
    /// A new message was appended to the transcript.
    Appended,
    /// The last agent message grew.
    Extended,
    /// The plan was replaced.
    PlanReplaced,
    /// The backend notice changed.
    Notice,
    /// The event had no effect.
    Ignored,
}

/// Client-side aggregate for one running client instance.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    id: SessionId,
    status: ConnectionStatus,
    transcript: Vec<Message>,
    activity: Vec<ActivityEntry>,
    sending: bool,
    current_thought: Option<String>,
    plan: Vec<PlanTask>,
    notice: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty, disconnected session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: ConnectionStatus::Disconnected,
            transcript: Vec::new(),
            activity: Vec::new(),
            sending: false,
            current_thought: None,
            plan: Vec::new(),
            notice: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub const fn status(&self) -> ConnectionStatus {
        self.status
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    #[must_use]
    pub fn activity(&self) -> &[ActivityEntry] {
        &self.activity
    }

    /// Whether a user turn is awaiting its response.
    #[must_use]
    pub const fn is_sending(&self) -> bool {
        self.sending
    }

    /// Latest thought of the in-flight turn, cleared when the turn completes.
    #[must_use]
    pub fn current_thought(&self) -> Option<&str> {
        self.current_thought.as_deref()
    }

    #[must_use]
    pub fn plan(&self) -> &[PlanTask] {
        &self.plan
    }

    /// Last notice from the backend.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Record a user turn before it reaches the backend.
    ///
    /// The append is never rolled back, even if the frame is later dropped.
    pub fn begin_send(&mut self, content: impl Into<String>) -> OutboundEvent {
        let content = content.into();
        self.push_message(Role::User, content.clone());
        self.sending = true;
        OutboundEvent::Message { content }
    }

    /// Apply one inbound event.
    pub fn apply(&mut self, event: InboundEvent) -> Effect {
        match event {
            InboundEvent::Thought { content } => {
                self.current_thought = Some(content.clone());
                self.activity.push(ActivityEntry::Thought { content });
                Effect::Activity
            }
            InboundEvent::ToolCall { name, args } => {
                self.activity.push(ActivityEntry::ToolCall { name, args });
                Effect::Activity
            }
            InboundEvent::ToolResult { name, result } => {
                self.activity.push(ActivityEntry::ToolResult { name, result });
                Effect::Activity
            }
            InboundEvent::Message { content } => {
                self.push_message(Role::Agent, content);
                self.current_thought = None;
                self.sending = false;
                Effect::Appended
            }
            InboundEvent::Error { content } => {
                self.push_message(Role::Agent, format!("Error: {content}"));
                self.sending = false;
                Effect::Appended
            }
            InboundEvent::Chunk { content } => match self.transcript.last_mut() {
                Some(last) if last.role == Role::Agent => {
                    last.content.push_str(&content);
                    Effect::Extended
                }
                _ => {
                    self.push_message(Role::Agent, content);
                    Effect::Appended
                }
            },
            InboundEvent::Status { content } => {
                self.notice = Some(content);
                Effect::Notice
            }
            InboundEvent::TaskUpdate { tasks } => {
                self.plan = tasks;
                Effect::PlanReplaced
            }
            InboundEvent::Unknown { .. } => Effect::Ignored,
        }
    }

    pub fn mark_connecting(&mut self) {
        self.status = ConnectionStatus::Connecting;
    }

    pub fn mark_connected(&mut self) {
        self.status = ConnectionStatus::Connected;
    }

    /// Record channel loss. Any outstanding request is abandoned.
    pub fn mark_disconnected(&mut self) {
        self.status = ConnectionStatus::Disconnected;
        self.sending = false;
    }

    fn push_message(&mut self, role: Role, content: String) {
        let ordinal = self.transcript.len();
        self.transcript.push(Message {
            role,
            content,
            ordinal,
        });
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::event::TaskStatus;

    fn agent(content: &str) -> InboundEvent {
        InboundEvent::Message {
            content: content.into(),
        }
    }

    fn chunk(content: &str) -> InboundEvent {
        InboundEvent::Chunk {
            content: content.into(),
        }
    }

    fn contents(session: &Session) -> Vec<(Role, &str)> {
        session
            .transcript()
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect()
    }

    #[test]
    fn test_new_session_is_disconnected_and_empty() {
        let session = Session::new();
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
        assert!(session.transcript().is_empty());
        assert!(session.activity().is_empty());
        assert!(!session.is_sending());
    }

    #[test]
    fn test_send_then_reply() {
        let mut session = Session::new();
        session.mark_connected();

        let outbound = session.begin_send("hello");
        assert_eq!(outbound, OutboundEvent::message("hello"));
        assert!(session.is_sending());

        assert_eq!(session.apply(agent("hi there")), Effect::Appended);
        assert_eq!(
            contents(&session),
            vec![(Role::User, "hello"), (Role::Agent, "hi there")]
        );
        assert!(!session.is_sending());
    }

    #[test]
    fn test_chunks_without_prior_agent_message_build_one_entry() {
        let mut session = Session::new();
        assert_eq!(session.apply(chunk("A")), Effect::Appended);
        assert_eq!(session.apply(chunk("B")), Effect::Extended);
        assert_eq!(session.apply(chunk("C")), Effect::Extended);

        assert_eq!(contents(&session), vec![(Role::Agent, "ABC")]);
    }

    #[test]
    fn test_chunk_after_user_message_starts_new_agent_entry() {
        let mut session = Session::new();
        session.apply(agent("earlier"));
        session.begin_send("next question");
        session.apply(chunk("Ans"));
        session.apply(chunk("wer"));

        assert_eq!(
            contents(&session),
            vec![
                (Role::Agent, "earlier"),
                (Role::User, "next question"),
                (Role::Agent, "Answer"),
            ]
        );
        // Streaming alone does not finish the turn.
        assert!(session.is_sending());
    }

    #[test]
    fn test_chunk_extends_completed_agent_message() {
        let mut session = Session::new();
        session.apply(agent("Hello"));
        assert_eq!(session.apply(chunk(", world")), Effect::Extended);
        assert_eq!(contents(&session), vec![(Role::Agent, "Hello, world")]);
    }

    #[test]
    fn test_tool_call_and_result_stay_separate() {
        let mut session = Session::new();
        session.apply(InboundEvent::ToolCall {
            name: "search".into(),
            args: json!({"q": "x"}),
        });
        session.apply(InboundEvent::ToolResult {
            name: "search".into(),
            result: json!("3 hits"),
        });

        assert_eq!(
            session.activity(),
            &[
                ActivityEntry::ToolCall {
                    name: "search".into(),
                    args: json!({"q": "x"}),
                },
                ActivityEntry::ToolResult {
                    name: "search".into(),
                    result: json!("3 hits"),
                },
            ]
        );
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_thought_sets_current_thought_until_message() {
        let mut session = Session::new();
        session.begin_send("do it");
        session.apply(InboundEvent::Thought {
            content: "Routing to best model".into(),
        });
        assert_eq!(session.current_thought(), Some("Routing to best model"));
        assert_eq!(session.activity().len(), 1);

        session.apply(agent("done"));
        assert_eq!(session.current_thought(), None);
        // The logged thought survives.
        assert_eq!(session.activity().len(), 1);
    }

    #[test]
    fn test_error_becomes_agent_message() {
        let mut session = Session::new();
        session.begin_send("run");
        session.apply(InboundEvent::Error {
            content: "rate limited".into(),
        });

        assert_eq!(
            contents(&session),
            vec![(Role::User, "run"), (Role::Agent, "Error: rate limited")]
        );
        assert!(!session.is_sending());
    }

    #[test]
    fn test_disconnect_abandons_in_flight_request() {
        let mut session = Session::new();
        session.mark_connected();
        session.begin_send("hello");

        session.mark_disconnected();
        assert_eq!(session.status(), ConnectionStatus::Disconnected);
        assert!(!session.is_sending());
        assert_eq!(contents(&session), vec![(Role::User, "hello")]);
    }

    #[test]
    fn test_status_and_plan() {
        let mut session = Session::new();
        session.begin_send("plan a trip");
        let tasks = vec![PlanTask {
            desc: "book flight".into(),
            status: TaskStatus::Todo,
        }];
        assert_eq!(
            session.apply(InboundEvent::TaskUpdate {
                tasks: tasks.clone()
            }),
            Effect::PlanReplaced
        );
        assert_eq!(session.plan(), tasks.as_slice());

        assert_eq!(
            session.apply(InboundEvent::Status {
                content: "Action Terminated".into()
            }),
            Effect::Notice
        );
        assert_eq!(session.notice(), Some("Action Terminated"));
        assert!(session.transcript().len() == 1 && session.is_sending());
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let mut session = Session::new();
        session.begin_send("x");
        let before = contents(&session).len();
        assert_eq!(
            session.apply(InboundEvent::Unknown {
                kind: "heartbeat".into()
            }),
            Effect::Ignored
        );
        assert_eq!(contents(&session).len(), before);
        assert!(session.is_sending());
    }

    #[test]
    fn test_ordinals_follow_position() {
        let mut session = Session::new();
        session.begin_send("a");
        session.apply(chunk("b"));
        session.apply(InboundEvent::Error {
            content: "c".into(),
        });
        let ordinals: Vec<_> = session.transcript().iter().map(|m| m.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
    }

    fn arb_event() -> impl Strategy<Value = InboundEvent> {
        let text = "[a-z]{0,6}";
        prop_oneof![
            text.prop_map(|content| InboundEvent::Thought { content }),
            text.prop_map(|name| InboundEvent::ToolCall {
                name,
                args: json!({})
            }),
            text.prop_map(|name| InboundEvent::ToolResult {
                name,
                result: Value::Null
            }),
            text.prop_map(|content| InboundEvent::Message { content }),
            text.prop_map(|content| InboundEvent::Chunk { content }),
            text.prop_map(|content| InboundEvent::Error { content }),
            text.prop_map(|kind| InboundEvent::Unknown { kind }),
        ]
    }

    proptest! {
        #[test]
        fn prop_logs_only_grow(events in prop::collection::vec(arb_event(), 0..40)) {
            let mut session = Session::new();
            for event in events {
                let before = session.clone();
                let is_chunk = matches!(event, InboundEvent::Chunk { .. });
                session.apply(event);

                // Activity log: earlier entries untouched.
                prop_assert!(session.activity().len() >= before.activity().len());
                prop_assert_eq!(&session.activity()[..before.activity().len()], before.activity());

                // Transcript: earlier entries untouched, except that a chunk
                // may extend the text of a trailing agent entry.
                let old = before.transcript();
                let new = session.transcript();
                prop_assert!(new.len() >= old.len());
                if let Some((last, rest)) = old.split_last() {
                    prop_assert_eq!(&new[..rest.len()], rest);
                    let updated = &new[rest.len()];
                    if is_chunk && last.role == Role::Agent {
                        prop_assert!(updated.content.starts_with(&last.content));
                        prop_assert_eq!(new.len(), old.len());
                    } else {
                        prop_assert_eq!(updated, last);
                    }
                }
            }
        }
    }
}
