//! Collector that turns a conversation's event stream into [`TraceContent`].

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::canonicalizer::CanonicalizationError;
use crate::identifiers::{SessionId, Timestamp};
use crate::record::{Event, ModelInfo, Session, TraceContent, Usage, TRACE_VERSION};

/// Text-carrying event kinds accepted as raw bytes from collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEvent {
    /// Human message.
    Human,
    /// AI message.
    Ai,
    /// Tool output.
    ToolResult {
        /// Tool name.
        tool: String,
        /// Optional call identifier.
        tool_call_id: Option<String>,
    },
}

/// Collects events for one session.
///
/// A builder is created per conversation and handed to whatever produces
/// events; there is no process-wide collector.
#[derive(Debug, Clone)]
pub struct TraceBuilder {
    session_id: SessionId,
    created_at: Timestamp,
    events: Vec<Event>,
    usage: Vec<Usage>,
    actors: BTreeSet<String>,
    model: Option<ModelInfo>,
}

impl TraceBuilder {
    /// Starts a trace for `session_id`, or a freshly generated id.
    pub fn new(session_id: Option<SessionId>) -> Self {
        let actors = ["user", "assistant"].iter().map(|a| a.to_string()).collect();
        Self {
            session_id: session_id.unwrap_or_else(Self::generate_session_id),
            created_at: Timestamp::now(),
            events: Vec::new(),
            usage: Vec::new(),
            actors,
            model: None,
        }
    }

    /// Generates `session-<12 hex chars>`.
    pub fn generate_session_id() -> SessionId {
        let id = uuid::Uuid::new_v4().simple().to_string();
        SessionId::new(format!("session-{}", &id[..12]))
    }

    /// Overrides the session creation time.
    pub fn created_at(mut self, ts: Timestamp) -> Self {
        self.created_at = ts;
        self
    }

    /// Session identifier of the trace being built.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Records the model. The first reported model wins.
    pub fn model(&mut self, name: impl Into<String>, provider: impl Into<String>) -> &mut Self {
        if self.model.is_none() {
            self.model = Some(ModelInfo {
                name: name.into(),
                provider: provider.into(),
            });
        }
        self
    }

    /// Appends a human message.
    pub fn human_message(&mut self, ts: Timestamp, content: impl Into<String>) -> &mut Self {
        self.events.push(Event::HumanMessage {
            ts,
            content: content.into(),
        });
        self
    }

    /// Appends an AI message. Empty messages (tool-call-only turns) are skipped.
    pub fn ai_message(&mut self, ts: Timestamp, content: impl Into<String>) -> &mut Self {
        let content = content.into();
        if !content.is_empty() {
            self.events.push(Event::AiMessage { ts, content });
        }
        self
    }

    /// Appends a tool call and registers the tool as an actor.
    pub fn tool_call(
        &mut self,
        ts: Timestamp,
        tool: impl Into<String>,
        args: Map<String, Value>,
        tool_call_id: Option<String>,
    ) -> &mut Self {
        let tool = tool.into();
        self.actors.insert(format!("tool:{}", tool));
        self.events.push(Event::AiToolCall {
            ts,
            tool,
            args,
            tool_call_id,
        });
        self
    }

    /// Appends a tool result and registers the tool as an actor.
    pub fn tool_result(
        &mut self,
        ts: Timestamp,
        tool: impl Into<String>,
        content: impl Into<String>,
        tool_call_id: Option<String>,
    ) -> &mut Self {
        let tool = tool.into();
        self.actors.insert(format!("tool:{}", tool));
        self.events.push(Event::ToolResult {
            ts,
            tool,
            content: content.into(),
            tool_call_id,
        });
        self
    }

    /// Appends a text event whose payload arrives as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError::InvalidUtf8`] when `payload` is not
    /// UTF-8; nothing is appended in that case.
    pub fn push_bytes(
        &mut self,
        kind: TextEvent,
        ts: Timestamp,
        payload: &[u8],
    ) -> Result<&mut Self, CanonicalizationError> {
        let text = std::str::from_utf8(payload).map_err(|err| {
            CanonicalizationError::InvalidUtf8 {
                event: self.events.len(),
                reason: err.to_string(),
            }
        })?;
        Ok(match kind {
            TextEvent::Human => self.human_message(ts, text),
            TextEvent::Ai => self.ai_message(ts, text),
            TextEvent::ToolResult { tool, tool_call_id } => {
                self.tool_result(ts, tool, text, tool_call_id)
            }
        })
    }

    /// Records token usage for the next turn.
    pub fn record_usage(&mut self, input_tokens: u64, output_tokens: u64) -> &mut Self {
        self.usage.push(Usage {
            turn: next_turn(self.usage.len()),
            input_tokens,
            output_tokens,
        });
        self
    }

    /// Number of events collected so far.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Finishes the trace.
    pub fn build(self) -> TraceContent {
        TraceContent {
            trace_version: TRACE_VERSION.to_string(),
            session: Session {
                id: self.session_id,
                created_at: self.created_at,
                actors: self.actors.into_iter().collect(),
            },
            model: self.model.unwrap_or_else(ModelInfo::unknown),
            events: self.events,
            usage: self.usage,
        }
    }
}

/// One-based turn number following `len` recorded turns, saturating at `u32::MAX`.
fn next_turn(len: usize) -> u32 {
    u32::try_from(len).map_or(u32::MAX, |n| n.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts() -> Timestamp {
        Timestamp::parse("2025-01-01T00:00:00Z").unwrap()
    }

    #[test]
    fn generated_session_ids_have_expected_shape() {
        let id = TraceBuilder::generate_session_id();
        assert!(id.as_str().starts_with("session-"));
        assert_eq!(id.as_str().len(), "session-".len() + 12);
        assert!(SessionId::parse(id.as_str()).is_ok());
    }

    #[test]
    fn tools_become_sorted_actors() {
        let mut builder = TraceBuilder::new(Some(SessionId::new("s1")));
        builder
            .tool_call(ts(), "weather", json!({"city": "Oslo"}).as_object().unwrap().clone(), Some("c1".into()))
            .tool_result(ts(), "calculator", "42", None);
        let content = builder.build();
        assert_eq!(
            content.session.actors,
            vec!["assistant", "tool:calculator", "tool:weather", "user"]
        );
    }

    #[test]
    fn usage_turns_are_numbered_from_one() {
        let mut builder = TraceBuilder::new(None);
        builder.record_usage(10, 5).record_usage(7, 3);
        let content = builder.build();
        assert_eq!(content.usage[0].turn, 1);
        assert_eq!(content.usage[1].turn, 2);
        assert_eq!(content.total_tokens(), (17, 8));
    }

    #[test]
    fn turn_numbers_saturate() {
        assert_eq!(next_turn(0), 1);
        assert_eq!(next_turn(41), 42);
        assert_eq!(next_turn(u32::MAX as usize - 1), u32::MAX);
        assert_eq!(next_turn(u32::MAX as usize), u32::MAX);
        assert_eq!(next_turn(usize::MAX), u32::MAX);
    }

    #[test]
    fn token_totals_saturate_on_huge_usage() {
        let mut builder = TraceBuilder::new(None);
        builder
            .record_usage(u64::MAX - 1, 3)
            .record_usage(5, u64::MAX)
            .record_usage(1, 1);
        assert_eq!(builder.build().total_tokens(), (u64::MAX, u64::MAX));
    }

    #[test]
    fn first_model_wins_and_default_is_unknown() {
        let content = TraceBuilder::new(None).build();
        assert_eq!(content.model, ModelInfo::unknown());

        let mut builder = TraceBuilder::new(None);
        builder.model("model-a", "acme").model("model-b", "other");
        assert_eq!(builder.build().model.name, "model-a");
    }

    #[test]
    fn empty_ai_messages_are_skipped() {
        let mut builder = TraceBuilder::new(None);
        builder.ai_message(ts(), "").ai_message(ts(), "hi");
        assert_eq!(builder.event_count(), 1);
    }

    #[test]
    fn non_utf8_payload_is_rejected() {
        let mut builder = TraceBuilder::new(None);
        builder.human_message(ts(), "ok");
        let err = builder
            .push_bytes(TextEvent::Human, ts(), &[0x66, 0xff, 0xfe])
            .unwrap_err();
        assert!(matches!(err, CanonicalizationError::InvalidUtf8 { event: 1, .. }));
        assert_eq!(builder.event_count(), 1);
    }
}
