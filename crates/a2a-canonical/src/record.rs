use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identifiers::{SessionId, Timestamp};

/// Version tag of the trace document format.
pub const TRACE_VERSION: &str = "a2a-0.1";

fn default_trace_version() -> String {
    TRACE_VERSION.to_string()
}

/// Session metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// Creation time of the session.
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    /// Actor names, sorted and de-duplicated.
    pub actors: Vec<String>,
}

/// Model that produced the AI turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name (also used as the ledger model tag).
    pub name: String,
    /// Provider name.
    pub provider: String,
}

impl ModelInfo {
    /// Placeholder used when the conversation layer reports no model.
    pub fn unknown() -> Self {
        Self {
            name: "unknown".to_string(),
            provider: "unknown".to_string(),
        }
    }
}

/// One entry of the execution trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Message written by the human participant.
    HumanMessage {
        /// Event time.
        ts: Timestamp,
        /// Message text.
        content: String,
    },
    /// Message written by the model.
    AiMessage {
        /// Event time.
        ts: Timestamp,
        /// Message text.
        content: String,
    },
    /// Tool invocation requested by the model.
    AiToolCall {
        /// Event time.
        ts: Timestamp,
        /// Tool name.
        tool: String,
        /// Tool arguments as a JSON object.
        #[serde(default)]
        args: Map<String, Value>,
        /// Call identifier linking the call to its result.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<String>,
    },
    /// Output returned by a tool.
    ToolResult {
        /// Event time.
        ts: Timestamp,
        /// Tool name.
        tool: String,
        /// Tool output text.
        content: String,
        /// Call identifier linking the result to its call.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<String>,
    },
}

impl Event {
    /// Stable type tag as written in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::HumanMessage { .. } => "human_message",
            Event::AiMessage { .. } => "ai_message",
            Event::AiToolCall { .. } => "ai_tool_call",
            Event::ToolResult { .. } => "tool_result",
        }
    }

    /// Event time.
    pub fn ts(&self) -> &Timestamp {
        match self {
            Event::HumanMessage { ts, .. }
            | Event::AiMessage { ts, .. }
            | Event::AiToolCall { ts, .. }
            | Event::ToolResult { ts, .. } => ts,
        }
    }
}

/// Token usage of one model turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Turn number, starting at 1.
    pub turn: u32,
    /// Prompt tokens.
    pub input_tokens: u64,
    /// Completion tokens.
    pub output_tokens: u64,
}

/// Content-bearing part of a trace: the only fields that are hashed.
///
/// Deserializing a full trace document into this type drops `hashing`,
/// `signatures`, `redactions` and any extension fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceContent {
    /// Format version tag.
    #[serde(rename = "traceVersion", default = "default_trace_version")]
    pub trace_version: String,
    /// Session metadata.
    pub session: Session,
    /// Model information.
    pub model: ModelInfo,
    /// Ordered events.
    pub events: Vec<Event>,
    /// Ordered per-turn usage.
    #[serde(default)]
    pub usage: Vec<Usage>,
}

impl TraceContent {
    /// Sum of input and output tokens across all turns.
    pub fn total_tokens(&self) -> (u64, u64) {
        self.usage.iter().fold((0, 0), |(i, o), u| {
            (
                i.saturating_add(u.input_tokens),
                o.saturating_add(u.output_tokens),
            )
        })
    }
}

fn default_redaction_policy() -> String {
    "pii_mask".to_string()
}

/// Redaction policy applied before the trace was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redactions {
    /// Policy tag.
    #[serde(default = "default_redaction_policy")]
    pub policy: String,
    /// Names of masked fields.
    #[serde(default)]
    pub masked_fields: Vec<String>,
}

impl Default for Redactions {
    fn default() -> Self {
        Self {
            policy: default_redaction_policy(),
            masked_fields: Vec::new(),
        }
    }
}

fn default_signature_spec() -> String {
    "EIP-191-like".to_string()
}

/// Actor signature over a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Signing actor.
    pub actor: String,
    /// Signer address.
    pub address: String,
    /// Signature scheme tag.
    #[serde(default = "default_signature_spec")]
    pub spec: String,
    /// Signature value, absent until signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}
