// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the Hearth crates.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Returns the current time as an RFC 3339 UTC string with millisecond precision.
///
/// The fixed-width format sorts lexicographically, so it is safe to compare
/// timestamps as strings in SQL (`created_at >= ?`).
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Author of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Kind of persisted message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    ToolCall,
    ToolResult,
    /// Boundary marker in a task run log.
    Marker,
}

/// Content of the marker message that opens a subagent run.
pub const RUN_START_MARKER: &str = "run_start";

/// One logical conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub chat_id: String,
    /// Lower bound (inclusive) of the active history segment.
    pub segment_start: String,
    /// Model key (`provider/model`) bound to this conversation.
    pub model: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A persisted message row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Monotonic row id; the authoritative ordering key.
    pub row_id: i64,
    pub chat_id: String,
    pub role: Role,
    pub message_type: MessageType,
    pub content: String,
    /// Tool-call id for `tool_call` / `tool_result` rows.
    pub metadata: Option<String>,
    pub created_at: String,
}

/// A message about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub chat_id: String,
    pub role: Role,
    pub message_type: MessageType,
    pub content: String,
    pub metadata: Option<String>,
}

impl NewMessage {
    /// Plain text message.
    pub fn text(chat_id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            role,
            message_type: MessageType::Text,
            content: content.into(),
            metadata: None,
        }
    }

    /// Assistant tool-call message. Content is `{"name", "arguments"}` JSON.
    pub fn tool_call(chat_id: impl Into<String>, call: &ToolCall) -> Self {
        let content = serde_json::json!({
            "name": call.name,
            "arguments": call.arguments,
        })
        .to_string();
        Self {
            chat_id: chat_id.into(),
            role: Role::Assistant,
            message_type: MessageType::ToolCall,
            content,
            metadata: Some(call.id.clone()),
        }
    }

    /// Tool result message.
    pub fn tool_result(chat_id: impl Into<String>, result: &ToolResult) -> Self {
        Self {
            chat_id: chat_id.into(),
            role: Role::Tool,
            message_type: MessageType::ToolResult,
            content: result.content.clone(),
            metadata: Some(result.call_id.clone()),
        }
    }

    /// Run boundary marker.
    pub fn marker(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            role: Role::System,
            message_type: MessageType::Marker,
            content: RUN_START_MARKER.to_string(),
            metadata: None,
        }
    }
}

/// Inbound envelope received from the chat front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEnvelope {
    pub id: String,
    pub channel: String,
    pub chat_id: String,
    pub content: String,
    pub timestamp: String,
}

/// Outbound envelope pushed to the chat front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEnvelope {
    pub channel: String,
    pub chat_id: String,
    pub content: String,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments as produced by the model.
    pub arguments: String,
}

/// Output of one tool invocation, paired with its call by `call_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub content: String,
}

/// Tool description advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: serde_json::Value,
}

/// One entry of the prompt sent to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant turn that carries tool calls (content may be absent).
    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// Caller-facing model request; the router fills in model-specific limits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

/// Fully-resolved request handed to a provider client.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// Provider-side model id (no `provider/` prefix).
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Why the model stopped generating.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ToolCalls,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Provider response.
///
/// `tool_calls` is `None` when the model requested no tools; `Some(vec![])`
/// means the provider sent an explicit empty array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub finish_reason: FinishReason,
    pub usage: TokenUsage,
}

impl ChatResponse {
    /// Tool calls to execute, if any were requested.
    pub fn requested_tools(&self) -> Option<&[ToolCall]> {
        match self.tool_calls.as_deref() {
            Some(calls) if !calls.is_empty() => Some(calls),
            _ => None,
        }
    }
}

/// A hit returned by memory search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedMemory {
    /// Message row id; `None` for free-standing memory chunks.
    pub row_id: Option<i64>,
    /// Message role, or the chunk's source label.
    pub source: String,
    pub content: String,
    pub created_at: String,
    /// Fused rank score.
    pub score: f64,
}

/// A persisted schedule definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub name: String,
    /// Five-field cron expression.
    pub cron: String,
    pub message: String,
    pub model: Option<String>,
    /// Conversation to inject output into, if any.
    pub inject_into: Option<String>,
    pub created_at: String,
}
