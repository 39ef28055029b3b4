// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the OpenAI-compatible chat completions and embeddings APIs.

use serde::{Deserialize, Serialize};

use hearth_core::{
    ChatMessage, ChatResponse, FinishReason, TokenUsage, ToolCall, ToolDefinition,
};

// --- Request types ---

/// Body of `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ApiTool>>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// One prompt message.
#[derive(Debug, Clone, Serialize)]
pub struct ApiMessage {
    pub role: String,
    /// Serialized as `null` for assistant turns that only carry tool calls.
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl From<&ChatMessage> for ApiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
            tool_calls: msg
                .tool_calls
                .as_ref()
                .map(|calls| calls.iter().map(ApiToolCall::from).collect()),
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

/// A tool call, as sent in assistant history and received in responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: ApiFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiFunctionCall {
    pub name: String,
    /// JSON-encoded arguments string.
    #[serde(default)]
    pub arguments: String,
}

impl From<&ToolCall> for ApiToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: function_kind(),
            function: ApiFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        }
    }
}

impl From<ApiToolCall> for ToolCall {
    fn from(call: ApiToolCall) -> Self {
        Self {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        }
    }
}

/// A tool advertised to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ApiTool {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ApiFunctionDef,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiFunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl From<&ToolDefinition> for ApiTool {
    fn from(def: &ToolDefinition) -> Self {
        Self {
            kind: function_kind(),
            function: ApiFunctionDef {
                name: def.name.clone(),
                description: def.description.clone(),
                parameters: def.parameters.clone(),
            },
        }
    }
}

fn function_kind() -> String {
    "function".to_string()
}

// --- Response types ---

/// Body of a successful chat completion.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<ApiChoice>,
    #[serde(default)]
    pub usage: Option<ApiUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiChoice {
    pub message: ApiResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    /// `None` when the field is absent or `null`; an empty array stays `Some`.
    #[serde(default)]
    pub tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ApiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl ApiChoice {
    /// Converts the first choice into the runtime's response type.
    pub fn into_chat_response(self, usage: Option<ApiUsage>) -> ChatResponse {
        let finish_reason = match self.finish_reason.as_deref() {
            Some("tool_calls") | Some("function_call") => FinishReason::ToolCalls,
            _ => FinishReason::Stop,
        };
        let usage = usage.unwrap_or_default();
        ChatResponse {
            content: self.message.content,
            tool_calls: self
                .message
                .tool_calls
                .map(|calls| calls.into_iter().map(ToolCall::from).collect()),
            finish_reason,
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        }
    }
}

/// Error envelope returned by OpenAI-compatible servers.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

// --- Embeddings ---

/// Body of `POST /embeddings`.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_tool_call_turn_serializes_null_content() {
        let msg = ChatMessage::assistant_tool_calls(
            None,
            vec![ToolCall {
                id: "call_1".into(),
                name: "read_file".into(),
                arguments: r#"{"path":"a.txt"}"#.into(),
            }],
        );
        let json = serde_json::to_value(ApiMessage::from(&msg)).unwrap();
        assert!(json["content"].is_null());
        assert_eq!(json["tool_calls"][0]["type"], "function");
        assert_eq!(json["tool_calls"][0]["function"]["name"], "read_file");
        assert!(json.get("tool_call_id").is_none());
    }

    #[test]
    fn tool_message_carries_call_id() {
        let json = serde_json::to_value(ApiMessage::from(&ChatMessage::tool("call_1", "ok"))).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_1");
    }

    #[test]
    fn null_and_empty_tool_calls_stay_distinct() {
        let null: ApiChoice = serde_json::from_value(serde_json::json!({
            "message": {"content": "hi", "tool_calls": null},
            "finish_reason": "stop"
        }))
        .unwrap();
        let empty: ApiChoice = serde_json::from_value(serde_json::json!({
            "message": {"content": "hi", "tool_calls": []},
            "finish_reason": "stop"
        }))
        .unwrap();
        assert_eq!(null.into_chat_response(None).tool_calls, None);
        assert_eq!(empty.into_chat_response(None).tool_calls, Some(vec![]));
    }
}
