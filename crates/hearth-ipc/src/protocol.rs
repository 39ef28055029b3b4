// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line protocol frames.
//!
//! Every frame is one JSON object on its own line. The first line of a
//! connection decides its kind:
//!
//! Front-end (held open):
//! ```json
//! {"type": "register", "name": "telegram-bridge"}
//! {"type": "inbound", "id": "m1", "channel": "telegram", "chatId": "42", "content": "Hi", "timestamp": "..."}
//! {"type": "command", "command": "reset", "chatId": "42", "params": {}}
//! ```
//!
//! Server to front-end:
//! ```json
//! {"type": "outbound", "channel": "telegram", "chatId": "42", "content": "Hello!"}
//! {"type": "shutdown"}
//! ```
//!
//! Operator (one request, one response, then close):
//! ```json
//! {"command": "status", "params": {}}
//! {"progress": "embedded 32 messages"}
//! {"result": {"sessions": 1, "pendingChats": 0}}
//! ```

use hearth_core::{InboundEnvelope, OutboundEnvelope};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames a registered front-end sends.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Register {
        #[serde(default)]
        name: Option<String>,
    },
    Inbound(InboundEnvelope),
    Command(FrontendCommand),
}

/// Fire-and-forget conversation command from a front-end.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendCommand {
    pub command: String,
    pub chat_id: String,
    #[serde(default)]
    pub params: Value,
}

/// Frames the server pushes to the front-end.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Outbound(OutboundEnvelope),
    Shutdown,
}

impl ServerFrame {
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// One-shot operator request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OperatorRequest {
    pub command: String,
    #[serde(default)]
    pub params: Value,
}

/// Connection kind, decided by the first line.
#[derive(Debug)]
pub enum Opening {
    Frontend(Option<String>),
    Operator(OperatorRequest),
}

/// Classifies the first line of a connection.
///
/// A `type` field marks a front-end, which must open with `register`; a bare
/// `command` field marks an operator request.
pub fn classify_opening(line: &str) -> Result<Opening, String> {
    let value: Value = serde_json::from_str(line).map_err(|e| format!("invalid JSON: {e}"))?;
    if value.get("type").is_some() {
        return match serde_json::from_value::<ClientFrame>(value) {
            Ok(ClientFrame::Register { name }) => Ok(Opening::Frontend(name)),
            Ok(_) => Err("front-end connections must start with a register frame".into()),
            Err(e) => Err(format!("invalid frame: {e}")),
        };
    }
    if value.get("command").is_some() {
        return serde_json::from_value(value)
            .map(Opening::Operator)
            .map_err(|e| format!("invalid command request: {e}"));
    }
    Err("expected a register frame or a command request".into())
}

pub fn result_line(result: Value) -> String {
    serde_json::json!({ "result": result }).to_string()
}

pub fn error_line(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

pub fn progress_line(message: &str) -> String {
    serde_json::json!({ "progress": message }).to_string()
}
