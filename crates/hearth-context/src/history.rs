// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of stored message rows into prompt messages.
//!
//! Handles tool call/result pairing, run splitting for subagent task logs,
//! and per-row token estimates.

use std::collections::HashSet;

use hearth_core::tokens::{MESSAGE_OVERHEAD, estimate_tokens};
use hearth_core::{ChatMessage, Message, MessageType, Role, ToolCall};
use serde::Deserialize;
use tracing::warn;

/// Conversation id used for a subagent task's run log.
pub fn task_chat_id(task_name: &str) -> String {
    format!("task:{task_name}")
}

/// Stored content of a `tool_call` row.
#[derive(Debug, Deserialize)]
struct StoredToolCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Approximate prompt cost of one stored row.
pub fn row_tokens(message: &Message) -> usize {
    let mut total = MESSAGE_OVERHEAD + estimate_tokens(&message.content);
    if let Some(meta) = &message.metadata {
        total += estimate_tokens(meta);
    }
    total
}

/// Drops tool calls without a later result and results without an earlier call.
///
/// Rows must be in chronological order. Markers pass through untouched.
pub fn sanitize_tool_pairs(rows: Vec<Message>) -> Vec<Message> {
    let mut answered: HashSet<&str> = HashSet::new();
    let mut keep = vec![true; rows.len()];

    // Backward pass: a call is answered if a result with its id follows it.
    for (i, row) in rows.iter().enumerate().rev() {
        match (row.message_type, row.metadata.as_deref()) {
            (MessageType::ToolResult, Some(id)) => {
                answered.insert(id);
            }
            (MessageType::ToolCall, Some(id)) => keep[i] = answered.contains(id),
            (MessageType::ToolCall | MessageType::ToolResult, None) => keep[i] = false,
            _ => {}
        }
    }

    // Forward pass: a result is valid only after a kept call with its id.
    let mut issued: HashSet<String> = HashSet::new();
    for (i, row) in rows.iter().enumerate() {
        match (row.message_type, row.metadata.as_deref()) {
            (MessageType::ToolCall, Some(id)) if keep[i] => {
                issued.insert(id.to_string());
            }
            (MessageType::ToolResult, Some(id)) => keep[i] = issued.remove(id),
            _ => {}
        }
    }

    rows.into_iter()
        .zip(keep)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect()
}

/// Converts chronological rows into prompt messages.
///
/// Consecutive `tool_call` rows collapse into one assistant turn carrying
/// all calls, matching how the model emitted them. Markers are skipped.
pub fn to_chat_messages(rows: &[Message]) -> Vec<ChatMessage> {
    let mut out: Vec<ChatMessage> = Vec::with_capacity(rows.len());
    for row in rows {
        match row.message_type {
            MessageType::Marker => {}
            MessageType::Text => out.push(ChatMessage {
                role: row.role,
                content: Some(row.content.clone()),
                tool_calls: None,
                tool_call_id: None,
            }),
            MessageType::ToolCall => {
                let Some(call) = decode_tool_call(row) else {
                    continue;
                };
                match out.last_mut() {
                    Some(ChatMessage {
                        role: Role::Assistant,
                        content: None,
                        tool_calls: Some(calls),
                        ..
                    }) => calls.push(call),
                    _ => out.push(ChatMessage::assistant_tool_calls(None, vec![call])),
                }
            }
            MessageType::ToolResult => {
                if let Some(id) = &row.metadata {
                    out.push(ChatMessage::tool(id.clone(), row.content.clone()));
                }
            }
        }
    }
    out
}

fn decode_tool_call(row: &Message) -> Option<ToolCall> {
    let id = row.metadata.clone()?;
    match serde_json::from_str::<StoredToolCall>(&row.content) {
        Ok(stored) => Some(ToolCall {
            id,
            name: stored.name,
            arguments: stored.arguments,
        }),
        Err(e) => {
            warn!(row_id = row.row_id, error = %e, "skipping malformed tool_call row");
            None
        }
    }
}

/// Splits a task log into runs, each starting at a `run_start` marker.
///
/// Rows before the first marker form their own leading run.
pub fn split_runs(rows: Vec<Message>) -> Vec<Vec<Message>> {
    let mut runs: Vec<Vec<Message>> = Vec::new();
    for row in rows {
        if row.message_type == MessageType::Marker || runs.is_empty() {
            runs.push(Vec::new());
        }
        if let Some(run) = runs.last_mut() {
            run.push(row);
        }
    }
    runs
}

/// A run is complete when it ends with an assistant text message and every
/// tool call in it has a matching result.
pub fn is_complete_run(run: &[Message]) -> bool {
    let last = run.iter().rev().find(|m| m.message_type != MessageType::Marker);
    let ends_with_reply = matches!(
        last,
        Some(Message {
            role: Role::Assistant,
            message_type: MessageType::Text,
            ..
        })
    );
    if !ends_with_reply {
        return false;
    }

    let results: HashSet<&str> = run
        .iter()
        .filter(|m| m.message_type == MessageType::ToolResult)
        .filter_map(|m| m.metadata.as_deref())
        .collect();
    run.iter()
        .filter(|m| m.message_type == MessageType::ToolCall)
        .all(|m| m.metadata.as_deref().is_some_and(|id| results.contains(id)))
}

/// Last `n` complete runs, oldest first.
pub fn last_complete_runs(rows: Vec<Message>, n: usize) -> Vec<Vec<Message>> {
    let mut complete: Vec<Vec<Message>> = split_runs(rows)
        .into_iter()
        .filter(|run| is_complete_run(run))
        .collect();
    let skip = complete.len().saturating_sub(n);
    complete.drain(..skip);
    complete
}
