// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token-budgeted context assembly for Hearth model calls.
//!
//! Builds the ordered prompt for one model call:
//! 1. A system message (prompt, last summary, tools, skills)
//! 2. An optional retrieval block with older, relevant messages
//! 3. History: a contiguous sliding window, or whole task runs for subagents
//! 4. The pending user inputs
//!
//! Every part is charged against 90% of the model's context budget.

pub mod history;
pub mod system;

use std::collections::HashSet;
use std::sync::Arc;

use hearth_config::HearthConfig;
use hearth_core::tokens::{message_tokens, messages_tokens};
use hearth_core::{
    ChatMessage, Conversation, HearthError, MemorySearch, Message, MessageType, StorageAdapter,
    ToolDefinition,
};
use tracing::debug;

pub use history::task_chat_id;
pub use system::RETRIEVAL_HEADER;

use crate::history::{last_complete_runs, row_tokens, sanitize_tool_pairs, to_chat_messages};
use crate::system::{render_retrieval, render_system_prompt};

/// Share of the model's context budget the assembler may fill.
const BUDGET_FRACTION: f64 = 0.9;

/// Assembles prompts from storage, memory search and configuration.
pub struct ContextAssembler {
    storage: Arc<dyn StorageAdapter>,
    memory: Option<Arc<dyn MemorySearch>>,
    system_prompt: String,
    skills: Vec<String>,
    tools: Vec<ToolDefinition>,
    sliding_window: usize,
    subagent_history_runs: usize,
    retrieval_enabled: bool,
}

impl ContextAssembler {
    pub fn new(
        config: &HearthConfig,
        storage: Arc<dyn StorageAdapter>,
        memory: Option<Arc<dyn MemorySearch>>,
    ) -> Self {
        Self {
            storage,
            memory,
            system_prompt: config.agent.system_prompt.clone(),
            skills: config.agent.skills.clone(),
            tools: Vec::new(),
            sliding_window: config.context.sliding_window,
            subagent_history_runs: config.context.subagent_history_runs,
            retrieval_enabled: config.memory.enabled,
        }
    }

    /// Advertises tool definitions in the system prompt.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Builds the prompt for one model call.
    ///
    /// For subagents, `task_name` selects the `task:<name>` run log; when it
    /// is `None` the conversation's own log is used.
    pub async fn build_context(
        &self,
        conversation: &Conversation,
        pending_inputs: &[String],
        is_subagent: bool,
        task_name: Option<&str>,
        context_budget: usize,
    ) -> Result<Vec<ChatMessage>, HearthError> {
        let chat_id = conversation.chat_id.as_str();
        let segment_start = conversation.segment_start.as_str();
        let budget = (context_budget as f64 * BUDGET_FRACTION) as usize;

        let summary = self.storage.latest_summary(chat_id).await?;
        let system = ChatMessage::system(render_system_prompt(
            &self.system_prompt,
            summary.as_deref(),
            &self.tools,
            &self.skills,
        ));

        let pending: Vec<ChatMessage> = pending_inputs
            .iter()
            .map(|p| ChatMessage::user(p.clone()))
            .collect();

        let mut remaining = budget
            .saturating_sub(message_tokens(&system))
            .saturating_sub(messages_tokens(&pending));
        let mut prompt = vec![system];

        let history = if is_subagent {
            let log_id = task_name.map(task_chat_id);
            let log_id = log_id.as_deref().unwrap_or(chat_id);
            self.subagent_history(log_id, segment_start, remaining).await?
        } else {
            let window = self
                .storage
                .recent_messages(chat_id, segment_start, self.sliding_window)
                .await?;

            if let Some(block) = self
                .retrieval_block(chat_id, segment_start, pending_inputs, &window)
                .await?
            {
                remaining = remaining.saturating_sub(message_tokens(&block));
                prompt.push(block);
            }

            contiguous_window(window, remaining)
        };

        debug!(
            chat_id,
            is_subagent,
            budget,
            history = history.len(),
            pending = pending.len(),
            "context assembled"
        );

        prompt.extend(history);
        prompt.extend(pending);
        Ok(prompt)
    }

    /// Searches older messages when the segment outgrew the sliding window.
    async fn retrieval_block(
        &self,
        chat_id: &str,
        segment_start: &str,
        pending_inputs: &[String],
        window: &[Message],
    ) -> Result<Option<ChatMessage>, HearthError> {
        let Some(memory) = self.memory.as_ref().filter(|_| self.retrieval_enabled) else {
            return Ok(None);
        };
        let count = self
            .storage
            .count_segment_messages(chat_id, segment_start)
            .await?;
        if count <= self.sliding_window as u64 {
            return Ok(None);
        }

        let query = pending_inputs.join("\n");
        let exclude: HashSet<i64> = window.iter().map(|m| m.row_id).collect();
        let hits = memory.search(&query, chat_id, segment_start, &exclude).await;
        if hits.is_empty() {
            return Ok(None);
        }
        debug!(chat_id, hits = hits.len(), "injecting retrieved memories");
        Ok(Some(ChatMessage::system(render_retrieval(&hits))))
    }

    /// Whole complete runs from a task log, newest runs kept first when the
    /// budget runs short.
    async fn subagent_history(
        &self,
        log_id: &str,
        segment_start: &str,
        remaining: usize,
    ) -> Result<Vec<ChatMessage>, HearthError> {
        let rows = self.storage.segment_messages(log_id, segment_start).await?;
        let runs = last_complete_runs(rows, self.subagent_history_runs);

        let mut used = 0usize;
        let mut kept: Vec<Vec<Message>> = Vec::new();
        for run in runs.into_iter().rev() {
            let cost: usize = run
                .iter()
                .filter(|m| m.message_type != MessageType::Marker)
                .map(row_tokens)
                .sum();
            if used + cost > remaining {
                break;
            }
            used += cost;
            kept.push(run);
        }
        kept.reverse();

        let rows: Vec<Message> = kept.into_iter().flatten().collect();
        Ok(to_chat_messages(&rows))
    }
}

/// Keeps the newest messages that fit, stopping at the first overflow.
///
/// `newest_first` comes straight from storage; the result is chronological.
fn contiguous_window(newest_first: Vec<Message>, remaining: usize) -> Vec<ChatMessage> {
    let mut used = 0usize;
    let mut kept: Vec<Message> = Vec::new();
    for message in newest_first {
        if message.message_type == MessageType::Marker {
            continue;
        }
        let cost = row_tokens(&message);
        if used + cost > remaining {
            break;
        }
        used += cost;
        kept.push(message);
    }
    kept.reverse();
    to_chat_messages(&sanitize_tool_pairs(kept))
}
