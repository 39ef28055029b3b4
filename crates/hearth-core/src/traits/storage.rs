// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for conversation persistence.

use async_trait::async_trait;

use crate::error::HearthError;
use crate::types::{Conversation, Message, NewMessage};

/// Persistence backend for conversations, messages and summaries.
///
/// All history reads are scoped to `created_at >= segment_start` and ordered
/// by `row_id`.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Looks up a conversation by chat id.
    async fn get_conversation(&self, chat_id: &str) -> Result<Option<Conversation>, HearthError>;

    /// Creates a conversation bound to `model`, or returns the existing one.
    async fn create_conversation(
        &self,
        chat_id: &str,
        model: &str,
    ) -> Result<Conversation, HearthError>;

    /// Lists every conversation, most recently updated first.
    async fn list_conversations(&self) -> Result<Vec<Conversation>, HearthError>;

    /// Rebinds a conversation to a different model key.
    async fn set_conversation_model(&self, chat_id: &str, model: &str)
    -> Result<(), HearthError>;

    /// Starts a new history segment and returns its lower bound.
    async fn reset_segment(&self, chat_id: &str) -> Result<String, HearthError>;

    /// Appends a message and returns the stored row.
    async fn insert_message(&self, message: NewMessage) -> Result<Message, HearthError>;

    /// Counts messages in the active segment.
    async fn count_segment_messages(
        &self,
        chat_id: &str,
        segment_start: &str,
    ) -> Result<u64, HearthError>;

    /// Most recent messages in the segment, newest first.
    async fn recent_messages(
        &self,
        chat_id: &str,
        segment_start: &str,
        limit: usize,
    ) -> Result<Vec<Message>, HearthError>;

    /// Every message in the segment, oldest first.
    async fn segment_messages(
        &self,
        chat_id: &str,
        segment_start: &str,
    ) -> Result<Vec<Message>, HearthError>;

    /// Latest stored summary for a conversation.
    async fn latest_summary(&self, chat_id: &str) -> Result<Option<String>, HearthError>;

    /// Stores a new summary for a conversation.
    async fn save_summary(&self, chat_id: &str, content: &str) -> Result<(), HearthError>;
}
