// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tracing::debug;

use hearth_config::model::StorageConfig;
use hearth_core::{Conversation, HearthError, Message, NewMessage, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter delegating to the typed query modules.
#[derive(Clone)]
pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    /// Wraps an open database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the database described by `config`.
    pub async fn open(config: &StorageConfig) -> Result<Self, HearthError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite storage initialized");
        Ok(Self::new(db))
    }

    /// The underlying database handle, shared with the memory store.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn get_conversation(&self, chat_id: &str) -> Result<Option<Conversation>, HearthError> {
        queries::conversations::get_conversation(&self.db, chat_id).await
    }

    async fn create_conversation(
        &self,
        chat_id: &str,
        model: &str,
    ) -> Result<Conversation, HearthError> {
        queries::conversations::create_conversation(&self.db, chat_id, model).await
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, HearthError> {
        queries::conversations::list_conversations(&self.db).await
    }

    async fn set_conversation_model(
        &self,
        chat_id: &str,
        model: &str,
    ) -> Result<(), HearthError> {
        queries::conversations::set_model(&self.db, chat_id, model).await
    }

    async fn reset_segment(&self, chat_id: &str) -> Result<String, HearthError> {
        queries::conversations::reset_segment(&self.db, chat_id).await
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message, HearthError> {
        let chat_id = message.chat_id.clone();
        let stored = queries::messages::insert_message(&self.db, message).await?;
        queries::conversations::touch(&self.db, &chat_id).await?;
        Ok(stored)
    }

    async fn count_segment_messages(
        &self,
        chat_id: &str,
        segment_start: &str,
    ) -> Result<u64, HearthError> {
        queries::messages::count_in_segment(&self.db, chat_id, segment_start).await
    }

    async fn recent_messages(
        &self,
        chat_id: &str,
        segment_start: &str,
        limit: usize,
    ) -> Result<Vec<Message>, HearthError> {
        queries::messages::recent_in_segment(&self.db, chat_id, segment_start, limit).await
    }

    async fn segment_messages(
        &self,
        chat_id: &str,
        segment_start: &str,
    ) -> Result<Vec<Message>, HearthError> {
        queries::messages::all_in_segment(&self.db, chat_id, segment_start).await
    }

    async fn latest_summary(&self, chat_id: &str) -> Result<Option<String>, HearthError> {
        queries::summaries::latest(&self.db, chat_id).await
    }

    async fn save_summary(&self, chat_id: &str, content: &str) -> Result<(), HearthError> {
        queries::summaries::insert(&self.db, chat_id, content).await
    }
}
