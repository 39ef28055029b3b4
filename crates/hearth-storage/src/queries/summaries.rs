// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation summaries.

use hearth_core::{HearthError, now_timestamp};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// The most recent summary for a chat.
pub async fn latest(db: &Database, chat_id: &str) -> Result<Option<String>, HearthError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT content FROM summaries WHERE chat_id = ?1 ORDER BY id DESC LIMIT 1",
                params![chat_id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Store a new summary.
pub async fn insert(db: &Database, chat_id: &str, content: &str) -> Result<(), HearthError> {
    let chat_id = chat_id.to_string();
    let content = content.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO summaries (chat_id, content, created_at) VALUES (?1, ?2, ?3)",
                params![chat_id, content, now_timestamp()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
