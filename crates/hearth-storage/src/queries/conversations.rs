// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation CRUD operations.

use hearth_core::{Conversation, HearthError, now_timestamp};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "chat_id, segment_start, model, created_at, updated_at";

fn row_to_conversation(row: &rusqlite::Row<'_>) -> Result<Conversation, rusqlite::Error> {
    Ok(Conversation {
        chat_id: row.get(0)?,
        segment_start: row.get(1)?,
        model: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Get a conversation by chat id.
pub async fn get_conversation(
    db: &Database,
    chat_id: &str,
) -> Result<Option<Conversation>, HearthError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Conversation>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM conversations WHERE chat_id = ?1"),
                params![chat_id],
                row_to_conversation,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a conversation if absent and return the stored row.
pub async fn create_conversation(
    db: &Database,
    chat_id: &str,
    model: &str,
) -> Result<Conversation, HearthError> {
    let chat_id = chat_id.to_string();
    let model = model.to_string();
    db.connection()
        .call(move |conn| -> Result<Conversation, rusqlite::Error> {
            let now = now_timestamp();
            conn.execute(
                "INSERT OR IGNORE INTO conversations (chat_id, segment_start, model, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?2, ?2)",
                params![chat_id, now, model],
            )?;
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM conversations WHERE chat_id = ?1"),
                params![chat_id],
                row_to_conversation,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// List all conversations, most recently updated first.
pub async fn list_conversations(db: &Database) -> Result<Vec<Conversation>, HearthError> {
    db.connection()
        .call(|conn| -> Result<Vec<Conversation>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM conversations ORDER BY updated_at DESC, chat_id ASC"
            ))?;
            let rows = stmt.query_map([], row_to_conversation)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Rebind a conversation to a model key.
pub async fn set_model(db: &Database, chat_id: &str, model: &str) -> Result<(), HearthError> {
    let chat_id = chat_id.to_string();
    let model = model.to_string();
    let updated = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE conversations SET model = ?1, updated_at = ?2 WHERE chat_id = ?3",
                params![model, now_timestamp(), chat_id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if updated == 0 {
        return Err(HearthError::Internal("conversation not found".into()));
    }
    Ok(())
}

/// Start a new segment at the current time and return its bound.
pub async fn reset_segment(db: &Database, chat_id: &str) -> Result<String, HearthError> {
    let chat_id = chat_id.to_string();
    let (updated, start) = db
        .connection()
        .call(move |conn| -> Result<(usize, String), rusqlite::Error> {
            let now = now_timestamp();
            let n = conn.execute(
                "UPDATE conversations SET segment_start = ?1, updated_at = ?1 WHERE chat_id = ?2",
                params![now, chat_id],
            )?;
            Ok((n, now))
        })
        .await
        .map_err(map_tr_err)?;
    if updated == 0 {
        return Err(HearthError::Internal("conversation not found".into()));
    }
    Ok(start)
}

/// Bump `updated_at` after activity.
pub async fn touch(db: &Database, chat_id: &str) -> Result<(), HearthError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE conversations SET updated_at = ?1 WHERE chat_id = ?2",
                params![now_timestamp(), chat_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
