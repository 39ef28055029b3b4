// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message log operations. Ordering is always by `row_id`.

use hearth_core::{HearthError, Message, NewMessage, now_timestamp};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::parse_column;

const COLUMNS: &str = "row_id, chat_id, role, type, content, metadata, created_at";

pub(crate) fn row_to_message(row: &rusqlite::Row<'_>) -> Result<Message, rusqlite::Error> {
    Ok(Message {
        row_id: row.get(0)?,
        chat_id: row.get(1)?,
        role: parse_column(2, row.get(2)?)?,
        message_type: parse_column(3, row.get(3)?)?,
        content: row.get(4)?,
        metadata: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Append a message and return it with its assigned row id.
pub async fn insert_message(db: &Database, msg: NewMessage) -> Result<Message, HearthError> {
    db.connection()
        .call(move |conn| -> Result<Message, rusqlite::Error> {
            let created_at = now_timestamp();
            conn.execute(
                "INSERT INTO messages (chat_id, role, type, content, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    msg.chat_id,
                    msg.role.to_string(),
                    msg.message_type.to_string(),
                    msg.content,
                    msg.metadata,
                    created_at,
                ],
            )?;
            Ok(Message {
                row_id: conn.last_insert_rowid(),
                chat_id: msg.chat_id,
                role: msg.role,
                message_type: msg.message_type,
                content: msg.content,
                metadata: msg.metadata,
                created_at,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Count messages in a segment.
pub async fn count_in_segment(
    db: &Database,
    chat_id: &str,
    segment_start: &str,
) -> Result<u64, HearthError> {
    let chat_id = chat_id.to_string();
    let segment_start = segment_start.to_string();
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE chat_id = ?1 AND created_at >= ?2",
                params![chat_id, segment_start],
                |row| row.get::<_, i64>(0).map(|n| n.max(0) as u64),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Newest `limit` messages of a segment, newest first.
pub async fn recent_in_segment(
    db: &Database,
    chat_id: &str,
    segment_start: &str,
    limit: usize,
) -> Result<Vec<Message>, HearthError> {
    let chat_id = chat_id.to_string();
    let segment_start = segment_start.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages
                 WHERE chat_id = ?1 AND created_at >= ?2
                 ORDER BY row_id DESC LIMIT ?3"
            ))?;
            let rows = stmt.query_map(params![chat_id, segment_start, limit], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Every message of a segment, oldest first.
pub async fn all_in_segment(
    db: &Database,
    chat_id: &str,
    segment_start: &str,
) -> Result<Vec<Message>, HearthError> {
    let chat_id = chat_id.to_string();
    let segment_start = segment_start.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages
                 WHERE chat_id = ?1 AND created_at >= ?2
                 ORDER BY row_id ASC"
            ))?;
            let rows = stmt.query_map(params![chat_id, segment_start], row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
