// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed candidate retrieval: FTS5 (BM25) and brute-force cosine
//! over BLOB embeddings.
//!
//! Only `text` messages from users and the assistant are searchable.

use hearth_core::{HearthError, now_timestamp};
use hearth_storage::{Database, map_tr_err};
use rusqlite::params;

use crate::types::{Candidate, blob_to_vec, cosine_similarity, vec_to_blob};

const SEARCHABLE: &str = "m.type = 'text' AND m.role IN ('user', 'assistant')";

/// Embedded row fetched for vector scoring.
struct EmbeddedRow {
    candidate: Candidate,
    embedding: Vec<f32>,
}

/// Persistent store for searchable content and its embeddings.
#[derive(Clone)]
pub struct MemoryStore {
    db: Database,
}

impl MemoryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// BM25-ranked message candidates within one conversation segment.
    pub async fn lexical_in_segment(
        &self,
        query: &str,
        chat_id: &str,
        segment_start: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, HearthError> {
        let Some(fts) = fts_query(query) else {
            return Ok(Vec::new());
        };
        let chat_id = chat_id.to_string();
        let segment_start = segment_start.to_string();
        let limit = limit as i64;
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<Candidate>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT m.row_id, m.content, m.role, m.created_at
                     FROM messages_fts JOIN messages m ON m.row_id = messages_fts.rowid
                     WHERE messages_fts MATCH ?1 AND m.chat_id = ?2 AND m.created_at >= ?3
                       AND {SEARCHABLE}
                     ORDER BY bm25(messages_fts), m.row_id DESC LIMIT ?4"
                ))?;
                let rows = stmt.query_map(params![fts, chat_id, segment_start, limit], |row| {
                    Ok(Candidate {
                        row_id: Some(row.get(0)?),
                        content: row.get(1)?,
                        source: row.get(2)?,
                        created_at: row.get(3)?,
                        distance: None,
                    })
                })?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Nearest message candidates within one conversation segment.
    pub async fn vector_in_segment(
        &self,
        query_vec: &[f32],
        chat_id: &str,
        segment_start: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, HearthError> {
        let chat_id = chat_id.to_string();
        let segment_start = segment_start.to_string();
        let rows = self
            .db
            .connection()
            .call(move |conn| -> Result<Vec<EmbeddedRow>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT m.row_id, m.content, m.role, m.created_at, e.embedding
                     FROM message_embeddings e JOIN messages m ON m.row_id = e.row_id
                     WHERE m.chat_id = ?1 AND m.created_at >= ?2 AND {SEARCHABLE}"
                ))?;
                let rows = stmt.query_map(params![chat_id, segment_start], |row| {
                    let blob: Vec<u8> = row.get(4)?;
                    Ok(EmbeddedRow {
                        candidate: Candidate {
                            row_id: Some(row.get(0)?),
                            content: row.get(1)?,
                            source: row.get(2)?,
                            created_at: row.get(3)?,
                            distance: None,
                        },
                        embedding: blob_to_vec(&blob),
                    })
                })?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)?;
        Ok(rank_by_distance(rows, query_vec, limit))
    }

    /// BM25-ranked candidates across all conversations and memory chunks.
    pub async fn lexical_everywhere(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, HearthError> {
        let Some(fts) = fts_query(query) else {
            return Ok(Vec::new());
        };
        let limit = limit as i64;
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<Candidate>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT row_id, content, source, created_at FROM (
                        SELECT m.row_id AS row_id, m.content AS content, m.role AS source,
                               m.created_at AS created_at, bm25(messages_fts) AS score
                        FROM messages_fts JOIN messages m ON m.row_id = messages_fts.rowid
                        WHERE messages_fts MATCH ?1 AND {SEARCHABLE}
                        UNION ALL
                        SELECT NULL, c.content, c.source, c.created_at, bm25(memory_chunks_fts)
                        FROM memory_chunks_fts JOIN memory_chunks c ON c.id = memory_chunks_fts.rowid
                        WHERE memory_chunks_fts MATCH ?1
                     ) ORDER BY score LIMIT ?2"
                ))?;
                let rows = stmt.query_map(params![fts, limit], |row| {
                    Ok(Candidate {
                        row_id: row.get(0)?,
                        content: row.get(1)?,
                        source: row.get(2)?,
                        created_at: row.get(3)?,
                        distance: None,
                    })
                })?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Nearest candidates across all conversations and memory chunks.
    pub async fn vector_everywhere(
        &self,
        query_vec: &[f32],
        limit: usize,
    ) -> Result<Vec<Candidate>, HearthError> {
        let rows = self
            .db
            .connection()
            .call(|conn| -> Result<Vec<EmbeddedRow>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT m.row_id, m.content, m.role, m.created_at, e.embedding
                     FROM message_embeddings e JOIN messages m ON m.row_id = e.row_id
                     WHERE {SEARCHABLE}
                     UNION ALL
                     SELECT NULL, content, source, created_at, embedding
                     FROM memory_chunks WHERE embedding IS NOT NULL"
                ))?;
                let rows = stmt.query_map([], |row| {
                    let blob: Vec<u8> = row.get(4)?;
                    Ok(EmbeddedRow {
                        candidate: Candidate {
                            row_id: row.get(0)?,
                            content: row.get(1)?,
                            source: row.get(2)?,
                            created_at: row.get(3)?,
                            distance: None,
                        },
                        embedding: blob_to_vec(&blob),
                    })
                })?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)?;
        Ok(rank_by_distance(rows, query_vec, limit))
    }

    /// Store (or replace) the embedding of a message.
    pub async fn save_message_embedding(
        &self,
        row_id: i64,
        embedding: &[f32],
    ) -> Result<(), HearthError> {
        let blob = vec_to_blob(embedding);
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT OR REPLACE INTO message_embeddings (row_id, embedding, created_at)
                     VALUES (?1, ?2, ?3)",
                    params![row_id, blob, now_timestamp()],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Searchable messages that have no embedding yet, oldest first.
    pub async fn messages_missing_embeddings(
        &self,
        limit: usize,
    ) -> Result<Vec<(i64, String)>, HearthError> {
        let limit = limit as i64;
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<(i64, String)>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT m.row_id, m.content FROM messages m
                     LEFT JOIN message_embeddings e ON e.row_id = m.row_id
                     WHERE e.row_id IS NULL AND {SEARCHABLE}
                     ORDER BY m.row_id ASC LIMIT ?1"
                ))?;
                let rows = stmt.query_map(params![limit], |row| Ok((row.get(0)?, row.get(1)?)))?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Add a free-standing memory chunk. Returns its id.
    pub async fn add_chunk(
        &self,
        source: &str,
        content: &str,
        embedding: Option<&[f32]>,
    ) -> Result<i64, HearthError> {
        let source = source.to_string();
        let content = content.to_string();
        let blob = embedding.map(vec_to_blob);
        self.db
            .connection()
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                conn.execute(
                    "INSERT INTO memory_chunks (source, content, embedding, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![source, content, blob, now_timestamp()],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Memory chunks without an embedding, oldest first.
    pub async fn chunks_missing_embeddings(
        &self,
        limit: usize,
    ) -> Result<Vec<(i64, String)>, HearthError> {
        let limit = limit as i64;
        self.db
            .connection()
            .call(move |conn| -> Result<Vec<(i64, String)>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, content FROM memory_chunks WHERE embedding IS NULL
                     ORDER BY id ASC LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit], |row| Ok((row.get(0)?, row.get(1)?)))?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Store the embedding of a memory chunk.
    pub async fn save_chunk_embedding(&self, id: i64, embedding: &[f32]) -> Result<(), HearthError> {
        let blob = vec_to_blob(embedding);
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "UPDATE memory_chunks SET embedding = ?1 WHERE id = ?2",
                    params![blob, id],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Score rows against the query vector, keep the `limit` closest.
fn rank_by_distance(rows: Vec<EmbeddedRow>, query_vec: &[f32], limit: usize) -> Vec<Candidate> {
    let mut scored: Vec<Candidate> = rows
        .into_iter()
        .filter_map(|row| {
            let sim = cosine_similarity(query_vec, &row.embedding)?;
            Some(Candidate {
                distance: Some(1.0 - sim),
                ..row.candidate
            })
        })
        .collect();
    scored.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.row_id.cmp(&a.row_id))
    });
    scored.truncate(limit);
    scored
}

/// Build an FTS5 MATCH expression: each word quoted, joined with OR.
///
/// Quoting neutralizes FTS5 operators and punctuation in user text.
/// Returns `None` when the query has no searchable words.
pub fn fts_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| format!("\"{}\"", w.to_lowercase()))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}
