// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backfills embeddings for messages and memory chunks.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use hearth_core::{EmbeddingAdapter, HearthError, Maintenance};

use crate::store::MemoryStore;

/// Rows embedded per batch.
const BATCH_SIZE: usize = 32;

/// Embeds every searchable row that lacks a vector.
pub struct Reindexer {
    store: MemoryStore,
    embedder: Option<Arc<dyn EmbeddingAdapter>>,
}

impl Reindexer {
    pub fn new(store: MemoryStore, embedder: Option<Arc<dyn EmbeddingAdapter>>) -> Self {
        Self { store, embedder }
    }
}

#[async_trait]
impl Maintenance for Reindexer {
    async fn reindex(&self, progress: mpsc::Sender<String>) -> Result<u64, HearthError> {
        let Some(embedder) = &self.embedder else {
            return Err(HearthError::Config(
                "no embedding endpoint configured (memory.embedding)".into(),
            ));
        };

        let mut total = 0u64;
        loop {
            let batch = self.store.messages_missing_embeddings(BATCH_SIZE).await?;
            if batch.is_empty() {
                break;
            }
            let vectors = embed_rows(embedder.as_ref(), &batch).await?;
            for ((row_id, _), vec) in batch.iter().zip(&vectors) {
                self.store.save_message_embedding(*row_id, vec).await?;
            }
            total += batch.len() as u64;
            // A closed receiver only means nobody is watching.
            let _ = progress.send(format!("indexed {total} messages")).await;
        }

        let mut chunks = 0u64;
        loop {
            let batch = self.store.chunks_missing_embeddings(BATCH_SIZE).await?;
            if batch.is_empty() {
                break;
            }
            let vectors = embed_rows(embedder.as_ref(), &batch).await?;
            for ((id, _), vec) in batch.iter().zip(&vectors) {
                self.store.save_chunk_embedding(*id, vec).await?;
            }
            chunks += batch.len() as u64;
            let _ = progress.send(format!("indexed {chunks} memory chunks")).await;
        }

        info!(messages = total, chunks, "reindex complete");
        Ok(total + chunks)
    }
}

async fn embed_rows(
    embedder: &dyn EmbeddingAdapter,
    rows: &[(i64, String)],
) -> Result<Vec<Vec<f32>>, HearthError> {
    let texts: Vec<String> = rows.iter().map(|(_, text)| text.clone()).collect();
    let vectors = embedder.embed_batch(&texts).await?;
    if vectors.len() != rows.len() || vectors.iter().any(|v| v.is_empty()) {
        return Err(HearthError::Internal(format!(
            "embedding backend returned {} vectors for {} inputs",
            vectors.len(),
            rows.len()
        )));
    }
    Ok(vectors)
}
