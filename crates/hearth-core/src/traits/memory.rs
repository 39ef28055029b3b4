// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory search trait.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::types::RetrievedMemory;

/// Hybrid retrieval over stored conversation content.
///
/// Every method is fail-safe: internal errors are logged and produce empty
/// results, never errors.
#[async_trait]
pub trait MemorySearch: Send + Sync {
    /// Searches one conversation's active segment, skipping `exclude` row ids.
    async fn search(
        &self,
        query: &str,
        chat_id: &str,
        segment_start: &str,
        exclude: &HashSet<i64>,
    ) -> Vec<RetrievedMemory>;

    /// Searches across all conversations and memory chunks.
    async fn search_chunks(&self, query: &str, top_k: usize) -> Vec<RetrievedMemory>;

    /// Indexes a newly persisted message. Best effort.
    async fn index_message(&self, _row_id: i64, _content: &str) {}
}
