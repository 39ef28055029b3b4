// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid retriever combining vector similarity and BM25 via RRF fusion.
//!
//! Search is fail-safe: any internal error is logged and yields no results,
//! so retrieval can never block the message pipeline.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use hearth_config::model::MemoryConfig;
use hearth_core::tokens::estimate_tokens;
use hearth_core::{EmbeddingAdapter, HearthError, MemorySearch, RetrievedMemory};

use crate::fusion::reciprocal_rank_fusion;
use crate::store::MemoryStore;
use crate::types::Candidate;

/// Limits applied after fusion.
#[derive(Debug, Clone, Copy)]
struct Selection {
    top_k: usize,
    max_tokens: usize,
    relevance_threshold: f64,
}

/// Hybrid vector + lexical retriever.
pub struct HybridRetriever {
    store: MemoryStore,
    embedder: Option<Arc<dyn EmbeddingAdapter>>,
    config: MemoryConfig,
}

impl HybridRetriever {
    /// `embedder = None` disables vector search (pure lexical).
    pub fn new(
        store: MemoryStore,
        embedder: Option<Arc<dyn EmbeddingAdapter>>,
        config: MemoryConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    fn selection(&self, top_k: usize) -> Selection {
        Selection {
            top_k,
            max_tokens: self.config.max_tokens,
            relevance_threshold: self.config.relevance_threshold,
        }
    }

    /// Embeds the query, or returns `None` when vector search is unavailable.
    async fn embed_query(&self, query: &str) -> Option<Vec<f32>> {
        let embedder = self.embedder.as_ref()?;
        match embedder.embed(query).await {
            Ok(vec) => Some(vec),
            Err(e) => {
                warn!(error = %e, "query embedding failed, using lexical search only");
                None
            }
        }
    }

    async fn try_search(
        &self,
        query: &str,
        chat_id: &str,
        segment_start: &str,
        exclude: &HashSet<i64>,
    ) -> Result<Vec<RetrievedMemory>, HearthError> {
        let k = self.config.candidate_k;
        let vector = match self.embed_query(query).await {
            Some(q) => {
                self.store
                    .vector_in_segment(&q, chat_id, segment_start, k)
                    .await?
            }
            None => Vec::new(),
        };
        let lexical = self
            .store
            .lexical_in_segment(query, chat_id, segment_start, k)
            .await?;
        debug!(
            chat_id,
            vector = vector.len(),
            lexical = lexical.len(),
            "memory candidates"
        );

        Ok(fuse_and_select(
            vector,
            lexical,
            |c| c.row_id,
            |key| key.is_some_and(|id| exclude.contains(&id)),
            self.selection(self.config.top_k),
        ))
    }

    async fn try_search_chunks(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedMemory>, HearthError> {
        let k = self.config.candidate_k.max(top_k);
        let vector = match self.embed_query(query).await {
            Some(q) => self.store.vector_everywhere(&q, k).await?,
            None => Vec::new(),
        };
        let lexical = self.store.lexical_everywhere(query, k).await?;
        Ok(fuse_and_select(
            vector,
            lexical,
            |c| c.content.clone(),
            |_| false,
            self.selection(top_k),
        ))
    }

    /// Embeds and stores a single message.
    async fn try_index(&self, row_id: i64, content: &str) -> Result<(), HearthError> {
        if let Some(embedder) = &self.embedder {
            let vec = embedder.embed(content).await?;
            self.store.save_message_embedding(row_id, &vec).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl MemorySearch for HybridRetriever {
    async fn search(
        &self,
        query: &str,
        chat_id: &str,
        segment_start: &str,
        exclude: &HashSet<i64>,
    ) -> Vec<RetrievedMemory> {
        if !self.config.enabled {
            return Vec::new();
        }
        match self.try_search(query, chat_id, segment_start, exclude).await {
            Ok(results) => results,
            Err(e) => {
                warn!(chat_id, error = %e, "memory search failed");
                Vec::new()
            }
        }
    }

    async fn search_chunks(&self, query: &str, top_k: usize) -> Vec<RetrievedMemory> {
        match self.try_search_chunks(query, top_k).await {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "memory chunk search failed");
                Vec::new()
            }
        }
    }

    async fn index_message(&self, row_id: i64, content: &str) {
        if let Err(e) = self.try_index(row_id, content).await {
            warn!(row_id, error = %e, "failed to index message");
        }
    }
}

/// Fuse both candidate lists and apply exclusion, the relevance gate, top-k
/// and greedy token packing, in that order.
///
/// The gate only applies when vector candidates exist; a top result without
/// a vector distance passes it.
fn fuse_and_select<K, F, X>(
    vector: Vec<Candidate>,
    lexical: Vec<Candidate>,
    identity: F,
    excluded: X,
    selection: Selection,
) -> Vec<RetrievedMemory>
where
    K: Eq + Hash + Clone,
    F: Fn(&Candidate) -> K,
    X: Fn(&K) -> bool,
{
    let has_vector = !vector.is_empty();
    let vector_keys: Vec<K> = vector.iter().map(&identity).collect();
    let lexical_keys: Vec<K> = lexical.iter().map(&identity).collect();

    // Vector candidates go first so their distance survives deduplication.
    let mut by_key: HashMap<K, Candidate> = HashMap::new();
    for candidate in vector.into_iter().chain(lexical) {
        by_key.entry(identity(&candidate)).or_insert(candidate);
    }

    let fused: Vec<(K, f64)> = reciprocal_rank_fusion(&[vector_keys, lexical_keys])
        .into_iter()
        .filter(|(key, _)| !excluded(key))
        .collect();

    if has_vector
        && let Some((top, _)) = fused.first()
        && let Some(distance) = by_key.get(top).and_then(|c| c.distance)
        && distance > selection.relevance_threshold
    {
        debug!(distance, "top memory result below relevance threshold");
        return Vec::new();
    }

    let mut used = 0usize;
    let mut out = Vec::new();
    for (key, score) in fused.into_iter().take(selection.top_k) {
        let Some(candidate) = by_key.remove(&key) else {
            continue;
        };
        let cost = estimate_tokens(&candidate.content);
        if used + cost > selection.max_tokens {
            break;
        }
        used += cost;
        out.push(RetrievedMemory {
            row_id: candidate.row_id,
            source: candidate.source,
            content: candidate.content,
            created_at: candidate.created_at,
            score,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(row_id: i64, content: &str, distance: Option<f64>) -> Candidate {
        Candidate {
            row_id: Some(row_id),
            content: content.to_string(),
            source: "user".to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            distance,
        }
    }

    fn sel() -> Selection {
        Selection {
            top_k: 5,
            max_tokens: 1000,
            relevance_threshold: 0.5,
        }
    }

    #[test]
    fn shared_hit_ranks_first_and_is_deduplicated() {
        let out = fuse_and_select(
            vec![cand(1, "a", Some(0.1)), cand(2, "b", Some(0.2))],
            vec![cand(1, "a", None)],
            |c| c.row_id,
            |_| false,
            sel(),
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].row_id, Some(1));
        assert!(out[0].score > out[1].score);
    }

    #[test]
    fn excluded_rows_are_removed_before_gate() {
        // Row 1 is far, but it is excluded, so row 2 becomes the top result.
        let out = fuse_and_select(
            vec![cand(1, "a", Some(0.9)), cand(2, "b", Some(0.1))],
            vec![],
            |c| c.row_id,
            |k| *k == Some(1),
            sel(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].row_id, Some(2));
    }

    #[test]
    fn distant_top_result_discards_everything() {
        let out = fuse_and_select(
            vec![cand(1, "a", Some(0.9))],
            vec![cand(2, "b", None)],
            |c| c.row_id,
            |_| false,
            sel(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn lexical_only_results_skip_the_gate() {
        let out = fuse_and_select(
            vec![],
            vec![cand(1, "a", None)],
            |c| c.row_id,
            |_| false,
            Selection {
                relevance_threshold: 0.0,
                ..sel()
            },
        );
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn top_result_without_distance_passes_gate() {
        // The far vector hit is excluded, leaving a lexical hit on top.
        let out = fuse_and_select(
            vec![cand(9, "far", Some(0.95))],
            vec![cand(3, "near", None)],
            |c| c.row_id,
            |k| *k == Some(9),
            sel(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].row_id, Some(3));
    }

    #[test]
    fn packing_stops_at_first_overflow() {
        let big = "x".repeat(400); // 100 tokens
        let out = fuse_and_select(
            vec![],
            vec![cand(1, "small", None), cand(2, &big, None), cand(3, "tiny", None)],
            |c| c.row_id,
            |_| false,
            Selection {
                max_tokens: 50,
                ..sel()
            },
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].row_id, Some(1));
    }

    #[test]
    fn top_k_caps_results() {
        let out = fuse_and_select(
            vec![],
            (1..=10).map(|i| cand(i, "t", None)).collect(),
            |c| c.row_id,
            |_| false,
            Selection { top_k: 3, ..sel() },
        );
        assert_eq!(out.len(), 3);
    }
}
