// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for hybrid search over a real SQLite database.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use hearth_config::model::MemoryConfig;
use hearth_core::{
    EmbeddingAdapter, HearthError, MemorySearch, NewMessage, Role, StorageAdapter,
};
use hearth_memory::{HybridRetriever, MemoryStore};
use hearth_storage::{Database, SqliteStorage};
use tempfile::TempDir;

/// Maps texts mentioning dogs to one axis and everything else to another.
struct TopicEmbedder;

#[async_trait]
impl EmbeddingAdapter for TopicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, HearthError> {
        if text.contains("dog") || text.contains("retriever") {
            Ok(vec![1.0, 0.0])
        } else {
            Ok(vec![0.0, 1.0])
        }
    }
}

struct BrokenEmbedder;

#[async_trait]
impl EmbeddingAdapter for BrokenEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, HearthError> {
        Err(HearthError::provider_status(503, "embedding backend down"))
    }
}

struct Fixture {
    _dir: TempDir,
    storage: SqliteStorage,
    store: MemoryStore,
    segment_start: String,
    row_ids: Vec<i64>,
}

async fn fixture(texts: &[&str]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("h.db"), true).await.unwrap();
    let storage = SqliteStorage::new(db.clone());
    let store = MemoryStore::new(db);
    let conv = storage.create_conversation("c1", "a/b").await.unwrap();
    let mut row_ids = Vec::new();
    for text in texts {
        let msg = storage
            .insert_message(NewMessage::text("c1", Role::User, *text))
            .await
            .unwrap();
        let vec = TopicEmbedder.embed(text).await.unwrap();
        store.save_message_embedding(msg.row_id, &vec).await.unwrap();
        row_ids.push(msg.row_id);
    }
    Fixture {
        _dir: dir,
        storage,
        store,
        segment_start: conv.segment_start,
        row_ids,
    }
}

fn config() -> MemoryConfig {
    MemoryConfig {
        relevance_threshold: 0.5,
        ..MemoryConfig::default()
    }
}

#[tokio::test]
async fn finds_relevant_message_from_both_indexes() {
    let f = fixture(&["my dog is a golden retriever", "the weather is sunny"]).await;
    let retriever = HybridRetriever::new(f.store.clone(), Some(Arc::new(TopicEmbedder)), config());

    let hits = retriever
        .search("golden retriever", "c1", &f.segment_start, &HashSet::new())
        .await;
    assert!(!hits.is_empty());
    assert_eq!(hits[0].row_id, Some(f.row_ids[0]));
}

#[tokio::test]
async fn excluded_rows_never_come_back() {
    let f = fixture(&["my dog is a golden retriever", "the dog park opens at nine"]).await;
    let retriever = HybridRetriever::new(f.store.clone(), Some(Arc::new(TopicEmbedder)), config());

    let exclude: HashSet<i64> = [f.row_ids[0]].into_iter().collect();
    let hits = retriever
        .search("dog", "c1", &f.segment_start, &exclude)
        .await;
    assert!(hits.iter().all(|h| h.row_id != Some(f.row_ids[0])));
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn irrelevant_query_is_gated_out() {
    let f = fixture(&["my dog is a golden retriever"]).await;
    let retriever = HybridRetriever::new(f.store.clone(), Some(Arc::new(TopicEmbedder)), config());

    // Vector search returns the dog message at distance 1.0 (> 0.5 threshold).
    let hits = retriever
        .search("taxes", "c1", &f.segment_start, &HashSet::new())
        .await;
    assert!(hits.is_empty());
}

#[tokio::test]
async fn disabled_search_returns_nothing() {
    let f = fixture(&["my dog is a golden retriever"]).await;
    let disabled = MemoryConfig {
        enabled: false,
        ..config()
    };
    let retriever = HybridRetriever::new(f.store.clone(), Some(Arc::new(TopicEmbedder)), disabled);
    let hits = retriever
        .search("dog", "c1", &f.segment_start, &HashSet::new())
        .await;
    assert!(hits.is_empty());
}

#[tokio::test]
async fn embedding_failure_falls_back_to_lexical() {
    let f = fixture(&["my dog is a golden retriever"]).await;
    let retriever = HybridRetriever::new(f.store.clone(), Some(Arc::new(BrokenEmbedder)), config());
    let hits = retriever
        .search("retriever", "c1", &f.segment_start, &HashSet::new())
        .await;
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn chunk_search_spans_conversations_and_deduplicates_content() {
    let f = fixture(&["remember the router password"]).await;
    f.storage.create_conversation("c2", "a/b").await.unwrap();
    f.storage
        .insert_message(NewMessage::text("c2", Role::User, "remember the router password"))
        .await
        .unwrap();
    f.store
        .add_chunk("notes", "router sits in the hallway closet", None)
        .await
        .unwrap();

    let retriever = HybridRetriever::new(f.store.clone(), None, config());
    let hits = retriever.search_chunks("router", 10).await;
    assert_eq!(hits.len(), 2);
    let contents: HashSet<&str> = hits.iter().map(|h| h.content.as_str()).collect();
    assert_eq!(contents.len(), 2);
}

#[tokio::test]
async fn index_message_makes_message_vector_searchable() {
    let f = fixture(&[]).await;
    let msg = f
        .storage
        .insert_message(NewMessage::text("c1", Role::Assistant, "your dog needs a walk"))
        .await
        .unwrap();
    let retriever = HybridRetriever::new(f.store.clone(), Some(Arc::new(TopicEmbedder)), config());
    retriever.index_message(msg.row_id, &msg.content).await;

    let hits = f
        .store
        .vector_in_segment(&[1.0, 0.0], "c1", &f.segment_start, 5)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
}
