// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full message pipeline with mock adapters and
//! a temp SQLite database. `send_message()` drives one debounced batch
//! through storage, context assembly, routing and the tool loop.

use std::collections::HashMap;
use std::sync::Arc;

use hearth_agent::{Pipeline, PriorityLimiter};
use hearth_config::HearthConfig;
use hearth_core::{
    EmbeddingAdapter, HearthError, InboundEnvelope, MemorySearch, ProviderClient, now_timestamp,
};
use hearth_memory::{HybridRetriever, MemoryStore, Reindexer};
use hearth_router::ModelRouter;
use hearth_storage::{Database, SqliteScheduler, SqliteStorage};

use crate::mock_embedder::MockEmbedder;
use crate::mock_provider::MockProvider;
use crate::mock_tools::MockToolExecutor;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    system_prompt: Option<String>,
    with_embedder: bool,
    configure: Vec<Box<dyn FnOnce(&mut HearthConfig) + Send>>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            system_prompt: None,
            with_embedder: true,
            configure: Vec::new(),
        }
    }

    /// Set mock provider replies.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Run memory search lexical-only.
    pub fn without_embedder(mut self) -> Self {
        self.with_embedder = false;
        self
    }

    /// Adjust the configuration before anything is built.
    pub fn with_config(mut self, f: impl FnOnce(&mut HearthConfig) + Send + 'static) -> Self {
        self.configure.push(Box::new(f));
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, HearthError> {
        let temp_dir = tempfile::TempDir::new().map_err(HearthError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = HearthConfig::default();
        config.agent.system_prompt = self
            .system_prompt
            .unwrap_or_else(|| "You are a test assistant.".to_string());
        config.storage.database_path = db_path.to_string_lossy().into_owned();
        config.ipc.socket_path = temp_dir
            .path()
            .join("hearth.sock")
            .to_string_lossy()
            .into_owned();
        config.models.retry_base_ms = 1;
        for f in self.configure {
            f(&mut config);
        }

        let db = Database::open(&db_path, config.storage.wal_mode).await?;
        let storage = Arc::new(SqliteStorage::new(db.clone()));
        let scheduler = Arc::new(SqliteScheduler::new(db.clone()));

        let embedder = Arc::new(MockEmbedder::new());
        let dyn_embedder: Arc<dyn EmbeddingAdapter> = embedder.clone();
        let embedding = self.with_embedder.then_some(dyn_embedder);
        let store = MemoryStore::new(db);
        let memory = Arc::new(HybridRetriever::new(
            store.clone(),
            embedding.clone(),
            config.memory.clone(),
        ));
        let reindexer = Arc::new(Reindexer::new(store, embedding));

        let provider = Arc::new(MockProvider::with_responses(self.responses));
        let mut clients: HashMap<String, Arc<dyn ProviderClient>> = HashMap::new();
        for name in config.providers.keys() {
            clients.insert(name.clone(), provider.clone());
        }
        let router = Arc::new(ModelRouter::new(&config, clients));
        let limiter = PriorityLimiter::from_config(&config.limiter);
        let tools = Arc::new(MockToolExecutor::new());

        let memory_search: Arc<dyn MemorySearch> = memory.clone();
        let pipeline = Arc::new(Pipeline::new(
            &config,
            storage.clone(),
            Some(memory_search),
            router.clone(),
            limiter.clone(),
            tools.clone(),
        ));

        Ok(TestHarness {
            config,
            provider,
            embedder,
            tools,
            storage,
            scheduler,
            memory,
            reindexer,
            router,
            limiter,
            pipeline,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// Effective configuration (socket and database inside the temp dir).
    pub config: HearthConfig,
    /// The mock model provider, registered for every configured provider.
    pub provider: Arc<MockProvider>,
    pub embedder: Arc<MockEmbedder>,
    pub tools: Arc<MockToolExecutor>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    pub scheduler: Arc<SqliteScheduler>,
    pub memory: Arc<HybridRetriever>,
    pub reindexer: Arc<Reindexer>,
    pub router: Arc<ModelRouter>,
    pub limiter: PriorityLimiter,
    pub pipeline: Arc<Pipeline>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default settings.
    pub async fn new() -> Result<Self, HearthError> {
        Self::builder().build().await
    }

    /// Sends one message through the pipeline and returns the reply text.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, HearthError> {
        self.pipeline
            .handle_batch(chat_id, &[envelope(chat_id, text)])
            .await
    }
}

/// Builds an inbound envelope on the `test` channel.
pub fn envelope(chat_id: &str, content: &str) -> InboundEnvelope {
    InboundEnvelope {
        id: uuid::Uuid::new_v4().to_string(),
        channel: "test".to_string(),
        chat_id: chat_id.to_string(),
        content: content.to_string(),
        timestamp: now_timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_answers_with_scripted_reply() {
        let harness = TestHarness::builder()
            .with_mock_responses(vec!["Hi".to_string()])
            .build()
            .await
            .unwrap();
        let reply = harness.send_message("c1", "Hello!").await.unwrap();
        assert_eq!(reply, "Hi");
    }

    #[tokio::test]
    async fn config_overrides_apply() {
        let harness = TestHarness::builder()
            .with_config(|c| c.tools.max_rounds = 2)
            .build()
            .await
            .unwrap();
        assert_eq!(harness.config.tools.max_rounds, 2);
    }
}
