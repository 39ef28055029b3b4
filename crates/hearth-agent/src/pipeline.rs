// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message pipeline: debounced batches and task runs in, replies out.

use std::sync::Arc;

use async_trait::async_trait;
use hearth_config::HearthConfig;
use hearth_context::{ContextAssembler, task_chat_id};
use hearth_core::{
    Conversation, HearthError, InboundEnvelope, MemorySearch, NewMessage, OutboundEnvelope,
    OutboundSink, Role, StorageAdapter, ToolExecutor,
};
use hearth_router::ModelRouter;
use tracing::{debug, info, warn};

use crate::debounce::FlushHandler;
use crate::limiter::{Priority, PriorityLimiter};
use crate::tool_loop::{LoopOptions, ToolLoop};

/// Ties storage, context assembly, routing and tools together.
pub struct Pipeline {
    storage: Arc<dyn StorageAdapter>,
    memory: Option<Arc<dyn MemorySearch>>,
    assembler: ContextAssembler,
    router: Arc<ModelRouter>,
    tool_loop: ToolLoop,
}

impl Pipeline {
    pub fn new(
        config: &HearthConfig,
        storage: Arc<dyn StorageAdapter>,
        memory: Option<Arc<dyn MemorySearch>>,
        router: Arc<ModelRouter>,
        limiter: PriorityLimiter,
        tools: Arc<dyn ToolExecutor>,
    ) -> Self {
        let assembler = ContextAssembler::new(config, storage.clone(), memory.clone())
            .with_tools(tools.definitions());
        let tool_loop = ToolLoop::new(
            router.clone(),
            limiter,
            tools,
            storage.clone(),
            config.tools.max_rounds,
        );
        Self {
            storage,
            memory,
            assembler,
            router,
            tool_loop,
        }
    }

    /// Answers one debounced batch of user messages.
    pub async fn handle_batch(
        &self,
        chat_id: &str,
        batch: &[InboundEnvelope],
    ) -> Result<String, HearthError> {
        let conversation = self
            .storage
            .create_conversation(chat_id, self.router.default_model())
            .await?;
        let pending: Vec<String> = batch.iter().map(|e| e.content.clone()).collect();
        let budget = self.router.context_budget(&conversation.model)?;

        let messages = self
            .assembler
            .build_context(&conversation, &pending, false, None, budget)
            .await?;

        for text in &pending {
            self.persist_text(chat_id, Role::User, text).await?;
        }

        let options = LoopOptions {
            model: conversation.model.clone(),
            priority: Priority::Interactive,
            persist_to: Some(chat_id.to_string()),
            context_budget: budget,
        };
        let outcome = self.tool_loop.run(messages, &options).await?;
        let reply = outcome.response.content.unwrap_or_default();
        self.persist_text(chat_id, Role::Assistant, &reply).await?;

        info!(chat_id, model = %conversation.model, rounds = outcome.rounds, inputs = pending.len(), "batch answered");
        Ok(reply)
    }

    /// Runs a background task in its `task:<name>` log.
    pub async fn run_task(
        &self,
        task_name: &str,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<String, HearthError> {
        let log_id = task_chat_id(task_name);
        let model = model.unwrap_or(self.router.default_model()).to_string();
        self.router.resolve(&model)?;
        let budget = self.router.context_budget(&model)?;

        let conversation = self.storage.create_conversation(&log_id, &model).await?;
        self.storage.insert_message(NewMessage::marker(&log_id)).await?;

        let pending = vec![prompt.to_string()];
        let messages = self
            .assembler
            .build_context(&conversation, &pending, true, Some(task_name), budget)
            .await?;
        self.persist_text(&log_id, Role::User, prompt).await?;

        let options = LoopOptions {
            model: model.clone(),
            priority: Priority::Subagent,
            persist_to: Some(log_id.clone()),
            context_budget: budget,
        };
        let outcome = self.tool_loop.run(messages, &options).await?;
        let reply = outcome.response.content.unwrap_or_default();
        self.persist_text(&log_id, Role::Assistant, &reply).await?;

        info!(task = task_name, model = %model, rounds = outcome.rounds, "task run finished");
        Ok(reply)
    }

    /// Starts a fresh history segment for a chat.
    pub async fn reset_segment(&self, chat_id: &str) -> Result<String, HearthError> {
        let start = self.storage.reset_segment(chat_id).await?;
        info!(chat_id, segment_start = %start, "segment reset");
        Ok(start)
    }

    /// Rebinds a chat to another model, rejecting keys the router cannot resolve.
    pub async fn set_model(&self, chat_id: &str, model: &str) -> Result<(), HearthError> {
        self.router.resolve(model)?;
        self.storage
            .create_conversation(chat_id, self.router.default_model())
            .await?;
        self.storage.set_conversation_model(chat_id, model).await?;
        info!(chat_id, model, "conversation model changed");
        Ok(())
    }

    /// All known conversations.
    pub async fn sessions(&self) -> Result<Vec<Conversation>, HearthError> {
        self.storage.list_conversations().await
    }

    async fn persist_text(&self, chat_id: &str, role: Role, text: &str) -> Result<(), HearthError> {
        let row = self
            .storage
            .insert_message(NewMessage::text(chat_id, role, text))
            .await?;
        if let Some(memory) = &self.memory {
            memory.index_message(row.row_id, &row.content).await;
        }
        Ok(())
    }
}

/// Flush handler that answers batches and pushes replies to the front-end.
pub struct ReplyDispatcher {
    pipeline: Arc<Pipeline>,
    outbound: Arc<dyn OutboundSink>,
}

impl ReplyDispatcher {
    pub fn new(pipeline: Arc<Pipeline>, outbound: Arc<dyn OutboundSink>) -> Self {
        Self { pipeline, outbound }
    }
}

#[async_trait]
impl FlushHandler for ReplyDispatcher {
    async fn flush(&self, chat_id: &str, batch: Vec<InboundEnvelope>) -> Result<(), HearthError> {
        let Some(channel) = batch.last().map(|e| e.channel.clone()) else {
            return Ok(());
        };

        let (content, outcome) = match self.pipeline.handle_batch(chat_id, &batch).await {
            Ok(reply) => (reply, Ok(())),
            Err(e) => (format!("error: {e}"), Err(e)),
        };

        if content.is_empty() {
            debug!(chat_id, "empty reply, nothing to send");
            return outcome;
        }

        let envelope = OutboundEnvelope {
            channel,
            chat_id: chat_id.to_string(),
            content,
        };
        if let Err(e) = self.outbound.push(envelope).await {
            warn!(chat_id, error = %e, "failed to deliver reply");
        }
        outcome
    }
}
