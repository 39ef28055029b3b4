// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded multi-round tool execution.
//!
//! Each round sends the running message list to the router under a limiter
//! permit. If the model asks for tools, the calls and their results are
//! appended (and optionally persisted) and the loop goes around again; a
//! response without tool calls ends the loop.

use std::sync::Arc;

use hearth_core::tokens::messages_tokens;
use hearth_core::{
    ChatMessage, ChatRequest, ChatResponse, HearthError, NewMessage, StorageAdapter, ToolCall,
    ToolExecutor,
};
use hearth_router::ModelRouter;
use tracing::{debug, info, warn};

use crate::limiter::{Priority, PriorityLimiter};

/// States of one loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting on the model for the next response.
    AwaitingModel,
    /// Running the tool calls of the last response.
    ExecutingTools,
    /// The model answered without tool calls.
    Done,
    /// The round limit was reached.
    Aborted,
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopState::AwaitingModel => write!(f, "awaiting_model"),
            LoopState::ExecutingTools => write!(f, "executing_tools"),
            LoopState::Done => write!(f, "done"),
            LoopState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Per-run settings.
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Model key passed to the router.
    pub model: String,
    pub priority: Priority,
    /// Conversation to persist tool calls and results into, if any.
    pub persist_to: Option<String>,
    /// Token budget of the model; exceeding it only logs a warning.
    pub context_budget: usize,
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// The final, tool-free response.
    pub response: ChatResponse,
    /// Message list sent on the final round.
    pub messages: Vec<ChatMessage>,
    /// Provider calls made.
    pub rounds: u32,
}

/// Runs the model/tool rounds for one turn.
pub struct ToolLoop {
    router: Arc<ModelRouter>,
    limiter: PriorityLimiter,
    tools: Arc<dyn ToolExecutor>,
    storage: Arc<dyn StorageAdapter>,
    max_rounds: u32,
}

impl ToolLoop {
    pub fn new(
        router: Arc<ModelRouter>,
        limiter: PriorityLimiter,
        tools: Arc<dyn ToolExecutor>,
        storage: Arc<dyn StorageAdapter>,
        max_rounds: u32,
    ) -> Self {
        Self {
            router,
            limiter,
            tools,
            storage,
            max_rounds,
        }
    }

    pub fn tools(&self) -> &Arc<dyn ToolExecutor> {
        &self.tools
    }

    /// Drives the loop from `messages` until the model stops asking for tools.
    pub async fn run(
        &self,
        mut messages: Vec<ChatMessage>,
        options: &LoopOptions,
    ) -> Result<LoopOutcome, HearthError> {
        let definitions = self.tools.definitions();
        let mut state = LoopState::AwaitingModel;
        let mut rounds = 0u32;
        let mut pending: Vec<ToolCall> = Vec::new();
        let mut last: Option<ChatResponse> = None;

        loop {
            debug!(model = %options.model, round = rounds, %state, "tool loop step");
            match state {
                LoopState::AwaitingModel => {
                    if rounds >= self.max_rounds {
                        state = LoopState::Aborted;
                        continue;
                    }
                    rounds += 1;

                    let request = ChatRequest {
                        messages: messages.clone(),
                        tools: definitions.clone(),
                    };
                    let response = self
                        .limiter
                        .with_permit(options.priority, self.router.chat(request, &options.model))
                        .await?;

                    match response.requested_tools() {
                        Some(calls) => {
                            pending = calls.to_vec();
                            messages.push(ChatMessage::assistant_tool_calls(
                                response.content.clone(),
                                pending.clone(),
                            ));
                            state = LoopState::ExecutingTools;
                        }
                        None => {
                            last = Some(response);
                            state = LoopState::Done;
                        }
                    }
                }
                LoopState::ExecutingTools => {
                    info!(model = %options.model, round = rounds, calls = pending.len(), "executing tool calls");
                    let results = self.tools.execute_all(&pending).await;
                    for result in &results {
                        messages.push(ChatMessage::tool(&result.call_id, &result.content));
                    }

                    if let Some(chat_id) = options.persist_to.as_deref() {
                        for call in &pending {
                            self.storage
                                .insert_message(NewMessage::tool_call(chat_id, call))
                                .await?;
                        }
                        for result in &results {
                            self.storage
                                .insert_message(NewMessage::tool_result(chat_id, result))
                                .await?;
                        }
                    }

                    let used = messages_tokens(&messages);
                    if used > options.context_budget {
                        warn!(
                            model = %options.model,
                            round = rounds,
                            used,
                            budget = options.context_budget,
                            "tool results exceed the context budget"
                        );
                    }
                    pending.clear();
                    state = LoopState::AwaitingModel;
                }
                LoopState::Done => {
                    let Some(response) = last else {
                        return Err(HearthError::Internal("tool loop finished without a response".into()));
                    };
                    return Ok(LoopOutcome {
                        response,
                        messages,
                        rounds,
                    });
                }
                LoopState::Aborted => {
                    warn!(model = %options.model, max_rounds = self.max_rounds, "tool loop exceeded round limit");
                    return Err(HearthError::ToolLoopExceeded {
                        max_rounds: self.max_rounds,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use hearth_config::HearthConfig;
    use hearth_core::{MessageType, ProviderClient, Role};
    use hearth_storage::{Database, SqliteStorage};
    use hearth_test_utils::{MockProvider, MockToolExecutor};

    struct Fixture {
        _dir: tempfile::TempDir,
        provider: Arc<MockProvider>,
        tools: Arc<MockToolExecutor>,
        storage: Arc<SqliteStorage>,
        tool_loop: ToolLoop,
    }

    async fn fixture(max_rounds: u32) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("loop.db"), true).await.unwrap();
        let storage = Arc::new(SqliteStorage::new(db));
        let provider = Arc::new(MockProvider::new());
        let tools = Arc::new(MockToolExecutor::new());

        let config = HearthConfig::default();
        let client: Arc<dyn ProviderClient> = provider.clone();
        let router = Arc::new(ModelRouter::new(
            &config,
            HashMap::from([("ollama".to_string(), client)]),
        ));
        let tool_loop = ToolLoop::new(
            router,
            PriorityLimiter::new(1),
            tools.clone(),
            storage.clone(),
            max_rounds,
        );
        Fixture {
            _dir: dir,
            provider,
            tools,
            storage,
            tool_loop,
        }
    }

    fn options(persist_to: Option<&str>) -> LoopOptions {
        LoopOptions {
            model: "ollama/llama3.2".into(),
            priority: Priority::Interactive,
            persist_to: persist_to.map(str::to_string),
            context_budget: 32_768,
        }
    }

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: "lookup".into(),
            arguments: r#"{"q":"x"}"#.into(),
        }
    }

    #[tokio::test]
    async fn plain_answer_finishes_in_one_round() {
        let f = fixture(5).await;
        f.provider.push_text("Hi");

        let out = f
            .tool_loop
            .run(vec![ChatMessage::user("Hello!")], &options(None))
            .await
            .unwrap();
        assert_eq!(out.rounds, 1);
        assert_eq!(out.response.content.as_deref(), Some("Hi"));
        assert!(f.tools.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_tool_call_list_terminates() {
        let f = fixture(5).await;
        f.provider.push_tool_calls(Some("done"), vec![]);

        let out = f
            .tool_loop
            .run(vec![ChatMessage::user("go")], &options(None))
            .await
            .unwrap();
        assert_eq!(out.rounds, 1);
        assert!(f.tools.calls().is_empty());
    }

    #[tokio::test]
    async fn tool_results_follow_call_order_and_are_persisted() {
        let f = fixture(5).await;
        f.storage.create_conversation("c1", "ollama/llama3.2").await.unwrap();
        f.provider.push_tool_calls(None, vec![call("a"), call("b")]);
        f.provider.push_text("all done");

        let out = f
            .tool_loop
            .run(vec![ChatMessage::user("go")], &options(Some("c1")))
            .await
            .unwrap();
        assert_eq!(out.rounds, 2);
        assert_eq!(out.response.content.as_deref(), Some("all done"));

        // user, assistant(tool_calls), tool a, tool b
        assert_eq!(out.messages.len(), 4);
        assert_eq!(out.messages[1].role, Role::Assistant);
        assert_eq!(out.messages[2].tool_call_id.as_deref(), Some("a"));
        assert_eq!(out.messages[3].tool_call_id.as_deref(), Some("b"));

        // The second request carried the tool messages.
        let requests = f.provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 4);

        let rows = f.storage.segment_messages("c1", "").await.unwrap();
        let types: Vec<MessageType> = rows.iter().map(|m| m.message_type).collect();
        assert_eq!(
            types,
            vec![
                MessageType::ToolCall,
                MessageType::ToolCall,
                MessageType::ToolResult,
                MessageType::ToolResult
            ]
        );
    }

    #[tokio::test]
    async fn nothing_persisted_without_target() {
        let f = fixture(5).await;
        f.storage.create_conversation("c1", "ollama/llama3.2").await.unwrap();
        f.provider.push_tool_calls(None, vec![call("a")]);
        f.provider.push_text("ok");

        f.tool_loop
            .run(vec![ChatMessage::user("go")], &options(None))
            .await
            .unwrap();
        assert!(f.storage.segment_messages("c1", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn round_limit_aborts_the_loop() {
        let f = fixture(3).await;
        for i in 0..5 {
            f.provider.push_tool_calls(None, vec![call(&i.to_string())]);
        }

        let err = f
            .tool_loop
            .run(vec![ChatMessage::user("go")], &options(None))
            .await
            .unwrap_err();
        assert!(matches!(err, HearthError::ToolLoopExceeded { max_rounds: 3 }));
        assert_eq!(f.provider.requests().len(), 3);
        assert_eq!(f.tools.calls().len(), 3);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn over_budget_only_warns() {
        let f = fixture(5).await;
        f.tools.respond_with("x".repeat(4_000));
        f.provider.push_tool_calls(None, vec![call("a")]);
        f.provider.push_text("fine");

        let mut opts = options(None);
        opts.context_budget = 100;
        let out = f.tool_loop.run(vec![ChatMessage::user("go")], &opts).await.unwrap();
        assert_eq!(out.response.content.as_deref(), Some("fine"));
        assert!(logs_contain("tool results exceed the context budget"));
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let f = fixture(5).await;
        f.provider.push_error(HearthError::provider_status(400, "bad request"));

        let err = f
            .tool_loop
            .run(vec![ChatMessage::user("go")], &options(None))
            .await
            .unwrap_err();
        assert!(matches!(err, HearthError::Provider { status: Some(400), .. }));
    }
}
