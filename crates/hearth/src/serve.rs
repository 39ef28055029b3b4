// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hearth serve` command implementation.
//!
//! Opens SQLite storage, builds the provider clients, model router, memory
//! search, tool registry and message pipeline, then serves the IPC socket
//! until SIGTERM/SIGINT.

use std::sync::Arc;

use hearth_agent::{DebounceBuffer, Pipeline, PriorityLimiter, ReplyDispatcher};
use hearth_config::HearthConfig;
use hearth_core::{HearthError, MemorySearch};
use hearth_ipc::{CommandDeps, FrontendGateway, IpcServer, ServerState, builtin_registry};
use hearth_memory::{HybridRetriever, MemoryStore, Reindexer};
use hearth_router::ModelRouter;
use hearth_skill::ToolRegistry;
use hearth_storage::{SqliteScheduler, SqliteStorage};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs the `hearth serve` command.
pub async fn run_serve(config: HearthConfig) -> Result<(), HearthError> {
    init_tracing(&config.agent.log_level);
    info!(name = %config.agent.name, "starting hearth serve");

    let cancel = hearth_agent::install_signal_handler();
    serve(config, cancel).await?;

    info!("hearth serve shutdown complete");
    Ok(())
}

/// Wires every subsystem and serves until `cancel` fires.
pub async fn serve(config: HearthConfig, cancel: CancellationToken) -> Result<(), HearthError> {
    let storage = SqliteStorage::open(&config.storage).await?;
    let db = storage.database().clone();
    let storage = Arc::new(storage);
    let scheduler = Arc::new(SqliteScheduler::new(db.clone()));

    let embedder = hearth_provider::build_embedder(&config)?;
    if embedder.is_none() {
        info!("no embedding endpoint configured, memory search is lexical only");
    }
    let store = MemoryStore::new(db.clone());
    let retriever = Arc::new(HybridRetriever::new(
        store.clone(),
        embedder.clone(),
        config.memory.clone(),
    ));
    let reindexer = Arc::new(Reindexer::new(store, embedder));
    let search: Arc<dyn MemorySearch> = retriever.clone();
    let memory = if config.memory.enabled {
        Some(search)
    } else {
        info!("memory retrieval disabled by configuration");
        None
    };

    let providers = hearth_provider::build_providers(&config)?;
    let router = Arc::new(ModelRouter::new(&config, providers));
    info!(default_model = %router.default_model(), "model router initialized");

    let mut tools = ToolRegistry::new();
    hearth_skill::builtin::register_builtins(&mut tools, &config.tools)?;
    info!("tool registry initialized with {} built-in tools", tools.len());

    let limiter = PriorityLimiter::from_config(&config.limiter);
    let pipeline = Arc::new(Pipeline::new(
        &config,
        storage,
        memory,
        router,
        limiter,
        Arc::new(tools),
    ));

    let gateway = Arc::new(FrontendGateway::new());
    let dispatcher = Arc::new(ReplyDispatcher::new(pipeline.clone(), gateway.clone()));
    let buffer = DebounceBuffer::new(&config.debounce, dispatcher);
    let commands = builtin_registry(CommandDeps {
        pipeline: pipeline.clone(),
        buffer: buffer.clone(),
        scheduler,
        memory: retriever,
        maintenance: reindexer,
        default_top_k: config.memory.top_k,
    });

    let state = Arc::new(ServerState {
        buffer,
        pipeline,
        gateway,
        commands,
    });
    let server = IpcServer::bind(&config.ipc, state).await?;
    server.run(cancel).await?;

    if let Err(e) = db.checkpoint().await {
        warn!(error = %e, "WAL checkpoint on shutdown failed");
    }
    Ok(())
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured
/// level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hearth={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use futures::{SinkExt, StreamExt};
    use serde_json::{Value, json};
    use tokio::net::UnixStream;
    use tokio_util::codec::{Framed, LinesCodec};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WAIT: Duration = Duration::from_secs(10);

    fn completion(content: &str) -> Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 1, "total_tokens": 13}
        })
    }

    fn test_config(dir: &std::path::Path, endpoint: String) -> HearthConfig {
        let mut config = HearthConfig::default();
        config.storage.database_path = dir.join("hearth.db").to_string_lossy().into_owned();
        config.ipc.socket_path = dir.join("hearth.sock").to_string_lossy().into_owned();
        config.tools.sandbox_root = dir.join("workspace").to_string_lossy().into_owned();
        config.debounce.debounce_ms = 20;
        config.models.retry_base_ms = 1;
        if let Some(ollama) = config.providers.get_mut("ollama") {
            ollama.endpoint = endpoint;
        }
        config
    }

    async fn wait_for_socket(path: &std::path::Path) -> UnixStream {
        tokio::time::timeout(WAIT, async {
            loop {
                if let Ok(stream) = UnixStream::connect(path).await {
                    return stream;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn serves_a_frontend_end_to_end() {
        let provider = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hi")))
            .mount(&provider)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), format!("{}/v1", provider.uri()));
        let socket = std::path::PathBuf::from(&config.ipc.socket_path);
        let cancel = CancellationToken::new();
        let server = tokio::spawn(serve(config, cancel.clone()));

        let stream = wait_for_socket(&socket).await;
        let mut client = Framed::new(stream, LinesCodec::new());
        client
            .send(json!({"type": "register", "name": "e2e"}).to_string())
            .await
            .unwrap();
        client
            .send(
                json!({
                    "type": "inbound",
                    "id": "m1",
                    "channel": "telegram",
                    "chatId": "42",
                    "content": "Hello!",
                    "timestamp": "2026-01-01T00:00:00.000Z"
                })
                .to_string(),
            )
            .await
            .unwrap();

        let line = tokio::time::timeout(WAIT, client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let frame: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(
            frame,
            json!({"type": "outbound", "channel": "telegram", "chatId": "42", "content": "Hi"})
        );

        cancel.cancel();
        let line = tokio::time::timeout(WAIT, client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(line, r#"{"type":"shutdown"}"#);

        server.await.unwrap().unwrap();
        assert!(!socket.exists());
    }

    #[tokio::test]
    async fn provider_failure_reaches_the_frontend_as_error_text() {
        let provider = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&provider)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), format!("{}/v1", provider.uri()));
        let socket = std::path::PathBuf::from(&config.ipc.socket_path);
        let cancel = CancellationToken::new();
        let server = tokio::spawn(serve(config, cancel.clone()));

        let stream = wait_for_socket(&socket).await;
        let mut client = Framed::new(stream, LinesCodec::new());
        client
            .send(json!({"type": "register"}).to_string())
            .await
            .unwrap();
        client
            .send(
                json!({
                    "type": "inbound",
                    "id": "m1",
                    "channel": "cli",
                    "chatId": "7",
                    "content": "anyone there?",
                    "timestamp": "2026-01-01T00:00:00.000Z"
                })
                .to_string(),
            )
            .await
            .unwrap();

        let line = tokio::time::timeout(WAIT, client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let frame: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(frame["chatId"], "7");
        assert!(frame["content"].as_str().unwrap().starts_with("error: "));

        cancel.cancel();
        server.await.unwrap().unwrap();
    }
}
