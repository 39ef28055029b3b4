// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator command registry.
//!
//! Each [`OperatorCommand`] is registered under its name and validates its
//! own params. The server looks commands up by name and streams any progress
//! lines a command emits before writing its final result.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use hearth_agent::{DebounceBuffer, Pipeline};
use hearth_core::{HearthError, Maintenance, MemorySearch, Schedule, Scheduler, now_timestamp};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Failure of an operator command, rendered as the `error` field.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Failed(#[from] HearthError),
}

/// A command the operator CLI can run.
#[async_trait]
pub trait OperatorCommand: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs the command. Progress lines sent on `progress` are streamed to
    /// the operator ahead of the result.
    async fn run(&self, params: Value, progress: mpsc::Sender<String>)
    -> Result<Value, CommandError>;
}

/// Commands indexed by name.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Arc<dyn OperatorCommand>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command under its `name()`, replacing any previous one.
    pub fn register(&mut self, command: Arc<dyn OperatorCommand>) {
        self.commands.insert(command.name(), command);
    }

    /// Sorted command names.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub async fn dispatch(
        &self,
        name: &str,
        params: Value,
        progress: mpsc::Sender<String>,
    ) -> Result<Value, CommandError> {
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| CommandError::Unknown(name.to_string()))?;
        debug!(command = name, "running operator command");
        command.run(params, progress).await
    }
}

/// Collaborators the built-in commands need.
pub struct CommandDeps {
    pub pipeline: Arc<Pipeline>,
    pub buffer: DebounceBuffer,
    pub scheduler: Arc<dyn Scheduler>,
    pub memory: Arc<dyn MemorySearch>,
    pub maintenance: Arc<dyn Maintenance>,
    /// Result count when `memory_search` omits `top_k`.
    pub default_top_k: usize,
}

/// Registry with every built-in command.
pub fn builtin_registry(deps: CommandDeps) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(Arc::new(Status {
        pipeline: deps.pipeline.clone(),
        buffer: deps.buffer,
    }));
    registry.register(Arc::new(Sessions {
        pipeline: deps.pipeline,
    }));
    registry.register(Arc::new(ScheduleList {
        scheduler: deps.scheduler.clone(),
    }));
    registry.register(Arc::new(ScheduleAdd {
        scheduler: deps.scheduler.clone(),
    }));
    registry.register(Arc::new(ScheduleRemove {
        scheduler: deps.scheduler,
    }));
    registry.register(Arc::new(MemorySearchCommand {
        memory: deps.memory,
        default_top_k: deps.default_top_k,
    }));
    registry.register(Arc::new(Reindex {
        maintenance: deps.maintenance,
    }));
    registry
}

/// Deserializes params, treating a missing params object as `{}`.
fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, CommandError> {
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params).map_err(|e| CommandError::InvalidParams(e.to_string()))
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, CommandError> {
    serde_json::to_value(value).map_err(|e| CommandError::Failed(HearthError::Internal(e.to_string())))
}

struct Status {
    pipeline: Arc<Pipeline>,
    buffer: DebounceBuffer,
}

#[async_trait]
impl OperatorCommand for Status {
    fn name(&self) -> &'static str {
        "status"
    }

    async fn run(&self, _params: Value, _progress: mpsc::Sender<String>) -> Result<Value, CommandError> {
        let sessions = self.pipeline.sessions().await?.len();
        Ok(json!({
            "sessions": sessions,
            "pendingChats": self.buffer.tracked_chats(),
        }))
    }
}

struct Sessions {
    pipeline: Arc<Pipeline>,
}

#[async_trait]
impl OperatorCommand for Sessions {
    fn name(&self) -> &'static str {
        "sessions"
    }

    async fn run(&self, _params: Value, _progress: mpsc::Sender<String>) -> Result<Value, CommandError> {
        let sessions: Vec<Value> = self
            .pipeline
            .sessions()
            .await?
            .into_iter()
            .map(|c| json!({ "chatId": c.chat_id, "model": c.model }))
            .collect();
        Ok(Value::Array(sessions))
    }
}

struct ScheduleList {
    scheduler: Arc<dyn Scheduler>,
}

#[async_trait]
impl OperatorCommand for ScheduleList {
    fn name(&self) -> &'static str {
        "schedule_list"
    }

    async fn run(&self, _params: Value, _progress: mpsc::Sender<String>) -> Result<Value, CommandError> {
        to_value(self.scheduler.list().await?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScheduleAddParams {
    name: String,
    cron: String,
    message: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    inject_into: Option<String>,
}

struct ScheduleAdd {
    scheduler: Arc<dyn Scheduler>,
}

#[async_trait]
impl OperatorCommand for ScheduleAdd {
    fn name(&self) -> &'static str {
        "schedule_add"
    }

    async fn run(&self, params: Value, _progress: mpsc::Sender<String>) -> Result<Value, CommandError> {
        let p: ScheduleAddParams = parse_params(params)?;
        let name = p.name.clone();
        self.scheduler
            .add(Schedule {
                name: p.name,
                cron: p.cron,
                message: p.message,
                model: p.model,
                inject_into: p.inject_into,
                created_at: now_timestamp(),
            })
            .await?;
        Ok(json!({ "added": name }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NameParams {
    name: String,
}

struct ScheduleRemove {
    scheduler: Arc<dyn Scheduler>,
}

#[async_trait]
impl OperatorCommand for ScheduleRemove {
    fn name(&self) -> &'static str {
        "schedule_remove"
    }

    async fn run(&self, params: Value, _progress: mpsc::Sender<String>) -> Result<Value, CommandError> {
        let p: NameParams = parse_params(params)?;
        let removed = self.scheduler.remove(&p.name).await?;
        Ok(json!({ "removed": removed }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MemorySearchParams {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

struct MemorySearchCommand {
    memory: Arc<dyn MemorySearch>,
    default_top_k: usize,
}

#[async_trait]
impl OperatorCommand for MemorySearchCommand {
    fn name(&self) -> &'static str {
        "memory_search"
    }

    async fn run(&self, params: Value, _progress: mpsc::Sender<String>) -> Result<Value, CommandError> {
        let p: MemorySearchParams = parse_params(params)?;
        if p.query.trim().is_empty() {
            return Err(CommandError::InvalidParams("query must not be empty".into()));
        }
        let top_k = p.top_k.unwrap_or(self.default_top_k);
        to_value(self.memory.search_chunks(&p.query, top_k).await)
    }
}

struct Reindex {
    maintenance: Arc<dyn Maintenance>,
}

#[async_trait]
impl OperatorCommand for Reindex {
    fn name(&self) -> &'static str {
        "reindex"
    }

    async fn run(&self, _params: Value, progress: mpsc::Sender<String>) -> Result<Value, CommandError> {
        let indexed = self.maintenance.reindex(progress).await?;
        Ok(json!({ "indexed": indexed }))
    }
}
