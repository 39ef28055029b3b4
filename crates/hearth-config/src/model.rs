// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Hearth agent runtime.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Hearth configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HearthConfig {
    /// Agent identity and prompt settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// IPC socket settings.
    #[serde(default)]
    pub ipc: IpcConfig,

    /// Inbound burst aggregation.
    #[serde(default)]
    pub debounce: DebounceConfig,

    /// Model-call admission control.
    #[serde(default)]
    pub limiter: LimiterConfig,

    /// Model catalog, default model and fallback chain.
    #[serde(default)]
    pub models: ModelsConfig,

    /// Provider endpoints keyed by provider name.
    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Context assembly settings.
    #[serde(default)]
    pub context: ContextConfig,

    /// Hybrid memory search settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Tool execution settings.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for HearthConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            ipc: IpcConfig::default(),
            debounce: DebounceConfig::default(),
            limiter: LimiterConfig::default(),
            models: ModelsConfig::default(),
            providers: default_providers(),
            context: ContextConfig::default(),
            memory: MemoryConfig::default(),
            tools: ToolsConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl HearthConfig {
    /// Finds a catalog entry by provider name and model id.
    pub fn find_model(&self, provider: &str, id: &str) -> Option<&ModelEntry> {
        self.models
            .catalog
            .iter()
            .find(|m| m.provider == provider && m.id == id)
    }
}

/// Agent identity and prompt configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Workspace system prompt.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Skill descriptions listed in the system prompt.
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: default_system_prompt(),
            skills: Vec::new(),
        }
    }
}

fn default_agent_name() -> String {
    "hearth".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful personal assistant.".to_string()
}

/// Unix socket configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IpcConfig {
    /// Filesystem path of the listening socket.
    #[serde(default = "default_socket_path")]
    pub socket_path: String,

    /// Per-line size ceiling in bytes. Longer lines are dropped.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

fn default_socket_path() -> String {
    dirs::runtime_dir()
        .or_else(dirs::data_dir)
        .map(|p| p.join("hearth").join("hearth.sock"))
        .unwrap_or_else(|| std::path::PathBuf::from("hearth.sock"))
        .to_string_lossy()
        .into_owned()
}

fn default_max_line_bytes() -> usize {
    1024 * 1024
}

/// Debounce buffer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebounceConfig {
    /// Quiet period after the last message before a chat is flushed.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum number of chats tracked at once.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    1500
}

fn default_max_entries() -> usize {
    1000
}

/// Priority limiter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimiterConfig {
    /// Concurrent model calls allowed across all conversations.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_max_concurrent() -> usize {
    3
}

/// Model routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelsConfig {
    /// Model key (`provider/model`) used for new conversations.
    #[serde(default = "default_model_key")]
    pub default: String,

    /// Ordered fallback model keys tried after the requested one fails.
    #[serde(default)]
    pub fallback: Vec<String>,

    /// Sampling temperature for every request.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-attempt request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries per candidate after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff between retries.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Known models.
    #[serde(default = "default_catalog")]
    pub catalog: Vec<ModelEntry>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            default: default_model_key(),
            fallback: Vec::new(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            catalog: default_catalog(),
        }
    }
}

fn default_model_key() -> String {
    "ollama/llama3.2".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_base_ms() -> u64 {
    500
}

fn default_catalog() -> Vec<ModelEntry> {
    vec![ModelEntry {
        provider: "ollama".to_string(),
        id: "llama3.2".to_string(),
        max_tokens: default_max_tokens(),
        context_budget: default_context_budget(),
    }]
}

/// One model in the catalog.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
    /// Provider name (key into `[providers]`).
    pub provider: String,

    /// Provider-side model id. May contain `:`.
    pub id: String,

    /// Completion token cap sent with each request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Prompt token budget used by the context assembler.
    #[serde(default = "default_context_budget")]
    pub context_budget: usize,
}

impl ModelEntry {
    /// The `provider/id` key for this entry.
    pub fn key(&self) -> String {
        format!("{}/{}", self.provider, self.id)
    }
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_context_budget() -> usize {
    32_768
}

/// A provider endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Wire protocol. Only `openai` (chat-completions compatible) is supported.
    #[serde(rename = "type", default = "default_provider_type")]
    pub kind: String,

    /// Base URL, e.g. `http://localhost:11434/v1`.
    pub endpoint: String,

    /// Bearer token. Omitted from requests when unset.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_provider_type() -> String {
    "openai".to_string()
}

fn default_providers() -> BTreeMap<String, ProviderConfig> {
    let mut map = BTreeMap::new();
    map.insert(
        "ollama".to_string(),
        ProviderConfig {
            kind: default_provider_type(),
            endpoint: "http://localhost:11434/v1".to_string(),
            api_key: None,
        },
    );
    map
}

/// Context assembler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Most-recent in-segment messages eligible for interactive history.
    #[serde(default = "default_sliding_window")]
    pub sliding_window: usize,

    /// Complete task runs replayed for subagent calls.
    #[serde(default = "default_subagent_history_runs")]
    pub subagent_history_runs: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            sliding_window: default_sliding_window(),
            subagent_history_runs: default_subagent_history_runs(),
        }
    }
}

fn default_sliding_window() -> usize {
    20
}

fn default_subagent_history_runs() -> usize {
    3
}

/// Memory search configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Whether retrieval augments interactive context.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Candidates fetched from each of the vector and lexical indexes.
    #[serde(default = "default_candidate_k")]
    pub candidate_k: usize,

    /// Fused results kept before token packing.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Maximum cosine distance of the top result for results to be used.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,

    /// Token budget for the retrieval block.
    #[serde(default = "default_memory_max_tokens")]
    pub max_tokens: usize,

    /// Embedding endpoint. Vector search is skipped when unset.
    #[serde(default)]
    pub embedding: Option<EmbeddingConfig>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            candidate_k: default_candidate_k(),
            top_k: default_top_k(),
            relevance_threshold: default_relevance_threshold(),
            max_tokens: default_memory_max_tokens(),
            embedding: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_candidate_k() -> usize {
    20
}

fn default_top_k() -> usize {
    5
}

fn default_relevance_threshold() -> f64 {
    0.8
}

fn default_memory_max_tokens() -> usize {
    1000
}

/// OpenAI-compatible embeddings endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Tool execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Provider calls allowed per turn before the loop aborts.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Root directory the file tool is confined to.
    #[serde(default = "default_sandbox_root")]
    pub sandbox_root: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            sandbox_root: default_sandbox_root(),
        }
    }
}

fn default_max_rounds() -> u32 {
    10
}

fn default_sandbox_root() -> String {
    dirs::data_dir()
        .map(|p| p.join("hearth").join("workspace"))
        .unwrap_or_else(|| std::path::PathBuf::from("workspace"))
        .to_string_lossy()
        .into_owned()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("hearth").join("hearth.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("hearth.db"))
        .to_string_lossy()
        .into_owned()
}
