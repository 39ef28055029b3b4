// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model key resolution and fallback-chain routing.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use hearth_config::HearthConfig;
use hearth_config::model::{ModelEntry, ModelsConfig, ProviderConfig};
use hearth_core::{ChatRequest, ChatResponse, HearthError, ProviderClient, ProviderRequest};
use tracing::{info, warn};

use crate::retry::RetryPolicy;

/// Splits a `provider/model` key at the first `/`.
///
/// The model part may itself contain `/` (e.g. `openrouter/meta/llama-3`).
pub fn parse_model_key(key: &str) -> Result<(&str, &str), HearthError> {
    match key.split_once('/') {
        Some((provider, model)) if !provider.is_empty() && !model.is_empty() => {
            Ok((provider, model))
        }
        _ => Err(HearthError::Config(format!(
            "model key `{key}` must have the form provider/model"
        ))),
    }
}

/// A resolved candidate ready to be called.
struct Candidate<'a> {
    key: &'a str,
    client: Arc<dyn ProviderClient>,
    model: ModelEntry,
}

/// Routes chat requests to configured providers with retry and fallback.
pub struct ModelRouter {
    models: ModelsConfig,
    providers: BTreeMap<String, ProviderConfig>,
    clients: HashMap<String, Arc<dyn ProviderClient>>,
    retry: RetryPolicy,
}

impl ModelRouter {
    /// Creates a router over the given provider clients, keyed by provider name.
    pub fn new(config: &HearthConfig, clients: HashMap<String, Arc<dyn ProviderClient>>) -> Self {
        Self {
            models: config.models.clone(),
            providers: config.providers.clone(),
            clients,
            retry: RetryPolicy::from_config(&config.models),
        }
    }

    /// Overrides the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Model key used for new conversations.
    pub fn default_model(&self) -> &str {
        &self.models.default
    }

    /// Looks up the provider and catalog entry for a model key.
    pub fn resolve(&self, key: &str) -> Result<(ProviderConfig, ModelEntry), HearthError> {
        let (provider_name, model_id) = parse_model_key(key)?;
        let provider = self.providers.get(provider_name).ok_or_else(|| {
            HearthError::Config(format!("unknown provider `{provider_name}` in `{key}`"))
        })?;
        let model = self
            .models
            .catalog
            .iter()
            .find(|m| m.provider == provider_name && m.id == model_id)
            .ok_or_else(|| HearthError::Config(format!("model `{key}` is not in the catalog")))?;
        Ok((provider.clone(), model.clone()))
    }

    /// Context budget (tokens) of a model.
    pub fn context_budget(&self, key: &str) -> Result<usize, HearthError> {
        self.resolve(key).map(|(_, model)| model.context_budget)
    }

    fn candidate<'a>(&self, key: &'a str) -> Result<Candidate<'a>, HearthError> {
        let (_, model) = self.resolve(key)?;
        let client = self.clients.get(&model.provider).cloned().ok_or_else(|| {
            HearthError::Config(format!("no client registered for provider `{}`", model.provider))
        })?;
        Ok(Candidate { key, client, model })
    }

    /// Sends `request` to `key`, then down the fallback chain on transient failure.
    ///
    /// Context-length and other non-retryable errors return immediately.
    pub async fn chat(&self, request: ChatRequest, key: &str) -> Result<ChatResponse, HearthError> {
        let mut candidates = vec![self.candidate(key)?];
        for fallback in &self.models.fallback {
            if candidates.iter().any(|c| c.key == fallback.as_str()) {
                continue;
            }
            match self.candidate(fallback) {
                Ok(c) => candidates.push(c),
                Err(e) => warn!(model = %fallback, error = %e, "skipping unusable fallback model"),
            }
        }

        let mut attempts = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let provider_request = ProviderRequest {
                model: candidate.model.id.clone(),
                messages: request.messages.clone(),
                tools: request.tools.clone(),
                max_tokens: candidate.model.max_tokens,
                temperature: self.models.temperature,
            };
            attempts.push(candidate.key.to_string());

            match self.retry.call(candidate.client.as_ref(), &provider_request).await {
                Ok(response) => {
                    if attempts.len() > 1 {
                        info!(model = %candidate.key, tried = attempts.len(), "fallback model answered");
                    }
                    return Ok(response);
                }
                Err(e @ HearthError::ContextLengthExceeded { .. }) => return Err(e),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    warn!(model = %candidate.key, error = %e, "model failed, trying next candidate");
                }
            }
        }

        Err(HearthError::AllProvidersFailed { attempts })
    }
}
