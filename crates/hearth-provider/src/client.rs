// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat completion endpoints.
//!
//! Provides [`OpenAiClient`], which performs exactly one attempt per call.
//! Retry, timeout and fallback are the router's responsibility.

use async_trait::async_trait;
use hearth_config::model::ProviderConfig;
use hearth_core::{ChatResponse, HearthError, ProviderClient, ProviderRequest};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;

use crate::types::{ApiErrorResponse, ApiMessage, ApiTool, CompletionRequest, CompletionResponse};

/// Body fragments that identify a context-window overflow.
const CONTEXT_LENGTH_MARKERS: [&str; 2] = ["context_length", "maximum context length"];

/// Builds a reqwest client with JSON and optional bearer auth headers.
pub(crate) fn build_http_client(api_key: Option<&str>) -> Result<reqwest::Client, HearthError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        let value = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| HearthError::Config(format!("invalid API key header value: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| HearthError::Config(format!("failed to build HTTP client: {e}")))
}

/// Joins an endpoint base URL and a path segment.
pub(crate) fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// Client for one OpenAI-compatible provider (OpenAI, Ollama, vLLM, ...).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    name: String,
    client: reqwest::Client,
    url: String,
}

impl OpenAiClient {
    /// Creates a client for the provider registered under `name`.
    pub fn new(name: impl Into<String>, config: &ProviderConfig) -> Result<Self, HearthError> {
        Ok(Self {
            name: name.into(),
            client: build_http_client(config.api_key.as_deref())?,
            url: endpoint_url(&config.endpoint, "chat/completions"),
        })
    }

    /// Provider name this client was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn build_body(request: ProviderRequest) -> CompletionRequest {
        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(request.tools.iter().map(ApiTool::from).collect())
        };
        CompletionRequest {
            model: request.model,
            messages: request.messages.iter().map(ApiMessage::from).collect(),
            tools,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    async fn chat(&self, request: ProviderRequest) -> Result<ChatResponse, HearthError> {
        let body = Self::build_body(request);
        debug!(
            provider = %self.name,
            model = %body.model,
            messages = body.messages.len(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(HearthError::provider_transport)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(HearthError::provider_transport)?;
        debug!(provider = %self.name, status = %status, "chat completion response received");

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &text));
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| HearthError::Provider {
                message: format!("failed to parse API response: {e}"),
                status: Some(status.as_u16()),
                source: Some(Box::new(e)),
            })?;
        let usage = parsed.usage;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| HearthError::provider_status(status.as_u16(), "response had no choices"))?;
        Ok(choice.into_chat_response(usage))
    }
}

/// Maps a non-success response to the matching error kind.
fn classify_failure(status: u16, body: &str) -> HearthError {
    let detail = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    if matches!(status, 400 | 413) {
        let lower = body.to_lowercase();
        if CONTEXT_LENGTH_MARKERS.iter().any(|m| lower.contains(m)) {
            return HearthError::ContextLengthExceeded { message: detail };
        }
    }
    HearthError::provider_status(status, format!("API returned {status}: {detail}"))
}
