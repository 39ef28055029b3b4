// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model provider for deterministic testing.
//!
//! `MockProvider` implements `ProviderClient` with a queue of scripted
//! outcomes, enabling fast tests without a model backend.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use hearth_core::{
    ChatResponse, FinishReason, HearthError, ProviderClient, ProviderRequest, TokenUsage, ToolCall,
};

/// A mock provider that returns scripted responses and records requests.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty, a
/// default "mock response" text is returned.
pub struct MockProvider {
    script: Mutex<VecDeque<Result<ChatResponse, HearthError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty script.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock provider pre-loaded with plain text replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let provider = Self::new();
        for text in responses {
            provider.push_text(text);
        }
        provider
    }

    /// Queue a plain text reply.
    pub fn push_text(&self, text: impl Into<String>) {
        self.push(Ok(text_response(text.into())));
    }

    /// Queue a reply carrying tool calls.
    pub fn push_tool_calls(&self, content: Option<&str>, calls: Vec<ToolCall>) {
        self.push(Ok(ChatResponse {
            content: content.map(str::to_string),
            tool_calls: Some(calls),
            finish_reason: FinishReason::ToolCalls,
            usage: usage(),
        }));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: HearthError) {
        self.push(Err(error));
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Last request received.
    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).last().cloned()
    }

    fn push(&self, outcome: Result<ChatResponse, HearthError>) {
        self.script.lock().unwrap_or_else(|p| p.into_inner()).push_back(outcome);
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn usage() -> TokenUsage {
    TokenUsage {
        input_tokens: 10,
        output_tokens: 20,
    }
}

fn text_response(text: String) -> ChatResponse {
    ChatResponse {
        content: Some(text),
        tool_calls: None,
        finish_reason: FinishReason::Stop,
        usage: usage(),
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    async fn chat(&self, request: ProviderRequest) -> Result<ChatResponse, HearthError> {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).push(request);
        self.script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
            .unwrap_or_else(|| Ok(text_response("mock response".to_string())))
    }
}
