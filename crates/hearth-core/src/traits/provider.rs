// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider client trait for LLM backends.

use async_trait::async_trait;

use crate::error::HearthError;
use crate::types::{ChatResponse, ProviderRequest};

/// Client for one configured LLM provider.
///
/// Implementations perform a single attempt; retry, timeout and fallback
/// live in the router.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Sends a chat completion request and returns the full response.
    async fn chat(&self, request: ProviderRequest) -> Result<ChatResponse, HearthError>;
}
