// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible provider adapters for the Hearth agent runtime.
//!
//! Every configured provider speaks the `/chat/completions` dialect, which
//! covers OpenAI itself as well as Ollama, vLLM and most hosted gateways.

pub mod client;
pub mod embeddings;
pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use hearth_config::HearthConfig;
use hearth_core::{EmbeddingAdapter, HearthError, ProviderClient};
use tracing::info;

pub use client::OpenAiClient;
pub use embeddings::OpenAiEmbedder;

/// Builds one client per `[providers.<name>]` table, keyed by name.
pub fn build_providers(
    config: &HearthConfig,
) -> Result<HashMap<String, Arc<dyn ProviderClient>>, HearthError> {
    let mut clients: HashMap<String, Arc<dyn ProviderClient>> = HashMap::new();
    for (name, provider) in &config.providers {
        match provider.kind.as_str() {
            "openai" => {
                clients.insert(name.clone(), Arc::new(OpenAiClient::new(name, provider)?));
            }
            other => {
                return Err(HearthError::Config(format!(
                    "provider `{name}` has unsupported type `{other}`"
                )));
            }
        }
        info!(provider = %name, endpoint = %provider.endpoint, "provider initialized");
    }
    Ok(clients)
}

/// Builds the embedding client when `[memory.embedding]` is configured.
pub fn build_embedder(
    config: &HearthConfig,
) -> Result<Option<Arc<dyn EmbeddingAdapter>>, HearthError> {
    match &config.memory.embedding {
        Some(embedding) => {
            info!(model = %embedding.model, "embedding client initialized");
            Ok(Some(Arc::new(OpenAiEmbedder::new(embedding)?)))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_config::model::ProviderConfig;

    #[test]
    fn builds_client_per_provider() {
        let mut config = HearthConfig::default();
        config.providers.insert(
            "zai".into(),
            ProviderConfig {
                kind: "openai".into(),
                endpoint: "https://api.z.ai/api/paas/v4".into(),
                api_key: Some("k".into()),
            },
        );
        let clients = build_providers(&config).unwrap();
        assert!(clients.contains_key("ollama"));
        assert!(clients.contains_key("zai"));
    }

    #[test]
    fn rejects_unknown_provider_type() {
        let mut config = HearthConfig::default();
        config.providers.insert(
            "weird".into(),
            ProviderConfig {
                kind: "grpc".into(),
                endpoint: "http://x".into(),
                api_key: None,
            },
        );
        assert!(matches!(build_providers(&config), Err(HearthError::Config(_))));
    }

    #[test]
    fn no_embedder_without_config() {
        assert!(build_embedder(&HearthConfig::default()).unwrap().is_none());
    }
}
