// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding client for OpenAI-compatible `/embeddings` endpoints.

use async_trait::async_trait;
use hearth_config::model::EmbeddingConfig;
use hearth_core::{EmbeddingAdapter, HearthError};
use tracing::debug;

use crate::client::{build_http_client, endpoint_url};
use crate::types::{EmbeddingRequest, EmbeddingResponse};

/// Remote embedding model reached over HTTP.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, HearthError> {
        Ok(Self {
            client: build_http_client(config.api_key.as_deref())?,
            url: endpoint_url(&config.endpoint, "embeddings"),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, HearthError> {
        let mut batch = self.embed_batch(&[text.to_string()]).await?;
        batch
            .pop()
            .ok_or_else(|| HearthError::Internal("embedding response was empty".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, HearthError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(HearthError::provider_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(HearthError::provider_status(
                status.as_u16(),
                format!("embedding API returned {status}: {}", text.trim()),
            ));
        }

        let mut parsed: EmbeddingResponse =
            response.json().await.map_err(HearthError::provider_transport)?;
        if parsed.data.len() != texts.len() {
            return Err(HearthError::provider_status(
                status.as_u16(),
                format!(
                    "embedding API returned {} vectors for {} inputs",
                    parsed.data.len(),
                    texts.len()
                ),
            ));
        }
        parsed.data.sort_by_key(|d| d.index);
        debug!(count = texts.len(), model = %self.model, "embedded batch");
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(uri: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            endpoint: format!("{uri}/v1"),
            model: "nomic-embed-text".into(),
            api_key: None,
        }
    }

    #[tokio::test]
    async fn batch_results_follow_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(serde_json::json!({"model": "nomic-embed-text"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"embedding": [0.0, 1.0], "index": 1},
                    {"embedding": [1.0, 0.0], "index": 0}
                ]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&config(&server.uri())).unwrap();
        let out = embedder
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(out, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn single_embed_uses_batch_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.5, 0.5, 0.5], "index": 0}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&config(&server.uri())).unwrap();
        assert_eq!(embedder.embed("hello").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn server_error_is_reported_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(&config(&server.uri())).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, HearthError::Provider { status: Some(500), .. }));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        let embedder = OpenAiEmbedder::new(&config(&server.uri())).unwrap();
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }
}
