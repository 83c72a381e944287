//! Remote embedding provider over an OpenAI-compatible HTTP API.

use super::{EmbeddingSource, EMBEDDING_DIM};
use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use std::time::Duration;

/// Per-request timeout. The engine has no internal cancellation, so a hung
/// provider call must be bounded here.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Embeddings endpoint URL
    pub endpoint: String,
    /// Bearer token; empty disables the provider
    pub api_key: String,
    /// Model identifier sent with each request
    pub model: String,
    /// Requested output dimension
    pub dimensions: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/embeddings".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            dimensions: EMBEDDING_DIM,
        }
    }
}

pub struct RemoteEmbeddingSource {
    config: RemoteConfig,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl RemoteEmbeddingSource {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            config,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl EmbeddingSource for RemoteEmbeddingSource {
    fn supports_embedding(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let response = self
            .client
            .post(self.config.endpoint.as_str())
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.config.api_key)
            .json(&serde_json::json!({
                "model": self.config.model,
                "input": text,
                "dimensions": self.config.dimensions,
            }))
            .send()
            .with_context(|| format!("embedding request to {} failed", self.config.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!(
                "embedding endpoint returned {} for model '{}': {}",
                status,
                self.config.model,
                body.chars().take(200).collect::<String>()
            );
        }

        let parsed: EmbeddingResponse = response
            .json()
            .context("malformed embedding response body")?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("embedding response contained no vectors"))?
            .embedding;

        if embedding.len() != self.config.dimensions {
            bail!(
                "embedding response dimension {} does not match configured {}",
                embedding.len(),
                self.config.dimensions
            );
        }

        Ok(embedding)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
