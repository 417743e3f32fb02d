//! Embedding provider abstraction and HTTP implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::IngestError;
use crate::limiter::RateLimiter;

/// Rate budget name the HTTP embedder registers and consumes.
///
/// The embedding API has its own quota, independent of any connector's.
pub const EMBEDDING_RATE_BUDGET: &str = "embedding-api";

/// Produces embedding vectors for text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError>;

    /// Embedding size every returned vector has.
    fn dimensions(&self) -> usize;
}

/// Configuration for the HTTP embedder.
#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    /// Endpoint of an OpenAI-compatible embeddings API.
    pub endpoint: String,
    /// Model name to request.
    pub model: String,
    /// Bearer token.
    pub api_key: String,
    /// Embedding size the model produces.
    pub dimensions: usize,
    /// Maximum texts per request.
    pub batch_size: usize,
    /// Rate budget for the embedding API, registered at construction.
    pub rate_budget: Option<(usize, Duration)>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedder backed by an OpenAI-compatible embeddings API.
pub struct HttpEmbedder {
    config: HttpEmbedderConfig,
    http: reqwest::Client,
    limiter: Option<Arc<RateLimiter>>,
}

impl HttpEmbedder {
    /// Create an embedder; registers its rate budget on the limiter when
    /// one is configured.
    pub fn new(
        config: HttpEmbedderConfig,
        limiter: Option<Arc<RateLimiter>>,
    ) -> Result<Self, IngestError> {
        if let (Some(limiter), Some((requests, interval))) = (&limiter, config.rate_budget) {
            limiter.register(EMBEDDING_RATE_BUDGET, requests, interval)?;
        }

        info!(
            endpoint = %config.endpoint,
            model = %config.model,
            dimensions = config.dimensions,
            "Created HTTP embedder"
        );

        Ok(Self {
            config,
            http: reqwest::Client::new(),
            limiter,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| IngestError::processor(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::processor(format!(
                "embedding API error ({}): {}",
                status, body
            )));
        }

        let response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| IngestError::processor(e.to_string()))?;

        let embeddings: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();

        for embedding in &embeddings {
            if embedding.len() != self.config.dimensions {
                return Err(IngestError::processor(format!(
                    "embedding dimension mismatch: expected {}, got {}",
                    self.config.dimensions,
                    embedding.len()
                )));
            }
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IngestError> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.config.batch_size) {
            if let Some(limiter) = &self.limiter {
                limiter.acquire(EMBEDDING_RATE_BUDGET).await?;
            }

            let outcome = self.embed_batch(batch).await;

            if let Some(limiter) = &self.limiter {
                limiter.release(EMBEDDING_RATE_BUDGET)?;
            }

            all_embeddings.extend(outcome?);
        }

        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}
