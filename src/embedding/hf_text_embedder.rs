//! Hosted feature-extraction embedder.
//!
//! Talks to a Hugging Face Inference style endpoint: the request body is
//! `{"inputs": "<text>"}` and the response is either a pooled vector or a
//! token-by-dimension matrix. For matrices the first row (the CLS token) is
//! used as the sentence embedding.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::embedding::text_embedder::TextEmbedder;
use crate::error::{RaglineError, Result};

/// Default feature-extraction endpoint.
pub const DEFAULT_EMBEDDING_URL: &str =
    "https://api-inference.huggingface.co/pipeline/feature-extraction/BAAI/bge-small-en-v1.5";

/// Request structure for the feature-extraction API.
#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a str,
}

/// Response shapes returned by feature-extraction endpoints.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    /// Already pooled sentence embedding.
    Pooled(Vec<f64>),
    /// One row per token.
    Tokens(Vec<Vec<f64>>),
    /// Batch of one input, one row per token.
    BatchedTokens(Vec<Vec<Vec<f64>>>),
}

impl FeatureExtractionResponse {
    fn into_embedding(self) -> Option<Vec<f64>> {
        match self {
            FeatureExtractionResponse::Pooled(v) => Some(v),
            FeatureExtractionResponse::Tokens(rows) => rows.into_iter().next(),
            FeatureExtractionResponse::BatchedTokens(batch) => {
                batch.into_iter().next().and_then(|rows| rows.into_iter().next())
            }
        }
    }
}

/// Embedder backed by a hosted feature-extraction endpoint.
pub struct HfTextEmbedder {
    /// HTTP client for making API requests.
    client: Client,
    /// Endpoint URL.
    url: String,
    /// Optional bearer token.
    api_token: Option<String>,
    /// Dimension of the output embeddings.
    dimension: usize,
}

impl std::fmt::Debug for HfTextEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfTextEmbedder")
            .field("url", &self.url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl HfTextEmbedder {
    /// Create a new embedder for `url` producing `dimension`-sized vectors.
    pub fn new(
        url: impl Into<String>,
        api_token: Option<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self> {
        if dimension == 0 {
            return Err(RaglineError::configuration(
                "embedding dimension must be positive",
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RaglineError::provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            api_token,
            dimension,
        })
    }
}

#[async_trait]
impl TextEmbedder for HfTextEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&FeatureExtractionRequest { inputs: text });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let http_response = request
            .send()
            .await
            .map_err(|e| RaglineError::provider(format!("embedding request failed: {e}")))?;

        let status = http_response.status();
        let response_text = http_response.text().await.map_err(|e| {
            RaglineError::provider(format!("failed to read embedding response: {e}"))
        })?;

        if !status.is_success() {
            return Err(RaglineError::provider(format!(
                "embedding API error (status {status}): {response_text}"
            )));
        }

        let response: FeatureExtractionResponse = serde_json::from_str(&response_text)
            .map_err(|e| {
                RaglineError::provider(format!("failed to parse embedding response: {e}"))
            })?;

        let embedding = response
            .into_embedding()
            .ok_or_else(|| RaglineError::provider("no embedding in response"))?;

        if embedding.len() != self.dimension {
            return Err(RaglineError::dimension_mismatch(
                self.dimension,
                embedding.len(),
            ));
        }

        debug!("Embedded {} chars via {}", text.len(), self.url);
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.url
    }
}
