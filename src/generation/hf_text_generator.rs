//! Hosted text-generation client.
//!
//! Sends `{"inputs": prompt, "parameters": {...}}` to a Hugging Face
//! Inference style endpoint and extracts `generated_text` from the reply.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{RaglineError, Result};
use crate::generation::text_generator::TextGenerator;

/// Default text-generation endpoint.
pub const DEFAULT_GENERATION_URL: &str =
    "https://api-inference.huggingface.co/models/google/flan-t5-small";

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: usize,
    temperature: f64,
    top_p: f64,
    do_sample: bool,
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// Generator backed by a hosted text-generation endpoint.
pub struct HfTextGenerator {
    client: Client,
    url: String,
    api_token: Option<String>,
    temperature: f64,
    top_p: f64,
}

impl std::fmt::Debug for HfTextGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfTextGenerator")
            .field("url", &self.url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .finish()
    }
}

impl HfTextGenerator {
    /// Create a client for `url`. Without a token every call fails with a
    /// provider error.
    pub fn new(url: impl Into<String>, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RaglineError::provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            api_token,
            temperature: 0.2,
            top_p: 0.9,
        })
    }

    pub fn has_token(&self) -> bool {
        self.api_token.is_some()
    }

    fn request_body<'a>(&self, prompt: &'a str, max_tokens: usize) -> GenerationRequest<'a> {
        GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                max_new_tokens: max_tokens,
                temperature: self.temperature,
                top_p: self.top_p,
                do_sample: false,
            },
        }
    }
}

/// Pull the generated text out of a response body.
///
/// `[{"generated_text": ...}]` yields the trimmed text; any other JSON is
/// returned verbatim as a string.
fn extract_generated_text(body: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| RaglineError::provider(format!("failed to parse generation response: {e}")))?;

    if let Some(first) = value.as_array().and_then(|items| items.first())
        && let Ok(generated) = serde_json::from_value::<GeneratedText>(first.clone())
    {
        return Ok(generated.generated_text.trim().to_string());
    }

    Ok(value.to_string())
}

#[async_trait]
impl TextGenerator for HfTextGenerator {
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        let token = self
            .api_token
            .as_ref()
            .ok_or_else(|| RaglineError::provider("HF_API_TOKEN not configured"))?;

        let http_response = self
            .client
            .post(&self.url)
            .bearer_auth(token)
            .json(&self.request_body(prompt, max_tokens))
            .send()
            .await
            .map_err(|e| RaglineError::provider(format!("generation request failed: {e}")))?;

        let status = http_response.status();
        let response_text = http_response.text().await.map_err(|e| {
            RaglineError::provider(format!("failed to read generation response: {e}"))
        })?;

        if !status.is_success() {
            return Err(RaglineError::provider(format!(
                "generation API error (status {status}): {response_text}"
            )));
        }

        debug!("Generated completion via {}", self.url);
        extract_generated_text(&response_text)
    }

    fn name(&self) -> &str {
        &self.url
    }
}
