//! Text generation trait.

use async_trait::async_trait;

use crate::error::Result;

/// Produces a completion for a prompt.
///
/// Failures are returned as errors; deciding whether to degrade them is up
/// to the caller (see [`crate::rag::RagSystem::query`]).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate at most `max_tokens` new tokens for `prompt`.
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String>;

    /// Get the name/identifier of this generator.
    fn name(&self) -> &str {
        "unknown"
    }
}
