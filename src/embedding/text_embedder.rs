//! Text embedding trait for the retrieval pipeline.

use async_trait::async_trait;

use crate::error::Result;

/// Trait for converting text to vector embeddings.
///
/// Implementations must return vectors of exactly [`TextEmbedder::dimension`]
/// components, matching the dimension of the index they feed.
///
/// # Custom implementation
///
/// ```
/// use async_trait::async_trait;
/// use ragline::embedding::text_embedder::TextEmbedder;
/// use ragline::error::Result;
///
/// struct ConstantEmbedder {
///     dimension: usize,
/// }
///
/// #[async_trait]
/// impl TextEmbedder for ConstantEmbedder {
///     async fn embed(&self, _text: &str) -> Result<Vec<f64>> {
///         Ok(vec![1.0; self.dimension])
///     }
///
///     fn dimension(&self) -> usize {
///         self.dimension
///     }
/// }
/// ```
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Generate an embedding vector for the given text.
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;

    /// Generate embeddings for multiple texts.
    ///
    /// The default implementation calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Get the dimension of generated embeddings.
    fn dimension(&self) -> usize;

    /// Get the name/identifier of this embedder.
    fn name(&self) -> &str {
        "unknown"
    }
}
