//! Deterministic feature-hashing embedder.
//!
//! Lowercased alphanumeric tokens are hashed (FNV-1a) into `dimension`
//! buckets; the top hash bit picks the sign. The result is L2 normalised.
//! No model, no network: texts sharing words score higher than texts that
//! don't, which is enough for demos, tests and offline use.

use async_trait::async_trait;

use crate::embedding::text_embedder::TextEmbedder;
use crate::error::{RaglineError, Result};
use crate::vector::similarity;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Offline embedder based on the hashing trick.
#[derive(Debug, Clone)]
pub struct HashingTextEmbedder {
    dimension: usize,
}

impl HashingTextEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RaglineError::configuration(
                "embedding dimension must be positive",
            ));
        }
        Ok(Self { dimension })
    }

    /// Embed synchronously.
    pub fn embed_sync(&self, text: &str) -> Vec<f64> {
        let mut vector = vec![0.0; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let hash = fnv1a(token.to_lowercase().as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = similarity::l2_norm(&vector);
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl TextEmbedder for HashingTextEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        Ok(self.embed_sync(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_and_sized() {
        let embedder = HashingTextEmbedder::new(64).unwrap();
        let a = embedder.embed_sync("Rust is fast");
        let b = embedder.embed_sync("rust IS fast!");
        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        assert!((similarity::l2_norm(&a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingTextEmbedder::new(8).unwrap();
        assert!(embedder.embed_sync("  ...  ").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_shared_words_score_higher() {
        let embedder = HashingTextEmbedder::new(256).unwrap();
        let query = embedder.embed_sync("vector search engine");
        let related = embedder.embed_sync("an exact vector search engine in rust");
        let unrelated = embedder.embed_sync("bread baking with sourdough starter");
        assert!(similarity::dot(&query, &related) > similarity::dot(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_async_embed_matches_sync() {
        let embedder = HashingTextEmbedder::new(16).unwrap();
        let v = embedder.embed("hello world").await.unwrap();
        assert_eq!(v, embedder.embed_sync("hello world"));
        assert_eq!(embedder.dimension(), 16);
    }
}
