//! Service configuration.
//!
//! [`RagConfig`] gathers everything needed to stand up a [`crate::rag::RagSystem`]:
//! index dimension, snapshot location, provider endpoints and request
//! defaults. Values start from [`Default`] and are checked by
//! [`RagConfig::validate`] before use. Environment overrides
//! ([`ENV_API_TOKEN`], [`ENV_SNAPSHOT`], [`ENV_DIMENSION`]) are read by the
//! CLI flags in [`crate::cli::args::IndexArgs`].
//!
//! ```
//! use ragline::config::{EmbedderKind, RagConfig};
//!
//! let config = RagConfig::default()
//!     .with_dimension(128)
//!     .with_embedder(EmbedderKind::Hashing)
//!     .with_snapshot_path("data/vector_db.json");
//! assert!(config.validate().is_ok());
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::embedding::hf_text_embedder::DEFAULT_EMBEDDING_URL;
use crate::embedding::{HashingTextEmbedder, HfTextEmbedder, TextEmbedder};
use crate::error::{RaglineError, Result};
use crate::generation::hf_text_generator::DEFAULT_GENERATION_URL;
use crate::generation::{HfTextGenerator, TextGenerator};

/// Environment variable holding the hosted model API token.
pub const ENV_API_TOKEN: &str = "HF_API_TOKEN";
/// Environment variable overriding the snapshot path.
pub const ENV_SNAPSHOT: &str = "RAGLINE_SNAPSHOT";
/// Environment variable overriding the index dimension.
pub const ENV_DIMENSION: &str = "RAGLINE_DIMENSION";

/// Which embedding provider to use.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Offline feature-hashing embedder
    #[default]
    Hashing,
    /// Hosted feature-extraction endpoint
    Hf,
}

/// Configuration for the retrieval service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Vector dimension for a freshly created index.
    pub dimension: usize,

    /// Snapshot loaded at startup (if present) and written on checkpoint.
    pub snapshot_path: Option<PathBuf>,

    /// Embedding provider.
    pub embedder: EmbedderKind,

    /// Feature-extraction endpoint for [`EmbedderKind::Hf`].
    pub embedding_url: String,

    /// Text-generation endpoint.
    pub generation_url: String,

    /// Bearer token for the hosted endpoints. Never serialized.
    #[serde(skip)]
    pub api_token: Option<String>,

    /// Timeout applied to every provider request.
    pub request_timeout_secs: u64,

    /// Default `k` for grounded queries.
    pub default_query_k: usize,

    /// Default `k` for plain searches.
    pub default_search_k: usize,

    /// Default generation budget in tokens.
    pub default_max_length: usize,

    /// Number of characters of context echoed back in query responses.
    pub context_preview_chars: usize,

    /// Write a snapshot after every successful insert.
    pub autosave: bool,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            snapshot_path: None,
            embedder: EmbedderKind::default(),
            embedding_url: DEFAULT_EMBEDDING_URL.to_string(),
            generation_url: DEFAULT_GENERATION_URL.to_string(),
            api_token: None,
            request_timeout_secs: 30,
            default_query_k: 3,
            default_search_k: 5,
            default_max_length: 150,
            context_preview_chars: 500,
            autosave: false,
        }
    }
}

impl RagConfig {
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn with_embedder(mut self, embedder: EmbedderKind) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_api_token(mut self, token: Option<String>) -> Self {
        self.api_token = token;
        self
    }

    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(RaglineError::configuration("dimension must be positive"));
        }
        if self.request_timeout_secs == 0 {
            return Err(RaglineError::configuration(
                "request_timeout_secs must be positive",
            ));
        }
        if self.autosave && self.snapshot_path.is_none() {
            return Err(RaglineError::configuration(
                "autosave requires a snapshot path",
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Instantiate the configured embedding provider for `dimension`.
    pub fn build_embedder(&self, dimension: usize) -> Result<Arc<dyn TextEmbedder>> {
        Ok(match self.embedder {
            EmbedderKind::Hashing => Arc::new(HashingTextEmbedder::new(dimension)?),
            EmbedderKind::Hf => Arc::new(HfTextEmbedder::new(
                self.embedding_url.clone(),
                self.api_token.clone(),
                dimension,
                self.request_timeout(),
            )?),
        })
    }

    /// Instantiate the generation provider.
    pub fn build_generator(&self) -> Result<Arc<dyn TextGenerator>> {
        Ok(Arc::new(HfTextGenerator::new(
            self.generation_url.clone(),
            self.api_token.clone(),
            self.request_timeout(),
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.dimension, 384);
        assert_eq!(config.default_query_k, 3);
        assert_eq!(config.default_max_length, 150);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_dimension() {
        let config = RagConfig::default().with_dimension(0);
        assert!(matches!(
            config.validate(),
            Err(RaglineError::Configuration(_))
        ));
    }

    #[test]
    fn test_autosave_requires_snapshot() {
        let config = RagConfig::default().with_autosave(true);
        assert!(config.validate().is_err());
        assert!(config.with_snapshot_path("db.json").validate().is_ok());
    }

    #[test]
    fn test_token_is_not_serialized() {
        let config = RagConfig::default().with_api_token(Some("secret".into()));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_build_hashing_embedder() {
        let embedder = RagConfig::default().build_embedder(32).unwrap();
        assert_eq!(embedder.dimension(), 32);
        assert_eq!(embedder.name(), "hashing");
    }
}
