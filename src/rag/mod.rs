//! Retrieval-augmented generation on top of [`VectorIndex`].
//!
//! [`RagSystem`] is constructed once at startup (from a snapshot if one
//! exists) and handed to whoever serves requests. It embeds text, keeps the
//! index behind a single `RwLock` (concurrent searches, exclusive inserts)
//! and grounds generation in the retrieved passages.
//!
//! Generation failures never fail a query: the retrieved documents are still
//! returned and the answer carries the error message instead.

pub mod document;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::RagConfig;
use crate::embedding::TextEmbedder;
use crate::error::{RaglineError, Result};
use crate::generation::{TextGenerator, build_prompt};
use crate::vector::{IndexStats, SearchHit, Snapshot, VectorIndex};

pub use document::{IngestDocument, ResolvedDocument, TEXT_FIELD, text_of};

/// Answer returned when retrieval finds nothing.
pub const NO_DOCUMENTS_ANSWER: &str = "No relevant documents found.";

/// Result of a grounded query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub answer: String,
    pub retrieved_documents: Vec<SearchHit>,
    /// Leading part of the context handed to the generator.
    pub context: String,
}

/// The retrieval service: index, embedder and generator wired together.
pub struct RagSystem {
    index: RwLock<VectorIndex>,
    embedder: Arc<dyn TextEmbedder>,
    generator: Arc<dyn TextGenerator>,
    config: RagConfig,
}

impl std::fmt::Debug for RagSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagSystem")
            .field("index", &self.index.read().stats())
            .field("embedder", &self.embedder.name())
            .field("generator", &self.generator.name())
            .field("config", &self.config)
            .finish()
    }
}

impl RagSystem {
    /// Wire an existing index to its providers.
    pub fn new(
        index: VectorIndex,
        embedder: Arc<dyn TextEmbedder>,
        generator: Arc<dyn TextGenerator>,
        config: RagConfig,
    ) -> Result<Self> {
        if embedder.dimension() != index.dimension() {
            return Err(RaglineError::configuration(format!(
                "embedder '{}' produces {} dimensions but the index expects {}",
                embedder.name(),
                embedder.dimension(),
                index.dimension()
            )));
        }

        Ok(Self {
            index: RwLock::new(index),
            embedder,
            generator,
            config,
        })
    }

    /// Load the configured snapshot, or start empty if there is none.
    pub fn open(
        config: RagConfig,
        embedder: Arc<dyn TextEmbedder>,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        let index = open_index(&config)?;
        Self::new(index, embedder, generator, config)
    }

    /// Like [`RagSystem::open`] with providers built from the configuration.
    ///
    /// The embedder is sized to the loaded index, so a snapshot's dimension
    /// takes precedence over `config.dimension`.
    pub fn from_config(config: RagConfig) -> Result<Self> {
        let index = open_index(&config)?;
        let embedder = config.build_embedder(index.dimension())?;
        let generator = config.build_generator()?;
        Self::new(index, embedder, generator, config)
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn stats(&self) -> IndexStats {
        self.index.read().stats()
    }

    /// Embed and store `documents`, returning their ids in input order.
    ///
    /// Every document is resolved and embedded before the index is touched,
    /// so a failure leaves the index unchanged. Once the batch is committed
    /// the ids are returned even if the autosave that follows fails; that
    /// failure is only logged.
    pub async fn insert_documents(&self, documents: Vec<IngestDocument>) -> Result<Vec<String>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let resolved = documents
            .into_iter()
            .map(IngestDocument::resolve)
            .collect::<Result<Vec<_>>>()?;

        let texts: Vec<&str> = resolved.iter().map(|doc| doc.text.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != resolved.len() {
            return Err(RaglineError::provider(format!(
                "embedder returned {} vectors for {} documents",
                vectors.len(),
                resolved.len()
            )));
        }

        let metadatas = resolved.into_iter().map(|doc| doc.metadata).collect();
        let ids = {
            let mut index = self.index.write();
            index.batch_insert(vectors, Some(metadatas))?
        };
        info!("Inserted {} documents", ids.len());

        if self.config.autosave
            && let Err(e) = self.save().await
        {
            warn!("Autosave failed after inserting {} documents: {e}", ids.len());
        }
        Ok(ids)
    }

    /// Return the `k` stored documents closest to `query`.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(RaglineError::invalid_argument("query must not be empty"));
        }

        let query_vector = self.embedder.embed(query).await?;
        let hits = {
            let index = self.index.read();
            index.search(&query_vector, k)?
        };
        debug!("Retrieved {} documents for query", hits.len());
        Ok(hits)
    }

    /// Retrieve `k` documents and generate an answer grounded in them.
    pub async fn query(&self, query: &str, k: usize, max_length: usize) -> Result<QueryResponse> {
        let retrieved_documents = self.retrieve(query, k).await?;

        if retrieved_documents.is_empty() {
            return Ok(QueryResponse {
                query: query.to_string(),
                answer: NO_DOCUMENTS_ANSWER.to_string(),
                retrieved_documents,
                context: String::new(),
            });
        }

        let context = retrieved_documents
            .iter()
            .map(|hit| text_of(&hit.metadata))
            .collect::<Vec<_>>()
            .join(" ");

        let prompt = build_prompt(query, &context);
        let answer = match self.generator.generate(&prompt, max_length).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Generation failed, returning retrieval only: {e}");
                degraded_answer(&e)
            }
        };

        Ok(QueryResponse {
            query: query.to_string(),
            answer,
            retrieved_documents,
            context: context
                .chars()
                .take(self.config.context_preview_chars)
                .collect(),
        })
    }

    /// Checkpoint to the configured snapshot path.
    ///
    /// The index is copied under the read lock and written on the blocking
    /// pool, so neither the lock nor an async worker is held during I/O.
    pub async fn save(&self) -> Result<PathBuf> {
        let path = self
            .config
            .snapshot_path
            .clone()
            .ok_or_else(|| RaglineError::invalid_argument("no snapshot path configured"))?;

        let snapshot = {
            let index = self.index.read();
            Snapshot::from_index(&index)
        };
        let total = snapshot.ids.len();
        let target = path.clone();
        tokio::task::spawn_blocking(move || snapshot.write(&target))
            .await
            .map_err(|e| RaglineError::other(format!("snapshot task failed: {e}")))??;

        info!("Saved {total} documents to {}", path.display());
        Ok(path)
    }

    /// Write a snapshot to `path`, blocking the calling thread.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let index = self.index.read();
        index.save(path)?;
        info!("Saved {} documents to {}", index.len(), path.display());
        Ok(())
    }
}

fn open_index(config: &RagConfig) -> Result<VectorIndex> {
    config.validate()?;
    match &config.snapshot_path {
        Some(path) if path.exists() => {
            info!("Loading vector index from {}", path.display());
            VectorIndex::load(path)
        }
        _ => {
            info!("Creating new vector index (dimension {})", config.dimension);
            VectorIndex::new(config.dimension)
        }
    }
}

fn degraded_answer(err: &RaglineError) -> String {
    match err {
        RaglineError::Provider(msg) => format!("LLM generation error: {msg}"),
        other => format!("LLM generation error: {other}"),
    }
}
