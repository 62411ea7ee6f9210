//! Exact, append-only vector index.
//!
//! [`VectorIndex`] owns an ordered list of records, mints `doc_<n>` ids from a
//! monotonic counter and answers top-k queries with a linear scan. Writes take
//! `&mut self`; callers that share an index across threads wrap it in a lock.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RaglineError, Result};
use crate::vector::similarity;
use crate::vector::snapshot::Snapshot;

/// Arbitrary JSON metadata attached to a record.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Prefix of every minted record id.
pub const ID_PREFIX: &str = "doc_";

/// One stored (id, vector, metadata) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    vector: Vec<f64>,
    metadata: Metadata,
    norm: f64,
}

impl Record {
    fn new(id: String, vector: Vec<f64>, metadata: Metadata) -> Self {
        let norm = similarity::l2_norm(&vector);
        Self {
            id,
            vector,
            metadata,
            norm,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vector(&self) -> &[f64] {
        &self.vector
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    pub metadata: Metadata,
}

/// Read-only index statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub dimension: usize,
    pub next_id: u64,
}

/// In-memory exact vector index.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    records: Vec<Record>,
    next_id: u64,
}

impl VectorIndex {
    /// Create an empty index whose vectors all have `dimension` components.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RaglineError::configuration(
                "index dimension must be a positive integer",
            ));
        }

        Ok(Self {
            dimension,
            records: Vec::new(),
            next_id: 0,
        })
    }

    /// Rebuild an index from already validated parts.
    pub(crate) fn from_parts(
        dimension: usize,
        ids: Vec<String>,
        vectors: Vec<Vec<f64>>,
        metadata: Vec<Metadata>,
        next_id: u64,
    ) -> Self {
        let records = ids
            .into_iter()
            .zip(vectors)
            .zip(metadata)
            .map(|((id, vector), metadata)| Record::new(id, vector, metadata))
            .collect();

        Self {
            dimension,
            records,
            next_id,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Counter value the next insert will use.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Append a vector and return its newly minted id.
    ///
    /// `metadata` defaults to an empty object. The index is left untouched
    /// when the vector is rejected.
    pub fn insert(&mut self, vector: Vec<f64>, metadata: Option<Metadata>) -> Result<String> {
        self.validate_vector(&vector)?;
        Ok(self.append(vector, metadata.unwrap_or_default()))
    }

    /// Insert `vectors` paired with `metadatas` in order.
    ///
    /// All vectors are validated before the first append, so a rejected batch
    /// leaves the index unchanged.
    pub fn batch_insert(
        &mut self,
        vectors: Vec<Vec<f64>>,
        metadatas: Option<Vec<Metadata>>,
    ) -> Result<Vec<String>> {
        let metadatas = match metadatas {
            Some(metadatas) => {
                if metadatas.len() != vectors.len() {
                    return Err(RaglineError::arity_mismatch(
                        vectors.len(),
                        metadatas.len(),
                    ));
                }
                metadatas
            }
            None => vec![Metadata::new(); vectors.len()],
        };

        for vector in &vectors {
            self.validate_vector(vector)?;
        }

        self.records.reserve(vectors.len());
        let ids = vectors
            .into_iter()
            .zip(metadatas)
            .map(|(vector, metadata)| self.append(vector, metadata))
            .collect();
        Ok(ids)
    }

    /// Return the `k` records most similar to `query`, best first.
    ///
    /// Ties keep insertion order.
    pub fn search(&self, query: &[f64], k: usize) -> Result<Vec<SearchHit>> {
        self.validate_vector(query)?;
        if self.records.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_norm = similarity::l2_norm(query);
        let mut scored: Vec<(usize, f64)> = self
            .records
            .iter()
            .enumerate()
            .map(|(pos, record)| {
                let score =
                    similarity::normalized_dot(query, query_norm, &record.vector, record.norm);
                (pos, score)
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(pos, score)| {
                let record = &self.records[pos];
                SearchHit {
                    id: record.id.clone(),
                    score,
                    metadata: record.metadata.clone(),
                }
            })
            .collect())
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_documents: self.records.len(),
            dimension: self.dimension,
            next_id: self.next_id,
        }
    }

    /// Write a full snapshot of the index to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        Snapshot::from_index(self).write(path)
    }

    /// Restore an index from a snapshot written by [`VectorIndex::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Snapshot::read(path)?.into_index()
    }

    fn validate_vector(&self, vector: &[f64]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(RaglineError::dimension_mismatch(
                self.dimension,
                vector.len(),
            ));
        }
        if !similarity::is_finite(vector) {
            return Err(RaglineError::invalid_vector(
                "vector contains NaN or infinite components or its norm overflows",
            ));
        }
        Ok(())
    }

    fn append(&mut self, vector: Vec<f64>, metadata: Metadata) -> String {
        let id = format!("{ID_PREFIX}{}", self.next_id);
        self.next_id += 1;
        self.records.push(Record::new(id.clone(), vector, metadata));
        id
    }
}
