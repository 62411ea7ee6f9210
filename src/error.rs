//! Error types for the Ragline library.
//!
//! Every fallible operation returns [`RaglineError`] through the crate-wide
//! [`Result`] alias. Index violations (bad dimension, batch arity, corrupt
//! snapshot) are raised synchronously where they occur; provider failures are
//! reported as [`RaglineError::Provider`] and left to the caller to degrade.
//!
//! # Examples
//!
//! ```
//! use ragline::error::{RaglineError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(RaglineError::dimension_mismatch(3, 4))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Ragline operations.
#[derive(Error, Debug)]
pub enum RaglineError {
    /// Invalid construction parameters (e.g. a zero dimension).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A vector or query whose length differs from the index dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Batch inputs of different lengths.
    #[error("Arity mismatch: {vectors} vectors but {metadata} metadata entries")]
    ArityMismatch { vectors: usize, metadata: usize },

    /// A snapshot that is not valid JSON or violates the snapshot layout.
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// Embedding or generation service failure.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Vector containing NaN or infinite components.
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Ingested document without usable text.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O errors (file operations, sockets, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with RaglineError.
pub type Result<T> = std::result::Result<T, RaglineError>;

impl RaglineError {
    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        RaglineError::Configuration(msg.into())
    }

    /// Create a new dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        RaglineError::DimensionMismatch { expected, actual }
    }

    /// Create a new arity mismatch error.
    pub fn arity_mismatch(vectors: usize, metadata: usize) -> Self {
        RaglineError::ArityMismatch { vectors, metadata }
    }

    /// Create a new corrupt snapshot error.
    pub fn corrupt_snapshot<S: Into<String>>(msg: S) -> Self {
        RaglineError::CorruptSnapshot(msg.into())
    }

    /// Create a new provider error.
    pub fn provider<S: Into<String>>(msg: S) -> Self {
        RaglineError::Provider(msg.into())
    }

    /// Create a new invalid vector error.
    pub fn invalid_vector<S: Into<String>>(msg: S) -> Self {
        RaglineError::InvalidVector(msg.into())
    }

    /// Create a new invalid document error.
    pub fn invalid_document<S: Into<String>>(msg: S) -> Self {
        RaglineError::InvalidDocument(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        RaglineError::InvalidArgument(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        RaglineError::Other(msg.into())
    }

    /// Whether the error was caused by the caller's input rather than by
    /// the service or its collaborators.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RaglineError::DimensionMismatch { .. }
                | RaglineError::ArityMismatch { .. }
                | RaglineError::InvalidVector(_)
                | RaglineError::InvalidDocument(_)
                | RaglineError::InvalidArgument(_)
        )
    }
}
