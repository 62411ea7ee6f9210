//! Command line argument parsing for the Ragline CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::{ENV_API_TOKEN, ENV_DIMENSION, ENV_SNAPSHOT, EmbedderKind, RagConfig};
use crate::embedding::hf_text_embedder::DEFAULT_EMBEDDING_URL;
use crate::generation::hf_text_generator::DEFAULT_GENERATION_URL;

/// Ragline - exact vector retrieval for grounded text generation
#[derive(Parser, Debug, Clone)]
#[command(name = "ragline")]
#[command(about = "Exact vector retrieval with durable snapshots for grounded generation")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct RaglineArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl RaglineArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP query service
    Serve(ServeArgs),

    /// Build a new snapshot from a documents file
    Init(InitArgs),

    /// Add documents to a snapshot
    Insert(InsertArgs),

    /// Retrieve the closest documents for a query
    Search(SearchArgs),

    /// Retrieve and generate a grounded answer
    Query(QueryArgs),

    /// Show index statistics
    Stats(StatsArgs),
}

/// Index and provider options shared by every command
#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    /// Snapshot file
    #[arg(short, long, env = ENV_SNAPSHOT, default_value = "vector_db.json")]
    pub snapshot: PathBuf,

    /// Vector dimension for a new index
    #[arg(long, env = ENV_DIMENSION, default_value = "384")]
    pub dimension: usize,

    /// Embedding provider
    #[arg(long, default_value = "hashing")]
    pub embedder: EmbedderKind,

    /// Feature-extraction endpoint (for --embedder hf)
    #[arg(long, default_value = DEFAULT_EMBEDDING_URL)]
    pub embedding_url: String,

    /// Text-generation endpoint
    #[arg(long, default_value = DEFAULT_GENERATION_URL)]
    pub generation_url: String,

    /// API token for the hosted endpoints
    #[arg(long, env = ENV_API_TOKEN, hide_env_values = true)]
    pub api_token: Option<String>,

    /// Provider request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,
}

impl IndexArgs {
    /// Build the service configuration these options describe.
    pub fn to_config(&self) -> RagConfig {
        RagConfig {
            dimension: self.dimension,
            snapshot_path: Some(self.snapshot.clone()),
            embedder: self.embedder,
            embedding_url: self.embedding_url.clone(),
            generation_url: self.generation_url.clone(),
            api_token: self.api_token.clone(),
            request_timeout_secs: self.timeout,
            ..RagConfig::default()
        }
    }
}

/// Arguments for the HTTP service
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub index: IndexArgs,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "7860")]
    pub port: u16,

    /// Save the snapshot after every insert
    #[arg(long)]
    pub autosave: bool,
}

/// Arguments for building a new snapshot
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Documents file (JSON array or JSONL)
    #[arg(value_name = "DOCUMENT_FILE")]
    pub document_file: PathBuf,

    #[command(flatten)]
    pub index: IndexArgs,

    /// Overwrite an existing snapshot
    #[arg(long)]
    pub force: bool,
}

/// Arguments for adding documents
#[derive(Parser, Debug, Clone)]
pub struct InsertArgs {
    /// Documents file (JSON array or JSONL)
    #[arg(value_name = "DOCUMENT_FILE")]
    pub document_file: PathBuf,

    #[command(flatten)]
    pub index: IndexArgs,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Query string
    #[arg(value_name = "QUERY")]
    pub query: String,

    #[command(flatten)]
    pub index: IndexArgs,

    /// Maximum number of results to return
    #[arg(short, default_value = "5")]
    pub k: usize,
}

/// Arguments for grounded queries
#[derive(Parser, Debug, Clone)]
pub struct QueryArgs {
    /// Question to answer
    #[arg(value_name = "QUERY")]
    pub query: String,

    #[command(flatten)]
    pub index: IndexArgs,

    /// Number of documents to retrieve
    #[arg(short, default_value = "3")]
    pub k: usize,

    /// Generation budget in tokens
    #[arg(long, default_value = "150")]
    pub max_length: usize,
}

/// Arguments for index statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub index: IndexArgs,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
