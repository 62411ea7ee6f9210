//! Command implementations for the Ragline CLI.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{RaglineError, Result};
use crate::rag::{IngestDocument, RagSystem};
use crate::server::{self, AppState};

/// Execute a CLI command.
pub async fn execute_command(args: RaglineArgs) -> Result<()> {
    match &args.command {
        Command::Serve(serve_args) => serve(serve_args.clone()).await,
        Command::Init(init_args) => init_index(init_args.clone(), &args).await,
        Command::Insert(insert_args) => insert_documents(insert_args.clone(), &args).await,
        Command::Search(search_args) => search_index(search_args.clone(), &args).await,
        Command::Query(query_args) => query_index(query_args.clone(), &args).await,
        Command::Stats(stats_args) => show_stats(stats_args.clone(), &args),
    }
}

/// Run the HTTP service until interrupted.
async fn serve(args: ServeArgs) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|e| {
            RaglineError::invalid_argument(format!(
                "invalid listen address {}:{}: {e}",
                args.host, args.port
            ))
        })?;

    let config = args.index.to_config().with_autosave(args.autosave);
    if config.api_token.is_none() {
        warn!("HF_API_TOKEN not set. Generation will fail.");
    }

    let rag = RagSystem::from_config(config)?;
    info!("Serving {} documents", rag.stats().total_documents);

    let state = Arc::new(AppState::new(Arc::new(rag)));
    server::serve(state, addr).await?;
    Ok(())
}

/// Build a fresh snapshot from a documents file.
async fn init_index(args: InitArgs, cli_args: &RaglineArgs) -> Result<()> {
    let snapshot = args.index.snapshot.clone();
    if snapshot.exists() && !args.force {
        return Err(RaglineError::invalid_argument(format!(
            "snapshot {} already exists. Use --force to overwrite.",
            snapshot.display()
        )));
    }

    let documents = load_documents(&args.document_file)?;
    if cli_args.verbosity() > 1 {
        println!("Loading {} documents...", documents.len());
    }

    let start_time = Instant::now();
    let mut config = args.index.to_config();
    config.snapshot_path = None;
    let rag = RagSystem::from_config(config)?;
    let ids = rag.insert_documents(documents).await?;
    rag.save_to(&snapshot)?;

    output_result(
        "Database initialized successfully",
        &DocumentAdditionResult {
            snapshot: snapshot.display().to_string(),
            documents_added: ids.len(),
            total_documents: rag.stats().total_documents,
            ids,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Append documents to a snapshot, creating it if needed.
async fn insert_documents(args: InsertArgs, cli_args: &RaglineArgs) -> Result<()> {
    let documents = load_documents(&args.document_file)?;
    if cli_args.verbosity() > 1 {
        println!(
            "Adding {} documents to {}",
            documents.len(),
            args.index.snapshot.display()
        );
    }

    let start_time = Instant::now();
    let rag = RagSystem::from_config(args.index.to_config())?;
    let ids = rag.insert_documents(documents).await?;
    let snapshot = rag.save().await?;

    output_result(
        "Documents added successfully",
        &DocumentAdditionResult {
            snapshot: snapshot.display().to_string(),
            documents_added: ids.len(),
            total_documents: rag.stats().total_documents,
            ids,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Retrieve the closest documents.
async fn search_index(args: SearchArgs, cli_args: &RaglineArgs) -> Result<()> {
    require_snapshot(&args.index.snapshot)?;
    let rag = RagSystem::from_config(args.index.to_config())?;

    let start_time = Instant::now();
    let results = rag.retrieve(&args.query, args.k).await?;

    output_result(
        &format!("Search results for: {}", args.query),
        &SearchResults {
            query: args.query,
            results,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Retrieve and generate.
async fn query_index(args: QueryArgs, cli_args: &RaglineArgs) -> Result<()> {
    require_snapshot(&args.index.snapshot)?;
    let rag = RagSystem::from_config(args.index.to_config())?;

    let response = rag.query(&args.query, args.k, args.max_length).await?;
    output_result(&format!("Query: {}", args.query), &response, cli_args)
}

/// Show index statistics.
fn show_stats(args: StatsArgs, cli_args: &RaglineArgs) -> Result<()> {
    require_snapshot(&args.index.snapshot)?;
    let rag = RagSystem::from_config(args.index.to_config())?;
    let stats = rag.stats();

    output_result(
        "Index Statistics:",
        &IndexStatsResult {
            snapshot: args.index.snapshot.display().to_string(),
            total_documents: stats.total_documents,
            dimension: stats.dimension,
            next_id: stats.next_id,
        },
        cli_args,
    )
}

fn require_snapshot(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(RaglineError::invalid_argument(format!(
            "snapshot {} not found. Run `ragline init` first.",
            path.display()
        )));
    }
    Ok(())
}

/// Read documents from a JSON array or a JSONL file.
pub fn load_documents(path: &Path) -> Result<Vec<IngestDocument>> {
    let content = fs::read_to_string(path)?;

    if content.trim_start().starts_with('[') {
        return serde_json::from_str(&content).map_err(|e| {
            RaglineError::invalid_document(format!("{}: {e}", path.display()))
        });
    }

    let mut documents = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let document = serde_json::from_str(line).map_err(|e| {
            RaglineError::invalid_document(format!(
                "{} line {}: {e}",
                path.display(),
                line_num + 1
            ))
        })?;
        documents.push(document);
    }
    Ok(documents)
}
