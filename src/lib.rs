//! # Ragline
//!
//! Exact vector retrieval with durable snapshots, used to ground text
//! generation in a small document collection.
//!
//! ## Features
//!
//! - Brute-force cosine search with stable tie ordering
//! - Atomic JSON snapshots that reload to an identical index
//! - Pluggable embedding and generation providers
//! - HTTP service and command line front ends

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod rag;
pub mod server;
pub mod vector;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
