//! Vector storage and exact similarity search.
//!
//! - [`index`]: the append-only [`VectorIndex`] with top-k search
//! - [`similarity`]: norm and normalised dot product helpers
//! - [`snapshot`]: JSON snapshot format and atomic persistence

pub mod index;
pub mod similarity;
pub mod snapshot;

pub use index::{IndexStats, Metadata, Record, SearchHit, VectorIndex};
pub use snapshot::Snapshot;
