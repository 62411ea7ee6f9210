//! Text embedding providers.

pub mod hashing_text_embedder;
pub mod hf_text_embedder;
pub mod text_embedder;

pub use hashing_text_embedder::HashingTextEmbedder;
pub use hf_text_embedder::HfTextEmbedder;
pub use text_embedder::TextEmbedder;
