//! Text generation providers and prompt templates.

pub mod hf_text_generator;
pub mod prompt;
pub mod text_generator;

pub use hf_text_generator::HfTextGenerator;
pub use prompt::build_prompt;
pub use text_generator::TextGenerator;
