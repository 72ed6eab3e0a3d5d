//! Document ingestion infrastructure
//!
//! Chunkers used by the providers, and the content loader that turns files
//! and URLs into text.

pub mod chunkers;
mod extractor;
mod loader;

pub use chunkers::{FixedSizeChunker, RecursiveChunker};
pub use extractor::{html_to_text, markdown_to_text, FileTextExtractor};
pub use loader::DefaultContentLoader;
