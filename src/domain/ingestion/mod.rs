//! Document ingestion domain types and traits
//!
//! This module provides:
//! - `ChunkingStrategy` trait for splitting documents into chunks
//! - keyword extraction shared by the graph-based indexes
//! - `ContentLoader` and `TextExtractor` traits for turning locators into text

pub mod chunker;
pub mod keywords;
pub mod loader;

pub use chunker::{Chunk, ChunkingConfig, ChunkingStrategy};
pub use keywords::{extract_keywords, tokenize};
pub use loader::{ContentLoader, TextExtractor};

#[cfg(test)]
pub use loader::mock::MockContentLoader;
