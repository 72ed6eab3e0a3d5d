//! Chunking strategy trait and types
//!
//! Sizes and offsets are counted in characters, not bytes.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::domain::knowledge_base::validate_chunking;
use crate::domain::DomainError;

/// Configuration for chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_chunking(self.chunk_size, self.chunk_overlap)
            .map_err(|e| DomainError::validation(e.to_string()))
    }

    /// Distance between the starts of consecutive fixed-size windows
    pub fn step(&self) -> usize {
        self.chunk_size.saturating_sub(self.chunk_overlap).max(1)
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// A chunk of text cut from a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    /// Position of the chunk in its document (0-based)
    pub index: usize,
}

impl Chunk {
    pub fn new(content: impl Into<String>, index: usize) -> Self {
        Self {
            content: content.into(),
            index,
        }
    }
}

/// Trait for chunking strategies
pub trait ChunkingStrategy: Send + Sync + Debug {
    /// Split content into chunks, indexed in document order
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError>;

    fn name(&self) -> &'static str;
}

/// Helper functions for chunking
pub mod helpers {
    /// Character count of `text`
    pub fn char_len(text: &str) -> usize {
        text.chars().count()
    }

    /// Nearest word boundary at or before `pos` and after `floor`; falls back
    /// to the boundary after `pos` when the word spans the whole window.
    pub fn word_boundary(chars: &[char], floor: usize, pos: usize) -> usize {
        if pos >= chars.len() {
            return chars.len();
        }

        let mut before = pos;
        while before > floor && !chars[before - 1].is_whitespace() {
            before -= 1;
        }
        if before > floor {
            return before;
        }

        let mut after = pos;
        while after < chars.len() && !chars[after].is_whitespace() {
            after += 1;
        }
        after
    }

    /// Index chunk texts in order, dropping blank ones
    pub fn index_chunks<I>(texts: I) -> Vec<super::Chunk>
    where
        I: IntoIterator<Item = String>,
    {
        texts
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .enumerate()
            .map(|(i, t)| super::Chunk::new(t, i))
            .collect()
    }
}
