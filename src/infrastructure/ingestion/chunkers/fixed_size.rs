//! Fixed-size chunking strategy

use crate::domain::ingestion::{chunker::helpers, Chunk, ChunkingConfig, ChunkingStrategy};
use crate::domain::DomainError;

/// Sliding window of `chunk_size` characters advancing by
/// `chunk_size - chunk_overlap`
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    respect_word_boundaries: bool,
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedSizeChunker {
    pub fn new() -> Self {
        Self {
            respect_word_boundaries: true,
        }
    }

    /// Set whether window ends snap to whitespace
    pub fn with_word_boundaries(mut self, respect: bool) -> Self {
        self.respect_word_boundaries = respect;
        self
    }

    fn window_end(&self, chars: &[char], start: usize, target_end: usize) -> usize {
        if !self.respect_word_boundaries || target_end >= chars.len() {
            return target_end.min(chars.len());
        }
        helpers::word_boundary(chars, start, target_end)
    }
}

impl ChunkingStrategy for FixedSizeChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError> {
        config.validate()?;

        let content = content.trim();
        if content.is_empty() {
            return Ok(vec![]);
        }

        let chars: Vec<char> = content.chars().collect();
        if chars.len() <= config.chunk_size {
            return Ok(vec![Chunk::new(content, 0)]);
        }

        let mut texts = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let target_end = (start + config.chunk_size).min(chars.len());
            let end = self.window_end(&chars, start, target_end);

            texts.push(chars[start..end].iter().collect::<String>().trim().to_string());

            if end >= chars.len() {
                break;
            }

            start = (start + config.step()).min(end);
            if self.respect_word_boundaries {
                while start < end && !chars[start].is_whitespace() && start > 0
                    && !chars[start - 1].is_whitespace()
                {
                    start += 1;
                }
            }
        }

        Ok(helpers::index_chunks(texts))
    }

    fn name(&self) -> &'static str {
        "fixed_size"
    }
}
