//! Recursive chunking strategy

use unicode_segmentation::UnicodeSegmentation;

use crate::domain::ingestion::{chunker::helpers, Chunk, ChunkingConfig, ChunkingStrategy};
use crate::domain::DomainError;

/// Chunking strategy that recursively splits text hierarchically
///
/// Splitting order: headers -> paragraphs -> sentences -> words. Pieces are
/// packed greedily up to `chunk_size`; overlap is carried between word
/// windows at the last level.
#[derive(Debug, Clone, Default)]
pub struct RecursiveChunker;

impl RecursiveChunker {
    pub fn new() -> Self {
        Self
    }

    fn split_by_headers(text: &str) -> Vec<&str> {
        let mut parts = Vec::new();
        let mut current_start = 0;
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            if line.starts_with('#') && offset > current_start {
                let part = text[current_start..offset].trim();
                if !part.is_empty() {
                    parts.push(part);
                }
                current_start = offset;
            }
            offset += line.len();
        }

        let tail = text[current_start..].trim();
        if !tail.is_empty() {
            parts.push(tail);
        }

        parts
    }

    fn split_by_paragraphs(text: &str) -> Vec<&str> {
        text.split("\n\n")
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect()
    }

    fn split_by_sentences(text: &str) -> Vec<&str> {
        text.unicode_sentences()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn recursive_chunk(text: &str, config: &ChunkingConfig, level: usize) -> Vec<String> {
        if helpers::char_len(text) <= config.chunk_size {
            return vec![text.to_string()];
        }

        let parts = match level {
            0 => Self::split_by_headers(text),
            1 => Self::split_by_paragraphs(text),
            2 => Self::split_by_sentences(text),
            _ => return Self::split_by_words(text, config),
        };

        if parts.len() <= 1 {
            return Self::recursive_chunk(text, config, level + 1);
        }

        let separator = if level < 2 { "\n\n" } else { " " };
        let mut result = Vec::new();
        let mut current = String::new();

        for part in parts {
            if current.is_empty() {
                current = part.to_string();
            } else if helpers::char_len(&current) + separator.len() + helpers::char_len(part)
                <= config.chunk_size
            {
                current.push_str(separator);
                current.push_str(part);
            } else {
                result.extend(Self::flush(&current, config, level));
                current = part.to_string();
            }
        }

        if !current.is_empty() {
            result.extend(Self::flush(&current, config, level));
        }

        result
    }

    fn flush(current: &str, config: &ChunkingConfig, level: usize) -> Vec<String> {
        if helpers::char_len(current) > config.chunk_size {
            Self::recursive_chunk(current, config, level + 1)
        } else {
            vec![current.to_string()]
        }
    }

    /// Word windows; each new window starts with the trailing words of the
    /// previous one that fit in `chunk_overlap`
    fn split_by_words(text: &str, config: &ChunkingConfig) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut result = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_len = 0;

        for word in words {
            let word_len = helpers::char_len(word);
            let added = if current.is_empty() { word_len } else { word_len + 1 };

            if !current.is_empty() && current_len + added > config.chunk_size {
                result.push(current.join(" "));

                let mut carried: Vec<&str> = Vec::new();
                let mut carried_len = 0;
                for w in current.iter().rev() {
                    let len = helpers::char_len(w) + usize::from(!carried.is_empty());
                    if carried_len + len + word_len + 1 > config.chunk_size
                        || carried_len + len > config.chunk_overlap
                    {
                        break;
                    }
                    carried.insert(0, w);
                    carried_len += len;
                }

                current = carried;
                current_len = carried_len;
            }

            current_len += if current.is_empty() { word_len } else { word_len + 1 };
            current.push(word);
        }

        if !current.is_empty() {
            result.push(current.join(" "));
        }

        // a single word longer than a chunk is cut by characters
        result
            .into_iter()
            .flat_map(|chunk| {
                if helpers::char_len(&chunk) <= config.chunk_size {
                    vec![chunk]
                } else {
                    let chars: Vec<char> = chunk.chars().collect();
                    chars
                        .chunks(config.chunk_size)
                        .map(|c| c.iter().collect())
                        .collect()
                }
            })
            .collect()
    }
}

impl ChunkingStrategy for RecursiveChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError> {
        config.validate()?;

        let content = content.trim();
        if content.is_empty() {
            return Ok(vec![]);
        }

        Ok(helpers::index_chunks(Self::recursive_chunk(content, config, 0)))
    }

    fn name(&self) -> &'static str {
        "recursive"
    }
}
