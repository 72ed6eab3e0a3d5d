//! Search result type shared by every provider

use serde::{Deserialize, Serialize};

/// Document metadata as submitted to and returned by providers
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single ranked hit.
///
/// Scores are provider-specific and not normalized across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Document id (the `KB:{kb_id}#...` composite key)
    pub id: String,
    /// Matched content text
    pub content: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: Metadata,
    /// Higher is more relevant
    pub score: f32,
}

impl SearchResult {
    /// Create a new search result
    pub fn new(id: impl Into<String>, content: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Metadata::new(),
            score,
        }
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Set all metadata
    pub fn with_all_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}
