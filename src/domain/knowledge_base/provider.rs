//! Document provider trait

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::entity::KnowledgeBaseId;
use super::search::{Metadata, SearchResult};
use crate::domain::error::DomainError;

/// Per-provider outcome of a fan-out operation, keyed by provider name
pub type ProviderResults = BTreeMap<String, bool>;

/// Document submitted to a provider
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    /// Composite `KB:{kb_id}#...` id
    pub doc_id: String,
    pub content: String,
    pub metadata: Metadata,
}

impl DocumentRecord {
    pub fn new(doc_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_all_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Metadata value as a string, if present and a string
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// When a retrieval service counts as initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitializationPolicy {
    /// At least one provider connected; the rest are dropped
    #[default]
    AnyProvider,
    /// Every configured provider must connect
    AllProviders,
}

impl InitializationPolicy {
    /// Apply the policy to `succeeded` out of `total` providers
    pub fn is_satisfied(&self, succeeded: usize, total: usize) -> bool {
        match self {
            Self::AnyProvider => succeeded > 0,
            Self::AllProviders => total > 0 && succeeded == total,
        }
    }
}

/// One retrieval backend bound to a single knowledge base.
///
/// Methods return errors freely; the retrieval service turns them into
/// `false` or empty results and logs them with the provider name.
/// Every data operation initializes lazily when called first.
#[async_trait]
pub trait DocumentProvider: Send + Sync + Debug {
    /// Provider name, used as the key of result maps
    fn name(&self) -> &str;

    /// Whether the provider currently holds a live connection
    fn is_initialized(&self) -> bool;

    /// Connect; idempotent
    async fn initialize(&self) -> Result<(), DomainError>;

    /// Upsert a document. Existing content under the same id is replaced.
    async fn add_document(&self, document: &DocumentRecord) -> Result<bool, DomainError>;

    /// Remove a document and everything derived from it. Unknown ids succeed.
    async fn delete_document(&self, doc_id: &str) -> Result<bool, DomainError>;

    /// Ids scoped to `kb_id` by prefix
    async fn get_document_ids(&self, kb_id: &KnowledgeBaseId) -> Result<Vec<String>, DomainError>;

    /// Ranked results, optionally restricted to `doc_ids`
    async fn search(
        &self,
        query: &str,
        limit: usize,
        doc_ids: Option<&[String]>,
    ) -> Result<Vec<SearchResult>, DomainError>;

    /// Whether the index needs an explicit batch build before it is queryable
    fn supports_finalize(&self) -> bool {
        false
    }

    /// Run the batch build. Providers without one report `false`.
    async fn finalize(&self) -> Result<bool, DomainError> {
        Ok(false)
    }
}
