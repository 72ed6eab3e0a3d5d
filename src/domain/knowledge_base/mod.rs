//! Knowledge Base domain - retrieval providers, documents and results

mod content;
mod doc_id;
mod entity;
mod load;
mod merge;
mod provider;
mod rag_config;
mod search;
mod validation;

pub use content::{is_remote, plan_content_units, ContentSource, ContentUnit, LOCAL_FILE_STORAGE};
pub use doc_id::{belongs_to, content_doc_id, file_doc_id, kb_prefix};
pub use entity::{KnowledgeBase, KnowledgeBaseId, KnowledgeBaseType, KnowledgeFile, TenantId};
pub use load::{LoadAction, LoadItemResult};
pub use merge::{format_results, merge_results, sort_by_score, FormatOptions};
pub use provider::{DocumentProvider, DocumentRecord, InitializationPolicy, ProviderResults};
pub use rag_config::{
    EmbeddingSettings, GraphDbSettings, LegraSettings, ProviderConfig, RagConfig,
    VectorDbSettings, GRAPH_DB, LEGRA, VECTOR_DB,
};
pub use search::{Metadata, SearchResult};
pub use validation::{
    validate_chunking, validate_knowledge_base_id, validate_vector_weight,
    KnowledgeBaseValidationError,
};

#[cfg(test)]
pub use provider::mock::{CallLog, MockDocumentProvider};
