//! Domain layer - Core retrieval types, traits and pure logic

pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod knowledge_base;

pub use embedding::{cosine_similarity, EmbeddingProvider};
pub use error::DomainError;
pub use ingestion::{Chunk, ChunkingConfig, ChunkingStrategy, ContentLoader, TextExtractor};
pub use knowledge_base::{
    DocumentProvider, DocumentRecord, InitializationPolicy, KnowledgeBase, KnowledgeBaseId,
    KnowledgeBaseType, LoadAction, LoadItemResult, ProviderConfig, ProviderResults, RagConfig,
    SearchResult, TenantId,
};
