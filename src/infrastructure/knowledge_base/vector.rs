//! Vector similarity provider

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::factory::ProviderScope;
use super::in_search_scope;
use super::store::{EmbeddedChunk, VectorDocument, VectorStore};
use crate::domain::embedding::{cosine_similarity, EmbeddingProvider};
use crate::domain::ingestion::{ChunkingConfig, ChunkingStrategy};
use crate::domain::knowledge_base::{
    belongs_to, sort_by_score, DocumentProvider, DocumentRecord, KnowledgeBaseId, SearchResult,
    VectorDbSettings, VECTOR_DB,
};
use crate::domain::DomainError;
use crate::infrastructure::ingestion::FixedSizeChunker;

/// Chunks and embeds documents into a shared collection. A document scores
/// as its best-matching chunk.
#[derive(Debug)]
pub struct VectorDbProvider {
    scope: ProviderScope,
    settings: VectorDbSettings,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: FixedSizeChunker,
    store: Arc<VectorStore>,
    initialized: AtomicBool,
}

impl VectorDbProvider {
    pub fn new(
        scope: ProviderScope,
        settings: VectorDbSettings,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<VectorStore>,
    ) -> Self {
        Self {
            scope,
            settings,
            embedder,
            chunker: FixedSizeChunker::new(),
            store,
            initialized: AtomicBool::new(false),
        }
    }

    fn chunking(&self) -> ChunkingConfig {
        ChunkingConfig::new(self.settings.chunk_size, self.settings.chunk_overlap)
    }

    async fn ensure_initialized(&self) -> Result<(), DomainError> {
        if !self.is_initialized() {
            self.initialize().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentProvider for VectorDbProvider {
    fn name(&self) -> &str {
        VECTOR_DB
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn initialize(&self) -> Result<(), DomainError> {
        self.chunking()
            .validate()
            .map_err(|e| DomainError::provider(VECTOR_DB, e.to_string()))?;
        self.store
            .bind_dimensions(self.embedder.dimensions())
            .map_err(|e| DomainError::provider(VECTOR_DB, e.to_string()))?;

        self.initialized.store(true, Ordering::SeqCst);
        info!(
            tenant = %self.scope.tenant,
            kb_id = %self.scope.kb_id,
            collection = %self.settings.collection,
            embedder = self.embedder.provider_name(),
            dimensions = self.embedder.dimensions(),
            "Vector provider initialized"
        );
        Ok(())
    }

    async fn add_document(&self, document: &DocumentRecord) -> Result<bool, DomainError> {
        self.ensure_initialized().await?;

        let chunks = self.chunker.chunk(&document.content, &self.chunking())?;
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = if texts.is_empty() {
            vec![]
        } else {
            self.embedder.embed(&texts).await?
        };

        if embeddings.len() != chunks.len() {
            return Err(DomainError::provider(
                VECTOR_DB,
                format!(
                    "expected {} embeddings, got {}",
                    chunks.len(),
                    embeddings.len()
                ),
            ));
        }

        let chunks: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk {
                index: chunk.index,
                content: chunk.content,
                embedding,
            })
            .collect();

        debug!(doc_id = %document.doc_id, chunks = chunks.len(), "Adding document to collection");

        self.store.documents.write().await.insert(
            document.doc_id.clone(),
            VectorDocument {
                metadata: document.metadata.clone(),
                chunks,
            },
        );
        Ok(true)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<bool, DomainError> {
        self.ensure_initialized().await?;

        self.store.documents.write().await.remove(doc_id);
        Ok(true)
    }

    async fn get_document_ids(&self, kb_id: &KnowledgeBaseId) -> Result<Vec<String>, DomainError> {
        self.ensure_initialized().await?;

        Ok(self
            .store
            .documents
            .read()
            .await
            .keys()
            .filter(|id| belongs_to(id, kb_id))
            .cloned()
            .collect())
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        doc_ids: Option<&[String]>,
    ) -> Result<Vec<SearchResult>, DomainError> {
        self.ensure_initialized().await?;
        if limit == 0 {
            return Ok(vec![]);
        }

        let query_embedding = self.embedder.embed_one(query).await?;
        let documents = self.store.documents.read().await;

        let mut results: Vec<SearchResult> = documents
            .iter()
            .filter(|(id, _)| in_search_scope(id, &self.scope.kb_id, doc_ids))
            .filter_map(|(id, doc)| {
                doc.chunks
                    .iter()
                    .map(|c| (c, cosine_similarity(&query_embedding, &c.embedding)))
                    .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(chunk, score)| {
                        SearchResult::new(id.clone(), chunk.content.clone(), score)
                            .with_all_metadata(doc.metadata.clone())
                    })
            })
            .collect();

        sort_by_score(&mut results);
        results.truncate(limit);
        Ok(results)
    }
}
