//! Hybrid graph + vector provider with a two-phase index build
//!
//! Added documents are staged. `finalize` publishes everything staged in the
//! namespace, recomputes keyword weights and regroups chunks into keyword
//! communities. Search only sees published chunks and scores each one as
//! `vector_weight * cosine + (1 - vector_weight) * graph score`, where the
//! graph score is the weighted keyword overlap, lifted for chunks that share
//! a community with a query keyword.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::factory::ProviderScope;
use super::in_search_scope;
use super::store::{HybridChunk, HybridDocument, HybridIndex, LegraStore};
use crate::domain::embedding::{cosine_similarity, EmbeddingProvider};
use crate::domain::ingestion::{extract_keywords, ChunkingConfig, ChunkingStrategy};
use crate::domain::knowledge_base::{
    belongs_to, sort_by_score, DocumentProvider, DocumentRecord, KnowledgeBaseId, LegraSettings,
    SearchResult, LEGRA,
};
use crate::domain::DomainError;
use crate::infrastructure::ingestion::FixedSizeChunker;

#[derive(Debug)]
pub struct LegraProvider {
    scope: ProviderScope,
    settings: LegraSettings,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: FixedSizeChunker,
    store: Arc<LegraStore>,
    initialized: AtomicBool,
}

impl LegraProvider {
    pub fn new(
        scope: ProviderScope,
        settings: LegraSettings,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<LegraStore>,
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

/// Share of the remaining graph score given to a chunk reached through a community
const RELATED_WEIGHT: f32 = 0.5;

/// Share of the query's keyword weight found in `chunk`
fn keyword_overlap(index: &HybridIndex, query_keywords: &[String], chunk: &HybridChunk) -> f32 {
    let total: f32 = query_keywords.iter().map(|k| index.idf(k)).sum();
    if total <= 0.0 {
        return 0.0;
    }

    let chunk_keywords: HashSet<&str> = chunk.keywords.iter().map(String::as_str).collect();
    let matched: f32 = query_keywords
        .iter()
        .filter(|k| chunk_keywords.contains(k.as_str()))
        .map(|k| index.idf(k))
        .sum();

    matched / total
}

fn graph_score(
    index: &HybridIndex,
    query_keywords: &[String],
    related: &HashSet<&str>,
    chunk: &HybridChunk,
) -> f32 {
    let overlap = keyword_overlap(index, query_keywords, chunk);
    let reached = chunk.keywords.iter().any(|k| related.contains(k.as_str()));
    if reached {
        overlap + (1.0 - overlap) * RELATED_WEIGHT
    } else {
        overlap
    }
}

#[async_trait]
impl DocumentProvider for LegraProvider {
    fn name(&self) -> &str {
        LEGRA
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn initialize(&self) -> Result<(), DomainError> {
        self.chunking()
            .validate()
            .map_err(|e| DomainError::provider(LEGRA, e.to_string()))?;

        self.initialized.store(true, Ordering::SeqCst);
        info!(
            tenant = %self.scope.tenant,
            kb_id = %self.scope.kb_id,
            namespace = %self.settings.namespace,
            embedder = self.embedder.provider_name(),
            "Legra provider initialized"
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
                LEGRA,
                format!(
                    "expected {} embeddings, got {}",
                    chunks.len(),
                    embeddings.len()
                ),
            ));
        }

        let chunks: Vec<HybridChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| HybridChunk {
                index: chunk.index,
                keywords: extract_keywords(&chunk.content),
                content: chunk.content,
                embedding,
            })
            .collect();

        debug!(doc_id = %document.doc_id, chunks = chunks.len(), "Staging document");

        let mut state = self.store.state.write().await;
        state.remove(&document.doc_id);
        state.staged.insert(
            document.doc_id.clone(),
            HybridDocument {
                metadata: document.metadata.clone(),
                chunks,
            },
        );
        Ok(true)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<bool, DomainError> {
        self.ensure_initialized().await?;

        self.store.state.write().await.remove(doc_id);
        Ok(true)
    }

    async fn get_document_ids(&self, kb_id: &KnowledgeBaseId) -> Result<Vec<String>, DomainError> {
        self.ensure_initialized().await?;

        let state = self.store.state.read().await;
        let mut ids: Vec<String> = state
            .published
            .keys()
            .chain(state.staged.keys())
            .filter(|id| belongs_to(id, kb_id))
            .cloned()
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
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
        let query_keywords = extract_keywords(query);
        let weight = self.settings.vector_weight;

        let state = self.store.state.read().await;
        let related = state.index.related_keywords(&query_keywords);
        let mut results: Vec<SearchResult> = state
            .published
            .iter()
            .filter(|(id, _)| in_search_scope(id, &self.scope.kb_id, doc_ids))
            .filter_map(|(id, doc)| {
                doc.chunks
                    .iter()
                    .map(|chunk| {
                        let vector = cosine_similarity(&query_embedding, &chunk.embedding);
                        let graph = graph_score(&state.index, &query_keywords, &related, chunk);
                        (chunk, weight * vector + (1.0 - weight) * graph)
                    })
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

    fn supports_finalize(&self) -> bool {
        true
    }

    async fn finalize(&self) -> Result<bool, DomainError> {
        self.ensure_initialized().await?;

        let mut state = self.store.state.write().await;
        let published = state.finalize();

        info!(
            namespace = %self.settings.namespace,
            published,
            chunks = state.index.chunk_count,
            keywords = state.index.idf.len(),
            communities = state.index.communities.len(),
            "Legra index finalized"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::knowledge_base::{content_doc_id, file_doc_id, TenantId};
    use crate::infrastructure::embedding::HashingEmbedder;

    fn kb(id: &str) -> KnowledgeBaseId {
        KnowledgeBaseId::new(id).unwrap()
    }

    fn provider(kb_id: &str, store: &Arc<LegraStore>) -> LegraProvider {
        provider_with(kb_id, store, LegraSettings::default())
    }

    fn provider_with(kb_id: &str, store: &Arc<LegraStore>, settings: LegraSettings) -> LegraProvider {
        LegraProvider::new(
            ProviderScope::new(TenantId::default(), kb(kb_id)),
            settings,
            Arc::new(HashingEmbedder::new(256).unwrap()),
            store.clone(),
        )
    }

    #[tokio::test]
    async fn test_staged_documents_are_invisible_until_finalize() {
        let store = Arc::new(LegraStore::default());
        let legra = provider("shop", &store);
        legra
            .add_document(&DocumentRecord::new(
                content_doc_id(&kb("shop")),
                "refund policy for returns",
            ))
            .await
            .unwrap();

        assert!(legra.search("refund policy", 3, None).await.unwrap().is_empty());
        assert_eq!(legra.get_document_ids(&kb("shop")).await.unwrap().len(), 1);

        assert!(legra.finalize().await.unwrap());

        let results = legra.search("refund policy", 3, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].score > 0.5);
    }

    #[tokio::test]
    async fn test_keyword_overlap_ranks_documents() {
        let store = Arc::new(LegraStore::default());
        let legra = provider("shop", &store);
        legra
            .add_document(&DocumentRecord::new(
                content_doc_id(&kb("shop")),
                "refund policy for damaged items",
            ))
            .await
            .unwrap();
        legra
            .add_document(&DocumentRecord::new(
                file_doc_id(&kb("shop"), 0, "x"),
                "warehouse opening hours",
            ))
            .await
            .unwrap();
        legra.finalize().await.unwrap();

        let results = legra.search("refund policy", 5, None).await.unwrap();

        assert_eq!(results[0].id, "KB:shop#content");
    }

    #[tokio::test]
    async fn test_community_reaches_related_chunks() {
        let store = Arc::new(LegraStore::default());
        let settings = LegraSettings {
            vector_weight: 0.0,
            ..Default::default()
        };
        let legra = provider_with("shop", &store, settings);
        for (i, text) in ["refund refund returns", "returns shipping", "warehouse hours"]
            .iter()
            .enumerate()
        {
            legra
                .add_document(&DocumentRecord::new(file_doc_id(&kb("shop"), i, "x"), *text))
                .await
                .unwrap();
        }
        legra.finalize().await.unwrap();

        let results = legra.search("refund", 5, None).await.unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["KB:shop#file_0:x", "KB:shop#file_1:x", "KB:shop#file_2:x"]
        );
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!((results[1].score - RELATED_WEIGHT).abs() < 1e-6);
        assert!(results[2].score.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_delete_reweights_remaining_keywords() {
        let store = Arc::new(LegraStore::default());
        let legra = provider("shop", &store);
        let dropped = file_doc_id(&kb("shop"), 2, "z");
        for (i, text) in ["refund policy", "refund desk"].iter().enumerate() {
            legra
                .add_document(&DocumentRecord::new(file_doc_id(&kb("shop"), i, "x"), *text))
                .await
                .unwrap();
        }
        legra
            .add_document(&DocumentRecord::new(dropped.clone(), "shipping hours"))
            .await
            .unwrap();
        legra.finalize().await.unwrap();
        let before = store.state.read().await.index.idf("refund");

        legra.delete_document(&dropped).await.unwrap();

        let state = store.state.read().await;
        assert_eq!(state.index.chunk_count, 2);
        assert!(state.index.idf("refund") < before);
        assert!(!state.index.idf.contains_key("shipping"));
    }

    #[tokio::test]
    async fn test_readd_unpublishes_until_next_finalize() {
        let store = Arc::new(LegraStore::default());
        let legra = provider("shop", &store);
        let id = content_doc_id(&kb("shop"));
        legra.add_document(&DocumentRecord::new(id.clone(), "alpha")).await.unwrap();
        legra.finalize().await.unwrap();

        legra.add_document(&DocumentRecord::new(id.clone(), "beta")).await.unwrap();

        assert!(legra.search("alpha", 3, None).await.unwrap().is_empty());
        legra.finalize().await.unwrap();
        assert_eq!(legra.search("beta", 3, None).await.unwrap()[0].content, "beta");
    }

    #[tokio::test]
    async fn test_finalize_publishes_whole_namespace() {
        let store = Arc::new(LegraStore::default());
        let a = provider("a", &store);
        let b = provider("b", &store);
        a.add_document(&DocumentRecord::new(content_doc_id(&kb("a")), "alpha"))
            .await
            .unwrap();
        b.add_document(&DocumentRecord::new(content_doc_id(&kb("b")), "alpha"))
            .await
            .unwrap();

        a.finalize().await.unwrap();

        let results = b.search("alpha", 5, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "KB:b#content");
    }

    #[tokio::test]
    async fn test_delete_removes_published_document() {
        let store = Arc::new(LegraStore::default());
        let legra = provider("a", &store);
        let id = content_doc_id(&kb("a"));
        legra.add_document(&DocumentRecord::new(id.clone(), "alpha")).await.unwrap();
        legra.finalize().await.unwrap();

        legra.delete_document(&id).await.unwrap();

        assert!(legra.search("alpha", 5, None).await.unwrap().is_empty());
        assert!(legra.get_document_ids(&kb("a")).await.unwrap().is_empty());
    }

    #[test]
    fn test_supports_finalize() {
        assert!(provider("a", &Arc::new(LegraStore::default())).supports_finalize());
    }
}
