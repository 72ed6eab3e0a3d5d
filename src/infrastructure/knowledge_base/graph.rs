//! Keyword graph provider
//!
//! Documents are linked to their keywords, and so are their chunks. Search
//! counts how many query keywords each chunk links to; when that finds too
//! little, a case-sensitive substring scan over chunks fills the gap.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use super::factory::ProviderScope;
use super::in_search_scope;
use super::store::{GraphChunk, GraphDocument, GraphStore};
use crate::domain::ingestion::{extract_keywords, ChunkingConfig, ChunkingStrategy};
use crate::domain::knowledge_base::{
    belongs_to, sort_by_score, DocumentProvider, DocumentRecord, GraphDbSettings,
    KnowledgeBaseId, SearchResult, GRAPH_DB,
};
use crate::domain::DomainError;
use crate::infrastructure::ingestion::RecursiveChunker;

/// Score given to chunks found by the substring fallback
const FALLBACK_SCORE: f32 = 0.5;

/// Chunks fetched per requested result
const CANDIDATES_PER_RESULT: usize = 3;

#[derive(Debug)]
pub struct GraphDbProvider {
    scope: ProviderScope,
    settings: GraphDbSettings,
    chunker: RecursiveChunker,
    store: Arc<GraphStore>,
    initialized: AtomicBool,
}

impl GraphDbProvider {
    pub fn new(scope: ProviderScope, settings: GraphDbSettings, store: Arc<GraphStore>) -> Self {
        Self {
            scope,
            settings,
            chunker: RecursiveChunker::new(),
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

/// Chunks of one document that matched, in match order
struct Hit<'a> {
    doc_id: &'a str,
    doc: &'a GraphDocument,
    chunks: Vec<&'a GraphChunk>,
    best: usize,
}

/// Group matched chunks by document, keeping the order documents first appear
fn group_hits<'a>(matches: Vec<(&'a str, &'a GraphDocument, &'a GraphChunk, usize)>) -> Vec<Hit<'a>> {
    let mut hits: Vec<Hit<'a>> = Vec::new();

    for (doc_id, doc, chunk, matched) in matches {
        match hits.iter_mut().find(|h| h.doc_id == doc_id) {
            Some(hit) => {
                hit.chunks.push(chunk);
                hit.best = hit.best.max(matched);
            }
            None => hits.push(Hit {
                doc_id,
                doc,
                chunks: vec![chunk],
                best: matched,
            }),
        }
    }

    hits
}

fn to_result(mut hit: Hit<'_>, score: f32) -> SearchResult {
    hit.chunks.sort_by_key(|c| c.index);
    let content = hit
        .chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    SearchResult::new(hit.doc_id, content, score)
        .with_metadata("name", json!(hit.doc.name))
        .with_metadata("description", json!(hit.doc.description))
        .with_metadata("chunk_count", json!(hit.chunks.len()))
}

#[async_trait]
impl DocumentProvider for GraphDbProvider {
    fn name(&self) -> &str {
        GRAPH_DB
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    async fn initialize(&self) -> Result<(), DomainError> {
        self.chunking()
            .validate()
            .map_err(|e| DomainError::provider(GRAPH_DB, e.to_string()))?;

        self.initialized.store(true, Ordering::SeqCst);
        info!(
            tenant = %self.scope.tenant,
            kb_id = %self.scope.kb_id,
            uri = %self.settings.uri,
            "Graph provider initialized"
        );
        Ok(())
    }

    async fn add_document(&self, document: &DocumentRecord) -> Result<bool, DomainError> {
        self.ensure_initialized().await?;

        let chunks = self
            .chunker
            .chunk(&document.content, &self.chunking())?
            .into_iter()
            .map(|c| GraphChunk {
                index: c.index,
                keywords: extract_keywords(&c.content).into_iter().collect(),
                content: c.content,
            })
            .collect::<Vec<_>>();

        let node = GraphDocument {
            name: document.metadata_str("name").unwrap_or_default().to_string(),
            description: document
                .metadata_str("description")
                .unwrap_or_default()
                .to_string(),
            content: document.content.clone(),
            keywords: extract_keywords(&document.content),
            chunks,
        };

        debug!(
            doc_id = %document.doc_id,
            chunks = node.chunks.len(),
            keywords = node.keywords.len(),
            "Adding document to graph"
        );

        // replaces any previous node with the same id
        self.store
            .documents
            .write()
            .await
            .insert(document.doc_id.clone(), node);
        Ok(true)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<bool, DomainError> {
        self.ensure_initialized().await?;

        let existed = self.store.documents.write().await.remove(doc_id).is_some();
        debug!(doc_id = %doc_id, existed, "Deleted document from graph");
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

        let documents = self.store.documents.read().await;
        let scoped: Vec<(&str, &GraphDocument)> = documents
            .iter()
            .filter(|(id, _)| in_search_scope(id, &self.scope.kb_id, doc_ids))
            .map(|(id, doc)| (id.as_str(), doc))
            .collect();

        let keywords = extract_keywords(query);
        let mut results = Vec::new();

        if !keywords.is_empty() {
            let mut matches: Vec<_> = scoped
                .iter()
                .flat_map(|&(id, doc)| doc.chunks.iter().map(move |c| (id, doc, c)))
                .filter_map(|(id, doc, chunk)| {
                    let matched = keywords.iter().filter(|k| chunk.keywords.contains(*k)).count();
                    (matched > 0).then_some((id, doc, chunk, matched))
                })
                .collect();
            matches.sort_by(|a, b| b.3.cmp(&a.3));
            matches.truncate(limit * CANDIDATES_PER_RESULT);

            for hit in group_hits(matches) {
                let score = hit.best as f32 / keywords.len() as f32;
                results.push(to_result(hit, score));
            }
        }

        if results.len() < limit && !query.trim().is_empty() {
            let remaining = limit - results.len();
            let found: HashSet<String> = results.iter().map(|r| r.id.clone()).collect();

            let matches: Vec<_> = scoped
                .iter()
                .filter(|(id, _)| !found.contains(*id))
                .flat_map(|&(id, doc)| doc.chunks.iter().map(move |c| (id, doc, c, 0)))
                .filter(|(_, _, chunk, _)| chunk.content.contains(query))
                .take(remaining * CANDIDATES_PER_RESULT)
                .collect();

            for hit in group_hits(matches) {
                results.push(to_result(hit, FALLBACK_SCORE));
            }
        }

        sort_by_score(&mut results);
        results.truncate(limit);

        debug!(
            kb_id = %self.scope.kb_id,
            keywords = keywords.len(),
            results = results.len(),
            "Graph search"
        );
        Ok(results)
    }
}
