//! In-process backing stores shared by providers.
//!
//! A store stands in for one physical collection, graph or namespace. Stores
//! are keyed by tenant and name, so knowledge bases of one tenant configured
//! with the same collection share a store and are kept apart only by their
//! `KB:{kb_id}#` id prefix.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;

use crate::domain::knowledge_base::{Metadata, TenantId};
use crate::domain::DomainError;

/// Named stores of one kind, created on first use
#[derive(Debug)]
pub struct StoreMap<T> {
    stores: Mutex<HashMap<(TenantId, String), Arc<T>>>,
}

impl<T> Default for StoreMap<T> {
    fn default() -> Self {
        Self {
            stores: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Default> StoreMap<T> {
    pub fn get_or_create(&self, tenant: &TenantId, name: &str) -> Arc<T> {
        let mut stores = self.stores.lock().unwrap_or_else(|e| e.into_inner());
        stores
            .entry((tenant.clone(), name.to_string()))
            .or_default()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.stores.lock().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every store owned by a provider factory
#[derive(Debug, Default)]
pub struct StoreCatalog {
    pub vectors: StoreMap<VectorStore>,
    pub graphs: StoreMap<GraphStore>,
    pub legra: StoreMap<LegraStore>,
}

impl StoreCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One embedded chunk
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub index: usize,
    pub content: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct VectorDocument {
    pub metadata: Metadata,
    pub chunks: Vec<EmbeddedChunk>,
}

/// Vector collection. Its dimension is fixed by the first provider bound to it.
#[derive(Debug, Default)]
pub struct VectorStore {
    dimensions: Mutex<Option<usize>>,
    pub documents: RwLock<BTreeMap<String, VectorDocument>>,
}

impl VectorStore {
    /// Claim the collection for `dimensions`-wide vectors
    pub fn bind_dimensions(&self, dimensions: usize) -> Result<(), DomainError> {
        let mut bound = self.dimensions.lock().unwrap_or_else(|e| e.into_inner());
        match *bound {
            Some(existing) if existing != dimensions => Err(DomainError::configuration(format!(
                "collection holds {}-dimensional vectors, embedder produces {}",
                existing, dimensions
            ))),
            _ => {
                *bound = Some(dimensions);
                Ok(())
            }
        }
    }
}

/// Chunk node with its keyword edges
#[derive(Debug, Clone)]
pub struct GraphChunk {
    pub index: usize,
    pub content: String,
    pub keywords: HashSet<String>,
}

/// Document node with its chunks and keyword edges
#[derive(Debug, Clone)]
pub struct GraphDocument {
    pub name: String,
    pub description: String,
    pub content: String,
    pub keywords: Vec<String>,
    pub chunks: Vec<GraphChunk>,
}

#[derive(Debug, Default)]
pub struct GraphStore {
    pub documents: RwLock<BTreeMap<String, GraphDocument>>,
}

/// Chunk of the hybrid index
#[derive(Debug, Clone)]
pub struct HybridChunk {
    pub index: usize,
    pub content: String,
    pub embedding: Vec<f32>,
    /// Most frequent first
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct HybridDocument {
    pub metadata: Metadata,
    pub chunks: Vec<HybridChunk>,
}

/// Corpus-wide structures rebuilt by a finalize pass
#[derive(Debug, Default, Clone)]
pub struct HybridIndex {
    pub idf: HashMap<String, f32>,
    /// Dominant keyword -> every keyword of the chunks it dominates
    pub communities: BTreeMap<String, BTreeSet<String>>,
    pub chunk_count: usize,
}

impl HybridIndex {
    /// Weight of a keyword; unseen keywords weigh as much as the rarest seen one
    pub fn idf(&self, keyword: &str) -> f32 {
        self.idf
            .get(keyword)
            .copied()
            .unwrap_or_else(|| (1.0 + self.chunk_count.max(1) as f32).ln())
    }

    /// Keywords sharing a community with any of `keywords`, minus `keywords` themselves
    pub fn related_keywords(&self, keywords: &[String]) -> HashSet<&str> {
        keywords
            .iter()
            .filter_map(|k| self.communities.get(k))
            .flatten()
            .map(String::as_str)
            .filter(|k| !keywords.iter().any(|q| q.as_str() == *k))
            .collect()
    }
}

/// Hybrid namespace: staged documents wait for finalize before search sees them
#[derive(Debug, Default)]
pub struct LegraStore {
    pub state: RwLock<LegraState>,
}

#[derive(Debug, Default)]
pub struct LegraState {
    pub staged: BTreeMap<String, HybridDocument>,
    pub published: BTreeMap<String, HybridDocument>,
    pub index: HybridIndex,
}

impl LegraState {
    /// Publish staged documents and rebuild the index; returns how many were published
    pub fn finalize(&mut self) -> usize {
        let staged = std::mem::take(&mut self.staged);
        let published = staged.len();
        self.published.extend(staged);
        self.index = build_index(&self.published);
        published
    }

    /// Drop a document from both phases. Removing a published document
    /// rebuilds the index over what is left.
    pub fn remove(&mut self, doc_id: &str) {
        self.staged.remove(doc_id);
        if self.published.remove(doc_id).is_some() {
            self.index = build_index(&self.published);
        }
    }
}

fn build_index(documents: &BTreeMap<String, HybridDocument>) -> HybridIndex {
    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    let mut chunk_count = 0;

    for doc in documents.values() {
        for chunk in &doc.chunks {
            chunk_count += 1;
            for keyword in &chunk.keywords {
                *document_frequency.entry(keyword.as_str()).or_insert(0) += 1;
            }
        }
    }

    let idf: HashMap<String, f32> = document_frequency
        .into_iter()
        .map(|(k, df)| (k.to_string(), (1.0 + chunk_count as f32 / df as f32).ln()))
        .collect();

    let mut communities: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for doc in documents.values() {
        for chunk in &doc.chunks {
            // dominant: highest tf rank, rarer keyword wins ties
            let dominant = chunk.keywords.iter().enumerate().max_by(|(ia, a), (ib, b)| {
                let wa = idf.get(*a).copied().unwrap_or(0.0) / (*ia as f32 + 1.0);
                let wb = idf.get(*b).copied().unwrap_or(0.0) / (*ib as f32 + 1.0);
                wa.partial_cmp(&wb).unwrap_or(std::cmp::Ordering::Equal)
            });
            if let Some((_, keyword)) = dominant {
                communities
                    .entry(keyword.clone())
                    .or_default()
                    .extend(chunk.keywords.iter().cloned());
            }
        }
    }

    HybridIndex {
        idf,
        communities,
        chunk_count,
    }
}
