//! Retrieval providers, services and registries

mod factory;
mod graph;
mod legra;
mod registry;
mod service;
mod store;
mod tenants;
mod vector;

pub use factory::{DefaultProviderFactory, ProviderFactory, ProviderScope};
pub use graph::GraphDbProvider;
pub use legra::LegraProvider;
pub use registry::{RegistrySettings, RegistryStats, ServiceRegistry};
pub use service::RetrievalService;
pub use store::StoreCatalog;
pub use tenants::TenantRegistries;
pub use vector::VectorDbProvider;

#[cfg(test)]
pub use factory::mock::MockProviderFactory;

use crate::domain::knowledge_base::{belongs_to, KnowledgeBaseId};

/// Whether a provider bound to `kb_id` may return `doc_id`, optionally
/// restricted to `doc_ids`
fn in_search_scope(doc_id: &str, kb_id: &KnowledgeBaseId, doc_ids: Option<&[String]>) -> bool {
    belongs_to(doc_id, kb_id) && doc_ids.is_none_or(|ids| ids.iter().any(|id| id == doc_id))
}
