//! Provider factory

use std::fmt::Debug;
use std::sync::Arc;

use crate::domain::knowledge_base::{DocumentProvider, KnowledgeBaseId, ProviderConfig, TenantId};
use crate::domain::DomainError;
use crate::infrastructure::embedding::build_embedder;

use super::graph::GraphDbProvider;
use super::legra::LegraProvider;
use super::store::StoreCatalog;
use super::vector::VectorDbProvider;

/// Tenant and knowledge base a provider instance serves
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderScope {
    pub tenant: TenantId,
    pub kb_id: KnowledgeBaseId,
}

impl ProviderScope {
    pub fn new(tenant: TenantId, kb_id: KnowledgeBaseId) -> Self {
        Self { tenant, kb_id }
    }
}

/// Builds provider instances from configuration.
///
/// Construction performs no I/O; connections are made by
/// [`DocumentProvider::initialize`].
pub trait ProviderFactory: Send + Sync + Debug {
    fn create(
        &self,
        scope: &ProviderScope,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn DocumentProvider>, DomainError>;
}

/// Factory for the built-in providers, backed by in-process stores
#[derive(Debug, Default)]
pub struct DefaultProviderFactory {
    catalog: Arc<StoreCatalog>,
}

impl DefaultProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share stores with another factory
    pub fn with_catalog(catalog: Arc<StoreCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<StoreCatalog> {
        &self.catalog
    }
}

impl ProviderFactory for DefaultProviderFactory {
    fn create(
        &self,
        scope: &ProviderScope,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn DocumentProvider>, DomainError> {
        match config {
            ProviderConfig::VectorDb(settings) => {
                let embedder = build_embedder(&settings.embedding)?;
                let store = self
                    .catalog
                    .vectors
                    .get_or_create(&scope.tenant, &settings.collection);
                Ok(Arc::new(VectorDbProvider::new(
                    scope.clone(),
                    settings.clone(),
                    embedder,
                    store,
                )))
            }
            ProviderConfig::GraphDb(settings) => {
                let store = self.catalog.graphs.get_or_create(&scope.tenant, &settings.uri);
                Ok(Arc::new(GraphDbProvider::new(
                    scope.clone(),
                    settings.clone(),
                    store,
                )))
            }
            ProviderConfig::Legra(settings) => {
                let embedder = build_embedder(&settings.embedding)?;
                let store = self
                    .catalog
                    .legra
                    .get_or_create(&scope.tenant, &settings.namespace);
                Ok(Arc::new(LegraProvider::new(
                    scope.clone(),
                    settings.clone(),
                    embedder,
                    store,
                )))
            }
            ProviderConfig::Unknown { name, .. } => Err(DomainError::unsupported(format!(
                "Unknown retrieval provider '{}'",
                name
            ))),
            ProviderConfig::Invalid { name, reason, .. } => Err(DomainError::configuration(
                format!("Provider '{}' is misconfigured: {}", name, reason),
            )),
        }
    }
}
