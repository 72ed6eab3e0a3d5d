//! Retrieval service: one knowledge base, many providers
//!
//! Every operation fans out to all providers concurrently. Provider errors
//! never escape: they are logged with the provider name and become `false`
//! or an empty result list for that provider.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::factory::{ProviderFactory, ProviderScope};
use crate::domain::knowledge_base::{
    DocumentProvider, DocumentRecord, InitializationPolicy, KnowledgeBaseId, ProviderResults,
    RagConfig, SearchResult,
};

#[derive(Debug)]
pub struct RetrievalService {
    kb_id: KnowledgeBaseId,
    providers: Vec<Arc<dyn DocumentProvider>>,
    policy: InitializationPolicy,
    initialized: AtomicBool,
}

impl RetrievalService {
    pub fn new(
        kb_id: KnowledgeBaseId,
        providers: Vec<Arc<dyn DocumentProvider>>,
        policy: InitializationPolicy,
    ) -> Self {
        Self {
            kb_id,
            providers,
            policy,
            initialized: AtomicBool::new(false),
        }
    }

    /// Build a service from a knowledge base's provider configuration.
    ///
    /// Providers the factory cannot build are skipped with a warning, as is a
    /// second provider under a name already taken. Returns `None` when no
    /// provider is left.
    pub fn from_config(
        scope: &ProviderScope,
        rag_config: &RagConfig,
        factory: &dyn ProviderFactory,
        policy: InitializationPolicy,
    ) -> Option<Self> {
        let mut providers: Vec<Arc<dyn DocumentProvider>> =
            Vec::with_capacity(rag_config.providers().len());

        for config in rag_config.providers() {
            match factory.create(scope, config) {
                Ok(provider) if providers.iter().any(|p| p.name() == provider.name()) => {
                    warn!(
                        kb_id = %scope.kb_id,
                        provider = %provider.name(),
                        "Skipping duplicate retrieval provider"
                    );
                }
                Ok(provider) => providers.push(provider),
                Err(e) => warn!(
                    kb_id = %scope.kb_id,
                    provider = %config.name(),
                    error = %e,
                    "Skipping retrieval provider"
                ),
            }
        }

        if providers.is_empty() {
            warn!(kb_id = %scope.kb_id, "No usable retrieval providers configured");
            return None;
        }

        Some(Self::new(scope.kb_id.clone(), providers, policy))
    }

    pub fn kb_id(&self) -> &KnowledgeBaseId {
        &self.kb_id
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Connect every provider concurrently and apply the initialization policy.
    ///
    /// Under [`InitializationPolicy::AnyProvider`] providers that failed to
    /// connect are dropped from the service.
    pub async fn initialize(&mut self) -> bool {
        let outcomes = join_all(self.providers.iter().map(|p| p.initialize())).await;

        let mut connected = Vec::with_capacity(self.providers.len());
        for (provider, outcome) in self.providers.iter().zip(outcomes) {
            match outcome {
                Ok(()) => connected.push(provider.clone()),
                Err(e) => error!(
                    kb_id = %self.kb_id,
                    provider = %provider.name(),
                    error = %e,
                    "Provider failed to initialize"
                ),
            }
        }

        let total = self.providers.len();
        let ready = self.policy.is_satisfied(connected.len(), total);
        if ready {
            self.providers = connected;
            info!(
                kb_id = %self.kb_id,
                providers = ?self.provider_names(),
                failed = total - self.providers.len(),
                "Retrieval service initialized"
            );
        } else {
            warn!(
                kb_id = %self.kb_id,
                connected = connected.len(),
                total,
                policy = ?self.policy,
                "Retrieval service failed to initialize"
            );
        }

        self.initialized.store(ready, Ordering::SeqCst);
        ready
    }

    /// Whether the service initialized and its providers still satisfy the policy
    pub fn is_initialized(&self) -> bool {
        if !self.initialized.load(Ordering::SeqCst) {
            return false;
        }

        let live = self.providers.iter().filter(|p| p.is_initialized()).count();
        self.policy.is_satisfied(live, self.providers.len())
    }

    /// Add to every provider. With `finalize` set, providers with a
    /// finalize step publish the document right after adding it.
    pub async fn add_document(&self, document: &DocumentRecord, finalize: bool) -> ProviderResults {
        let outcomes = join_all(self.providers.iter().map(|provider| async move {
            let added = match provider.add_document(document).await {
                Ok(added) => added,
                Err(e) => {
                    error!(
                        provider = %provider.name(),
                        operation = "add_document",
                        doc_id = %document.doc_id,
                        error = %e,
                        "Provider operation failed"
                    );
                    false
                }
            };

            if !(added && finalize && provider.supports_finalize()) {
                return added;
            }

            match provider.finalize().await {
                Ok(done) => done,
                Err(e) => {
                    error!(
                        provider = %provider.name(),
                        operation = "finalize",
                        doc_id = %document.doc_id,
                        error = %e,
                        "Provider operation failed"
                    );
                    false
                }
            }
        }))
        .await;

        self.collect(outcomes)
    }

    pub async fn delete_document(&self, doc_id: &str) -> ProviderResults {
        let outcomes = join_all(self.providers.iter().map(|provider| async move {
            provider.delete_document(doc_id).await.unwrap_or_else(|e| {
                error!(
                    provider = %provider.name(),
                    operation = "delete_document",
                    doc_id = %doc_id,
                    error = %e,
                    "Provider operation failed"
                );
                false
            })
        }))
        .await;

        self.collect(outcomes)
    }

    /// Union of document ids over all providers, in first-seen order
    pub async fn get_document_ids(&self) -> Vec<String> {
        let listings = join_all(self.providers.iter().map(|provider| async move {
            provider
                .get_document_ids(&self.kb_id)
                .await
                .unwrap_or_else(|e| {
                    error!(
                        provider = %provider.name(),
                        operation = "get_document_ids",
                        error = %e,
                        "Provider operation failed"
                    );
                    vec![]
                })
        }))
        .await;

        let mut seen = HashSet::new();
        listings
            .into_iter()
            .flatten()
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    /// Results of every provider concatenated in provider order, unsorted
    pub async fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let batches = join_all(self.providers.iter().map(|provider| async move {
            provider.search(query, limit, None).await.unwrap_or_else(|e| {
                error!(
                    provider = %provider.name(),
                    operation = "search",
                    error = %e,
                    "Provider operation failed"
                );
                vec![]
            })
        }))
        .await;

        let results: Vec<SearchResult> = batches.into_iter().flatten().collect();
        debug!(kb_id = %self.kb_id, results = results.len(), "Service search");
        results
    }

    /// Whether any provider has a finalize step
    pub fn has_legra_provider(&self) -> bool {
        self.providers.iter().any(|p| p.supports_finalize())
    }

    /// Run the finalize step of every provider that has one.
    ///
    /// False when there is none or any of them fails.
    pub async fn finalize_legra(&self) -> bool {
        let finalizers: Vec<_> = self
            .providers
            .iter()
            .filter(|p| p.supports_finalize())
            .collect();
        if finalizers.is_empty() {
            return false;
        }

        let outcomes = join_all(finalizers.iter().map(|provider| async move {
            provider.finalize().await.unwrap_or_else(|e| {
                error!(
                    provider = %provider.name(),
                    operation = "finalize",
                    error = %e,
                    "Provider operation failed"
                );
                false
            })
        }))
        .await;

        outcomes.into_iter().all(|done| done)
    }

    fn collect(&self, outcomes: Vec<bool>) -> ProviderResults {
        self.providers
            .iter()
            .map(|p| p.name().to_string())
            .zip(outcomes)
            .collect()
    }
}
