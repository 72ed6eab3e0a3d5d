//! Per-tenant registry of retrieval services
//!
//! Services are created on first use and cached by knowledge base id. At most
//! one initialization attempt per knowledge base is in flight at a time;
//! callers arriving during an attempt share its outcome. A cached service
//! whose providers dropped below the initialization policy is evicted and
//! rebuilt on the next lookup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::factory::{ProviderFactory, ProviderScope};
use super::service::RetrievalService;
use crate::domain::ingestion::ContentLoader;
use crate::domain::knowledge_base::{
    format_results, merge_results, plan_content_units, ContentSource, DocumentRecord,
    FormatOptions, InitializationPolicy, KnowledgeBase, KnowledgeBaseId, LoadAction,
    LoadItemResult, ProviderResults, SearchResult, TenantId, LOCAL_FILE_STORAGE,
};
use crate::domain::DomainError;

/// Registry behavior taken from configuration
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub initialization_policy: InitializationPolicy,
    /// Where stored files live; anything but `local` loads them by URL
    pub file_storage_provider: String,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            initialization_policy: InitializationPolicy::default(),
            file_storage_provider: LOCAL_FILE_STORAGE.to_string(),
        }
    }
}

/// Snapshot of the cached services
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total_services: usize,
    pub initialized_services: usize,
    pub service_ids: Vec<String>,
}

/// Cache slot of one knowledge base. `attempts` counts finished
/// initialization attempts so waiters can tell one completed while they queued.
#[derive(Debug, Default)]
struct ServiceCell {
    slot: Mutex<Option<Arc<RetrievalService>>>,
    attempts: AtomicU64,
}

pub struct ServiceRegistry {
    tenant: TenantId,
    factory: Arc<dyn ProviderFactory>,
    loader: Arc<dyn ContentLoader>,
    settings: RegistrySettings,
    services: RwLock<HashMap<KnowledgeBaseId, Arc<ServiceCell>>>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("tenant", &self.tenant)
            .field("settings", &self.settings)
            .finish()
    }
}

impl ServiceRegistry {
    pub fn new(
        tenant: TenantId,
        factory: Arc<dyn ProviderFactory>,
        loader: Arc<dyn ContentLoader>,
        settings: RegistrySettings,
    ) -> Self {
        Self {
            tenant,
            factory,
            loader,
            settings,
            services: RwLock::new(HashMap::new()),
        }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    async fn cell(&self, kb_id: &KnowledgeBaseId) -> Arc<ServiceCell> {
        if let Some(cell) = self.services.read().await.get(kb_id) {
            return cell.clone();
        }

        self.services
            .write()
            .await
            .entry(kb_id.clone())
            .or_default()
            .clone()
    }

    async fn is_registered(&self, kb_id: &KnowledgeBaseId, cell: &Arc<ServiceCell>) -> bool {
        self.services
            .read()
            .await
            .get(kb_id)
            .is_some_and(|current| Arc::ptr_eq(current, cell))
    }

    /// Initialized service for `kb`, created on first use.
    ///
    /// `None` when no provider could be built or the service failed to
    /// initialize. Concurrent callers for the same knowledge base trigger a
    /// single attempt and all see its outcome.
    pub async fn get_service(&self, kb: &KnowledgeBase) -> Option<Arc<RetrievalService>> {
        let kb_id = kb.id();

        loop {
            let cell = self.cell(kb_id).await;

            if let Ok(slot) = cell.slot.try_lock() {
                if let Some(service) = slot.as_ref().filter(|s| s.is_initialized()) {
                    return Some(service.clone());
                }
            }

            let seen = cell.attempts.load(Ordering::SeqCst);
            let mut slot = cell.slot.lock().await;

            if cell.attempts.load(Ordering::SeqCst) != seen {
                // an attempt finished while we waited: share its outcome
                match slot.as_ref() {
                    Some(service) if service.is_initialized() => return Some(service.clone()),
                    None => return None,
                    Some(_) => {}
                }
            }

            if let Some(service) = slot.as_ref() {
                if service.is_initialized() {
                    return Some(service.clone());
                }
                warn!(tenant = %self.tenant, kb_id = %kb_id, "Evicting stale retrieval service");
                *slot = None;
            }

            // removed by cleanup while we waited; start over with a fresh cell
            if !self.is_registered(kb_id, &cell).await {
                continue;
            }

            let service = self.build_service(kb).await;
            *slot = service.clone();
            cell.attempts.fetch_add(1, Ordering::SeqCst);

            if service.is_none() {
                let mut services = self.services.write().await;
                if services
                    .get(kb_id)
                    .is_some_and(|current| Arc::ptr_eq(current, &cell))
                {
                    services.remove(kb_id);
                }
            }

            return service;
        }
    }

    async fn build_service(&self, kb: &KnowledgeBase) -> Option<Arc<RetrievalService>> {
        let scope = ProviderScope::new(self.tenant.clone(), kb.id().clone());
        let mut service = RetrievalService::from_config(
            &scope,
            kb.rag_config(),
            self.factory.as_ref(),
            self.settings.initialization_policy,
        )?;

        if !service.initialize().await {
            return None;
        }

        info!(
            tenant = %self.tenant,
            kb_id = %kb.id(),
            providers = ?service.provider_names(),
            "Registered retrieval service"
        );
        Some(Arc::new(service))
    }

    /// Drop the cached service of `kb_id`; returns whether one was cached
    pub async fn cleanup_service(&self, kb_id: &KnowledgeBaseId) -> bool {
        let removed = self.services.write().await.remove(kb_id).is_some();
        if removed {
            info!(tenant = %self.tenant, kb_id = %kb_id, "Removed retrieval service");
        }
        removed
    }

    pub async fn cleanup_all(&self) {
        let mut services = self.services.write().await;
        let count = services.len();
        services.clear();
        info!(tenant = %self.tenant, count, "Removed all retrieval services");
    }

    /// Services currently cached. Entries with an attempt in flight are not counted.
    pub async fn get_stats(&self) -> RegistryStats {
        let services = self.services.read().await;

        let mut cached: Vec<(String, bool)> = services
            .iter()
            .filter_map(|(kb_id, cell)| {
                let slot = cell.slot.try_lock().ok()?;
                let ready = slot.as_ref()?.is_initialized();
                Some((kb_id.to_string(), ready))
            })
            .collect();
        cached.sort();

        RegistryStats {
            total_services: cached.len(),
            initialized_services: cached.iter().filter(|(_, ready)| *ready).count(),
            service_ids: cached.into_iter().map(|(id, _)| id).collect(),
        }
    }

    pub async fn add_document(
        &self,
        kb: &KnowledgeBase,
        document: &DocumentRecord,
        finalize: bool,
    ) -> ProviderResults {
        match self.get_service(kb).await {
            Some(service) => service.add_document(document, finalize).await,
            None => ProviderResults::new(),
        }
    }

    pub async fn delete_document(&self, kb: &KnowledgeBase, doc_id: &str) -> ProviderResults {
        match self.get_service(kb).await {
            Some(service) => service.delete_document(doc_id).await,
            None => ProviderResults::new(),
        }
    }

    pub async fn get_document_ids(&self, kb: &KnowledgeBase) -> Vec<String> {
        match self.get_service(kb).await {
            Some(service) => service.get_document_ids().await,
            None => vec![],
        }
    }

    pub async fn finalize_legra(&self, kb: &KnowledgeBase) -> bool {
        match self.get_service(kb).await {
            Some(service) => service.finalize_legra().await,
            None => false,
        }
    }

    /// Search several knowledge bases concurrently and merge by score.
    ///
    /// A knowledge base without a usable service contributes nothing.
    pub async fn search(
        &self,
        kbs: &[KnowledgeBase],
        query: &str,
        limit: usize,
    ) -> Vec<SearchResult> {
        let batches = join_all(kbs.iter().map(|kb| async move {
            match self.get_service(kb).await {
                Some(service) => service.search(query, limit).await,
                None => {
                    warn!(tenant = %self.tenant, kb_id = %kb.id(), "Knowledge base unavailable for search");
                    vec![]
                }
            }
        }))
        .await;

        let merged = merge_results(batches, limit);
        debug!(
            tenant = %self.tenant,
            knowledge_bases = kbs.len(),
            results = merged.len(),
            "Merged search results"
        );
        merged
    }

    /// [`search`](Self::search) rendered as compact text blocks
    pub async fn search_formatted(
        &self,
        kbs: &[KnowledgeBase],
        query: &str,
        limit: usize,
    ) -> String {
        let results = self.search(kbs, query, limit).await;
        format_results(&results, FormatOptions::compact())
    }

    /// Ingest knowledge items, grouped by knowledge base in first-seen order.
    ///
    /// With [`LoadAction::Update`] every existing document of a knowledge base
    /// is deleted before its items are added. One result is returned per
    /// planned document, including ones that could not be stored.
    pub async fn load_knowledge_items(
        &self,
        items: &[KnowledgeBase],
        action: LoadAction,
    ) -> Vec<LoadItemResult> {
        let mut groups: Vec<(&KnowledgeBaseId, Vec<&KnowledgeBase>)> = Vec::new();
        for item in items {
            match groups.iter_mut().find(|(id, _)| *id == item.id()) {
                Some((_, group)) => group.push(item),
                None => groups.push((item.id(), vec![item])),
            }
        }

        let mut results = Vec::new();

        for (kb_id, group) in groups {
            let Some(service) = self.get_service(group[0]).await else {
                warn!(tenant = %self.tenant, kb_id = %kb_id, "Knowledge base unavailable for loading");
                let reason = format!("Retrieval service unavailable for knowledge base '{}'", kb_id);
                for item in &group {
                    for unit in plan_content_units(item, &self.settings.file_storage_provider) {
                        results.push(LoadItemResult::failed(unit.doc_id, reason.clone()));
                    }
                }
                continue;
            };

            if action == LoadAction::Update {
                let existing = service.get_document_ids().await;
                join_all(existing.iter().map(|id| service.delete_document(id))).await;
                info!(
                    tenant = %self.tenant,
                    kb_id = %kb_id,
                    deleted = existing.len(),
                    "Cleared knowledge base for update"
                );
            }

            for item in group {
                for unit in plan_content_units(item, &self.settings.file_storage_provider) {
                    let content = match self.resolve(&unit.source).await {
                        Ok(content) => content,
                        Err(e) => {
                            warn!(doc_id = %unit.doc_id, error = %e, "Skipping unreadable content");
                            results.push(LoadItemResult::failed(unit.doc_id, e.to_string()));
                            continue;
                        }
                    };

                    let document = DocumentRecord::new(unit.doc_id.clone(), content)
                        .with_metadata("name", json!(item.name()))
                        .with_metadata("description", json!(item.description().unwrap_or_default()))
                        .with_metadata("id", json!(unit.doc_id))
                        .with_metadata("kb_id", json!(kb_id.as_str()));

                    let stored = service.add_document(&document, item.finalize()).await;
                    results.push(LoadItemResult::success(unit.doc_id, stored));
                }
            }
        }

        info!(
            tenant = %self.tenant,
            action = %action,
            documents = results.len(),
            stored = results.iter().filter(|r| r.is_stored()).count(),
            "Loaded knowledge items"
        );
        results
    }

    async fn resolve(&self, source: &ContentSource) -> Result<String, DomainError> {
        match source {
            ContentSource::Inline(text) => Ok(text.clone()),
            ContentSource::File(locator) => self.loader.load_file(locator).await,
            ContentSource::Url(url) => self.loader.load_url(url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingestion::MockContentLoader;
    use crate::domain::knowledge_base::{
        CallLog, DocumentProvider, KnowledgeBaseType, KnowledgeFile, MockDocumentProvider,
        ProviderConfig, RagConfig,
    };
    use crate::infrastructure::knowledge_base::factory::mock::MockProviderFactory;
    use crate::infrastructure::knowledge_base::DefaultProviderFactory;
    use std::time::Duration;

    fn config(names: &[&str]) -> RagConfig {
        names.iter().fold(RagConfig::new(), |config, name| {
            config.with_provider(ProviderConfig::Unknown {
                name: name.to_string(),
                settings: json!({}),
            })
        })
    }

    fn text_kb(id: &str, providers: &[&str], content: &str) -> KnowledgeBase {
        KnowledgeBase::new(KnowledgeBaseId::new(id).unwrap(), KnowledgeBaseType::Text, config(providers))
            .with_name(format!("{} name", id))
            .with_content(content)
    }

    fn registry(factory: MockProviderFactory) -> ServiceRegistry {
        registry_with_loader(factory, MockContentLoader::new())
    }

    fn registry_with_loader(factory: MockProviderFactory, loader: MockContentLoader) -> ServiceRegistry {
        ServiceRegistry::new(
            TenantId::default(),
            Arc::new(factory),
            Arc::new(loader),
            RegistrySettings::default(),
        )
    }

    #[tokio::test]
    async fn test_service_is_cached() {
        let provider = Arc::new(MockDocumentProvider::new("p"));
        let registry = registry(MockProviderFactory::new().with_provider(provider.clone()));
        let kb = text_kb("a", &["p"], "");

        let first = registry.get_service(&kb).await.unwrap();
        let second = registry.get_service(&kb).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.initialize_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_initialization() {
        let provider = Arc::new(
            MockDocumentProvider::new("p").with_initialize_delay(Duration::from_millis(50)),
        );
        let registry = Arc::new(registry(MockProviderFactory::new().with_provider(provider.clone())));
        let kb = text_kb("a", &["p"], "");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let kb = kb.clone();
                tokio::spawn(async move { registry.get_service(&kb).await })
            })
            .collect();

        let mut services = Vec::new();
        for handle in handles {
            services.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(provider.initialize_count(), 1);
        assert!(services.iter().all(|s| Arc::ptr_eq(s, &services[0])));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_failed_initialization() {
        let provider = Arc::new(
            MockDocumentProvider::new("p")
                .with_initialize_delay(Duration::from_millis(50))
                .failing_initialize(),
        );
        let registry = Arc::new(registry(MockProviderFactory::new().with_provider(provider.clone())));
        let kb = text_kb("a", &["p"], "");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let kb = kb.clone();
                tokio::spawn(async move { registry.get_service(&kb).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_none());
        }
        assert_eq!(provider.initialize_count(), 1);
        assert_eq!(registry.get_stats().await.total_services, 0);
    }

    #[tokio::test]
    async fn test_failed_initialization_is_retried_later() {
        let provider = Arc::new(MockDocumentProvider::new("p").failing_initialize());
        let registry = registry(MockProviderFactory::new().with_provider(provider.clone()));
        let kb = text_kb("a", &["p"], "");

        assert!(registry.get_service(&kb).await.is_none());

        provider.set_failing_initialize(false);

        assert!(registry.get_service(&kb).await.is_some());
        assert_eq!(provider.initialize_count(), 2);
    }

    #[tokio::test]
    async fn test_stale_service_is_rebuilt() {
        let provider = Arc::new(MockDocumentProvider::new("p"));
        let factory = MockProviderFactory::new().with_provider(provider.clone());
        let registry = registry(factory);
        let kb = text_kb("a", &["p"], "");

        let first = registry.get_service(&kb).await.unwrap();
        provider.disconnect();
        let second = registry.get_service(&kb).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.is_initialized());
        assert_eq!(provider.initialize_count(), 2);
    }

    #[tokio::test]
    async fn test_no_usable_provider_yields_none() {
        let registry = registry(MockProviderFactory::new());
        let kb = text_kb("a", &["missing"], "");

        assert!(registry.get_service(&kb).await.is_none());
        assert!(registry.add_document(&kb, &DocumentRecord::new("KB:a#content", "x"), false).await.is_empty());
        assert!(registry.get_document_ids(&kb).await.is_empty());
        assert!(!registry.finalize_legra(&kb).await);
    }

    #[tokio::test]
    async fn test_cleanup_and_stats() {
        let provider = Arc::new(MockDocumentProvider::new("p"));
        let registry = registry(MockProviderFactory::new().with_provider(provider));
        let a = text_kb("a", &["p"], "");
        let b = text_kb("b", &["p"], "");
        registry.get_service(&a).await.unwrap();
        registry.get_service(&b).await.unwrap();

        let stats = registry.get_stats().await;
        assert_eq!(stats.total_services, 2);
        assert_eq!(stats.initialized_services, 2);
        assert_eq!(stats.service_ids, vec!["a", "b"]);

        assert!(registry.cleanup_service(a.id()).await);
        assert!(!registry.cleanup_service(a.id()).await);
        assert_eq!(registry.get_stats().await.service_ids, vec!["b"]);

        registry.cleanup_all().await;
        assert_eq!(registry.get_stats().await.total_services, 0);
    }

    #[tokio::test]
    async fn test_search_merges_across_knowledge_bases() {
        let p1 = Arc::new(MockDocumentProvider::new("p1").with_search_results(vec![
            SearchResult::new("KB:a#content", "a", 0.9),
            SearchResult::new("KB:a#file_0:x", "a2", 0.5),
        ]));
        let p2 = Arc::new(
            MockDocumentProvider::new("p2")
                .with_search_results(vec![SearchResult::new("KB:b#content", "b", 0.7)]),
        );
        let registry = registry(MockProviderFactory::new().with_provider(p1).with_provider(p2));
        let kbs = vec![
            text_kb("a", &["p1"], ""),
            text_kb("b", &["p2"], ""),
            text_kb("c", &["missing"], ""),
        ];

        let results = registry.search(&kbs, "q", 3).await;

        let scores: Vec<f32> = results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.9, 0.7, 0.5]);

        let top = registry.search(&kbs, "q", 1).await;
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, "KB:a#content");
    }

    #[tokio::test]
    async fn test_search_formatted() {
        let p = Arc::new(
            MockDocumentProvider::new("p")
                .with_search_results(vec![SearchResult::new("KB:a#content", " refunds ", 0.5)]),
        );
        let registry = registry(MockProviderFactory::new().with_provider(p));
        let kbs = vec![text_kb("a", &["p"], "")];

        let text = registry.search_formatted(&kbs, "q", 5).await;
        assert_eq!(text, "[1] KB:a#content (score: 0.500)\nrefunds");

        let empty = registry.search_formatted(&[], "q", 5).await;
        assert_eq!(empty, "No relevant results found.");
    }

    #[tokio::test]
    async fn test_load_creates_documents_with_metadata() {
        let provider = Arc::new(MockDocumentProvider::new("p"));
        let registry = registry(MockProviderFactory::new().with_provider(provider.clone()));
        let kb = text_kb("a", &["p"], "Refunds within 30 days").with_description("Policies");

        let results = registry.load_knowledge_items(&[kb], LoadAction::Create).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "KB:a#content");
        assert!(results[0].is_stored());
        assert_eq!(provider.document_ids(), vec!["KB:a#content"]);

        let found = provider.search("Refunds", 5, None).await.unwrap();
        assert_eq!(found[0].content, "Refunds within 30 days");
    }

    #[tokio::test]
    async fn test_update_deletes_existing_before_adding() {
        let log = CallLog::new();
        let provider = Arc::new(
            MockDocumentProvider::new("p")
                .with_log(log.clone())
                .with_documents(&["KB:a#content", "KB:a#file_0:x", "KB:a#file_1:y", "KB:b#content"]),
        );
        let registry = registry(MockProviderFactory::new().with_provider(provider.clone()));
        let items = vec![text_kb("a", &["p"], "first"), text_kb("a", &["p"], "second")];

        registry.load_knowledge_items(&items, LoadAction::Update).await;

        let events: Vec<String> = log
            .events()
            .into_iter()
            .filter(|e| e.starts_with("add:") || e.starts_with("delete:"))
            .collect();
        assert_eq!(log.count_prefix("delete:"), 3);
        assert_eq!(log.count_prefix("add:"), 2);
        assert!(events[..3].iter().all(|e| e.starts_with("delete:")));
        assert!(events[3..].iter().all(|e| e.starts_with("add:")));
        assert!(provider.document_ids().contains(&"KB:b#content".to_string()));
    }

    #[tokio::test]
    async fn test_create_does_not_delete() {
        let log = CallLog::new();
        let provider = Arc::new(
            MockDocumentProvider::new("p")
                .with_log(log.clone())
                .with_documents(&["KB:a#file_0:x"]),
        );
        let registry = registry(MockProviderFactory::new().with_provider(provider));

        registry
            .load_knowledge_items(&[text_kb("a", &["p"], "text")], LoadAction::Create)
            .await;

        assert_eq!(log.count_prefix("delete:"), 0);
    }

    #[tokio::test]
    async fn test_unavailable_kb_reports_every_document() {
        let provider = Arc::new(MockDocumentProvider::new("p"));
        let registry = registry(MockProviderFactory::new().with_provider(provider.clone()));
        let broken = KnowledgeBase::new(
            KnowledgeBaseId::new("broken").unwrap(),
            KnowledgeBaseType::File,
            config(&["missing"]),
        )
        .with_files(vec![KnowledgeFile::locator("a.txt"), KnowledgeFile::locator("b.txt")]);
        let ok = text_kb("ok", &["p"], "fine");

        let results = registry
            .load_knowledge_items(&[broken, ok], LoadAction::Create)
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "KB:broken#file_0:a.txt");
        assert!(!results[0].is_stored());
        assert!(results[0].error.is_some());
        assert_eq!(results[1].id, "KB:broken#file_1:b.txt");
        assert!(results[2].is_stored());
    }

    #[tokio::test]
    async fn test_misconfigured_kb_fails_alone_in_batch() {
        let items: Vec<KnowledgeBase> = serde_json::from_value(json!([
            {
                "id": "bad",
                "type": "text",
                "content": "refund policy for damaged goods",
                "rag_config": {"graph_db": {"chunk_size": 100, "chunk_overlap": 100}}
            },
            {
                "id": "good",
                "type": "text",
                "content": "refund policy for returns",
                "rag_config": {"graph_db": {}}
            }
        ]))
        .unwrap();
        let registry = ServiceRegistry::new(
            TenantId::default(),
            Arc::new(DefaultProviderFactory::new()),
            Arc::new(MockContentLoader::new()),
            RegistrySettings::default(),
        );

        let results = registry.load_knowledge_items(&items, LoadAction::Create).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "KB:bad#content");
        assert!(!results[0].is_stored());
        assert!(results[0].error.is_some());
        assert_eq!(results[1].id, "KB:good#content");
        assert!(results[1].is_stored());

        let found = registry.search(&items, "refund policy", 5).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "KB:good#content");
    }

    #[tokio::test]
    async fn test_files_are_loaded_through_loader() {
        let provider = Arc::new(MockDocumentProvider::new("p"));
        let loader = MockContentLoader::new().with_content("guide.pdf", "PDF text");
        let registry = registry_with_loader(
            MockProviderFactory::new().with_provider(provider.clone()),
            loader,
        );
        let kb = KnowledgeBase::new(
            KnowledgeBaseId::new("a").unwrap(),
            KnowledgeBaseType::File,
            config(&["p"]),
        )
        .with_files(vec![
            KnowledgeFile::locator("guide.pdf"),
            KnowledgeFile::locator("missing.pdf"),
        ]);

        let results = registry.load_knowledge_items(&[kb], LoadAction::Create).await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_stored());
        assert!(!results[1].is_stored());
        assert_eq!(provider.document_ids(), vec!["KB:a#file_0:guide.pdf"]);
    }

    #[tokio::test]
    async fn test_finalize_flag_is_forwarded() {
        let provider = Arc::new(MockDocumentProvider::new("p").with_finalize_support());
        let registry = registry(MockProviderFactory::new().with_provider(provider.clone()));
        let items = vec![
            text_kb("a", &["p"], "one"),
            text_kb("b", &["p"], "two").with_finalize(true),
        ];

        registry.load_knowledge_items(&items, LoadAction::Create).await;

        assert_eq!(provider.finalize_count(), 1);
    }
}
