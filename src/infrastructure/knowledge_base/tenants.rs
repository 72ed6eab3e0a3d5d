//! Registries keyed by tenant

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::factory::ProviderFactory;
use super::registry::{RegistrySettings, ServiceRegistry};
use crate::domain::ingestion::ContentLoader;
use crate::domain::knowledge_base::TenantId;

/// One [`ServiceRegistry`] per tenant, created on first use. All of them
/// share the provider factory and content loader.
pub struct TenantRegistries {
    factory: Arc<dyn ProviderFactory>,
    loader: Arc<dyn ContentLoader>,
    settings: RegistrySettings,
    registries: RwLock<HashMap<TenantId, Arc<ServiceRegistry>>>,
}

impl std::fmt::Debug for TenantRegistries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantRegistries")
            .field("settings", &self.settings)
            .finish()
    }
}

impl TenantRegistries {
    pub fn new(
        factory: Arc<dyn ProviderFactory>,
        loader: Arc<dyn ContentLoader>,
        settings: RegistrySettings,
    ) -> Self {
        Self {
            factory,
            loader,
            settings,
            registries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn registry(&self, tenant: &TenantId) -> Arc<ServiceRegistry> {
        if let Some(registry) = self.registries.read().await.get(tenant) {
            return registry.clone();
        }

        self.registries
            .write()
            .await
            .entry(tenant.clone())
            .or_insert_with(|| {
                info!(tenant = %tenant, "Creating service registry");
                Arc::new(ServiceRegistry::new(
                    tenant.clone(),
                    self.factory.clone(),
                    self.loader.clone(),
                    self.settings.clone(),
                ))
            })
            .clone()
    }

    pub async fn tenants(&self) -> Vec<TenantId> {
        let mut tenants: Vec<TenantId> = self.registries.read().await.keys().cloned().collect();
        tenants.sort();
        tenants
    }

    /// Drop every cached service of every tenant
    pub async fn cleanup_all(&self) {
        let registries: Vec<Arc<ServiceRegistry>> =
            self.registries.read().await.values().cloned().collect();
        for registry in registries {
            registry.cleanup_all().await;
        }
    }
}
