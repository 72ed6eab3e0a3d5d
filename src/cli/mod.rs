//! CLI module for kbctl
//!
//! Provider stores live in process memory, so every command ingests the
//! knowledge items it is given before doing anything else:
//! - `ingest`: load items and print one result per document
//! - `query`: load items, then search them

pub mod ingest;
pub mod query;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::AppConfig;
use crate::domain::knowledge_base::{KnowledgeBase, KnowledgeBaseId, TenantId};
use crate::infrastructure::embedding::HttpClient;
use crate::infrastructure::ingestion::{DefaultContentLoader, FileTextExtractor};
use crate::infrastructure::knowledge_base::{
    DefaultProviderFactory, ServiceRegistry, TenantRegistries,
};
use crate::infrastructure::logging;

/// kbctl - knowledge base retrieval orchestration
#[derive(Parser)]
#[command(name = "kbctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load knowledge items into their retrieval providers
    Ingest(ingest::IngestArgs),

    /// Load knowledge items, then search them
    Query(query::QueryArgs),
}

/// Arguments shared by every command
#[derive(Args, Clone, Debug)]
pub struct ItemsArgs {
    /// JSON file holding an array of knowledge items
    #[arg(long)]
    pub items: PathBuf,

    /// Tenant the items belong to
    #[arg(long, default_value = "default")]
    pub tenant: String,

    /// Run the finalize step of two-phase providers after loading
    #[arg(long)]
    pub finalize: bool,
}

/// Load configuration and install logging
pub fn init() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);
    Ok(config)
}

/// Registries wired with the built-in providers and content loader
pub fn build_registries(config: &AppConfig) -> anyhow::Result<TenantRegistries> {
    let http = HttpClient::with_timeout(Duration::from_secs(
        config.retrieval.download_timeout_secs,
    ))?;
    let loader = DefaultContentLoader::new(Arc::new(http), Arc::new(FileTextExtractor::new()));

    Ok(TenantRegistries::new(
        Arc::new(DefaultProviderFactory::new()),
        Arc::new(loader),
        config.retrieval.registry_settings(),
    ))
}

pub async fn read_items(path: &Path) -> anyhow::Result<Vec<KnowledgeBase>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let items: Vec<KnowledgeBase> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid knowledge items in {}", path.display()))?;

    info!(path = %path.display(), items = items.len(), "Read knowledge items");
    Ok(items)
}

pub fn parse_tenant(tenant: &str) -> anyhow::Result<TenantId> {
    TenantId::new(tenant).with_context(|| format!("Invalid tenant '{}'", tenant))
}

/// One item per knowledge base, in first-seen order
pub fn distinct_knowledge_bases(items: &[KnowledgeBase]) -> Vec<KnowledgeBase> {
    let mut seen: Vec<&KnowledgeBaseId> = Vec::new();
    let mut distinct = Vec::new();

    for item in items {
        if !seen.contains(&item.id()) {
            seen.push(item.id());
            distinct.push(item.clone());
        }
    }

    distinct
}

/// Finalize every knowledge base of `items` that has a two-phase provider
pub async fn finalize_all(registry: &ServiceRegistry, items: &[KnowledgeBase]) {
    for kb in distinct_knowledge_bases(items) {
        let finalized = registry.finalize_legra(&kb).await;
        info!(kb_id = %kb.id(), finalized, "Finalize step");
    }
}
