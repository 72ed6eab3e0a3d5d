//! Ingest command - load knowledge items and report per-document results

use clap::Args;
use tracing::info;

use super::{build_registries, finalize_all, init, parse_tenant, read_items, ItemsArgs};
use crate::domain::knowledge_base::LoadAction;

/// Arguments for the ingest command
#[derive(Args, Clone, Debug)]
pub struct IngestArgs {
    #[command(flatten)]
    pub items: ItemsArgs,

    /// `update` replaces every existing document of each knowledge base;
    /// anything else adds
    #[arg(long, default_value = "create")]
    pub action: LoadAction,
}

/// Run the ingest command
pub async fn run(args: IngestArgs) -> anyhow::Result<()> {
    let config = init()?;

    let tenant = parse_tenant(&args.items.tenant)?;
    let items = read_items(&args.items.items).await?;
    let registries = build_registries(&config)?;
    let registry = registries.registry(&tenant).await;

    let results = registry.load_knowledge_items(&items, args.action).await;
    if args.items.finalize {
        finalize_all(&registry, &items).await;
    }

    let stored = results.iter().filter(|r| r.is_stored()).count();
    info!(
        tenant = %tenant,
        documents = results.len(),
        stored,
        "Ingest complete"
    );

    println!("{}", serde_json::to_string_pretty(&results)?);

    registries.cleanup_all().await;
    Ok(())
}
