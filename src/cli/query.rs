//! Query command - load knowledge items, then search across them

use clap::Args;
use tracing::info;

use super::{
    build_registries, distinct_knowledge_bases, finalize_all, init, parse_tenant, read_items,
    ItemsArgs,
};
use crate::domain::knowledge_base::LoadAction;

/// Arguments for the query command
#[derive(Args, Clone, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub items: ItemsArgs,

    /// Search text
    #[arg(long, short)]
    pub query: String,

    /// Maximum number of results (overrides config)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Print text blocks instead of JSON
    #[arg(long)]
    pub formatted: bool,
}

/// Run the query command
pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    let config = init()?;

    let tenant = parse_tenant(&args.items.tenant)?;
    let items = read_items(&args.items.items).await?;
    let registries = build_registries(&config)?;
    let registry = registries.registry(&tenant).await;

    registry
        .load_knowledge_items(&items, LoadAction::Create)
        .await;
    if args.items.finalize {
        finalize_all(&registry, &items).await;
    }

    let kbs = distinct_knowledge_bases(&items);
    let limit = args.limit.unwrap_or(config.retrieval.default_search_limit);

    if args.formatted {
        println!("{}", registry.search_formatted(&kbs, &args.query, limit).await);
    } else {
        let results = registry.search(&kbs, &args.query, limit).await;
        info!(tenant = %tenant, results = results.len(), "Query complete");
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    registries.cleanup_all().await;
    Ok(())
}
