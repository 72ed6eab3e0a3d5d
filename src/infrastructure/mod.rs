//! Infrastructure layer - providers, loaders and registries

pub mod embedding;
pub mod ingestion;
pub mod knowledge_base;
pub mod logging;
