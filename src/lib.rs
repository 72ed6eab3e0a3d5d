//! Knowledge-base retrieval orchestration
//!
//! Routes documents and queries of each knowledge base to its configured
//! retrieval providers:
//! - Vector similarity, keyword graph and hybrid providers
//! - Lazily created, self-healing retrieval services per tenant
//! - Content loading from inline text, files and web pages
//! - Score-ordered merging of results across knowledge bases

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::DomainError;
pub use infrastructure::knowledge_base::{
    RetrievalService, ServiceRegistry, TenantRegistries,
};
