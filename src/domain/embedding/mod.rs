//! Embedding provider domain traits

mod provider;

pub use provider::{cosine_similarity, EmbeddingProvider};

#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;
