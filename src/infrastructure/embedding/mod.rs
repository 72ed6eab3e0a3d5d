//! Embedding provider implementations

mod hashing;
pub mod http_client;
mod openai;

use std::sync::Arc;

pub use hashing::HashingEmbedder;
pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::OpenAiEmbeddingProvider;

use crate::domain::knowledge_base::EmbeddingSettings;
use crate::domain::{DomainError, EmbeddingProvider};

/// Build the embedder described by `settings`.
///
/// OpenAI keys are read from the configured environment variable; a missing
/// key is a configuration error.
pub fn build_embedder(
    settings: &EmbeddingSettings,
) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
    match settings {
        EmbeddingSettings::Hashing { dimensions } => {
            Ok(Arc::new(HashingEmbedder::new(*dimensions)?))
        }
        EmbeddingSettings::OpenAi {
            model,
            base_url,
            api_key_env,
            dimensions,
        } => {
            let api_key = std::env::var(api_key_env).map_err(|_| {
                DomainError::configuration(format!(
                    "Environment variable '{}' with the embedding API key is not set",
                    api_key_env
                ))
            })?;

            Ok(Arc::new(OpenAiEmbeddingProvider::new(
                HttpClient::new(),
                api_key,
                base_url.clone(),
                model.clone(),
                *dimensions,
            )))
        }
    }
}
