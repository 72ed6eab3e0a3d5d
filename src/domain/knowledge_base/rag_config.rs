//! Typed retrieval configuration for a knowledge base
//!
//! The stored form is a JSON object keyed by provider name:
//!
//! ```json
//! {
//!   "vector_db": {"collection": "docs", "embedding": {"kind": "hashing", "dimensions": 256}},
//!   "graph_db": {"uri": "memory://graph", "chunk_size": 800},
//!   "legra": {"vector_weight": 0.7}
//! }
//! ```
//!
//! Unknown provider names are kept as [`ProviderConfig::Unknown`] and rejected
//! settings as [`ProviderConfig::Invalid`], so the service layer can log and
//! skip them without failing the rest of the knowledge base or its batch.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::validation::{validate_chunking, validate_vector_weight};
use crate::domain::DomainError;

pub const VECTOR_DB: &str = "vector_db";
pub const GRAPH_DB: &str = "graph_db";
pub const LEGRA: &str = "legra";
const LIGHT_RAG_ALIAS: &str = "light_rag";

const DEFAULT_CHUNK_SIZE: usize = 1000;
const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Embedding backend used by vector-capable providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbeddingSettings {
    /// Local feature-hashing embedder, no network
    Hashing {
        #[serde(default = "default_hashing_dimensions")]
        dimensions: usize,
    },
    /// OpenAI-compatible `/v1/embeddings` endpoint
    #[serde(rename = "openai")]
    OpenAi {
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default = "default_openai_base_url")]
        base_url: String,
        /// Environment variable holding the API key
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
        #[serde(default = "default_openai_dimensions")]
        dimensions: usize,
    },
}

fn default_hashing_dimensions() -> usize {
    384
}

fn default_openai_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_dimensions() -> usize {
    1536
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self::Hashing {
            dimensions: default_hashing_dimensions(),
        }
    }
}

impl EmbeddingSettings {
    pub fn dimensions(&self) -> usize {
        match self {
            Self::Hashing { dimensions } | Self::OpenAi { dimensions, .. } => *dimensions,
        }
    }
}

/// Settings for the vector-similarity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbSettings {
    /// Collection shared by every knowledge base that names it
    pub collection: String,
    pub embedding: EmbeddingSettings,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for VectorDbSettings {
    fn default() -> Self {
        Self {
            collection: "default".to_string(),
            embedding: EmbeddingSettings::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Settings for the keyword-graph provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphDbSettings {
    /// Graph identity; knowledge bases with the same uri share one graph
    pub uri: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for GraphDbSettings {
    fn default() -> Self {
        Self {
            uri: "memory://graph".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Settings for the hybrid graph + vector provider with a finalize step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegraSettings {
    pub namespace: String,
    pub embedding: EmbeddingSettings,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Share of the vector score in the hybrid score; the rest is keyword overlap
    pub vector_weight: f32,
}

impl Default for LegraSettings {
    fn default() -> Self {
        Self {
            namespace: "legra".to_string(),
            embedding: EmbeddingSettings::default(),
            chunk_size: 512,
            chunk_overlap: 50,
            vector_weight: 0.6,
        }
    }
}

/// One configured retrieval provider
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    VectorDb(VectorDbSettings),
    GraphDb(GraphDbSettings),
    Legra(LegraSettings),
    /// Provider name this build does not know; skipped with a warning
    Unknown {
        name: String,
        settings: serde_json::Value,
    },
    /// Entry whose settings were rejected, or a second entry for a provider
    /// already configured under another name
    Invalid {
        name: String,
        settings: serde_json::Value,
        reason: String,
    },
}

impl ProviderConfig {
    /// Name used as the key of per-provider result maps
    pub fn name(&self) -> &str {
        match self {
            Self::VectorDb(_) => VECTOR_DB,
            Self::GraphDb(_) => GRAPH_DB,
            Self::Legra(_) => LEGRA,
            Self::Unknown { name, .. } | Self::Invalid { name, .. } => name,
        }
    }

    /// Whether a provider can be built from this entry
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown { .. } | Self::Invalid { .. })
    }

    fn parse(name: &str, settings: &serde_json::Value) -> Self {
        let settings = match settings {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other.clone(),
        };

        let parsed = match name {
            VECTOR_DB => parse_settings(name, &settings).map(Self::VectorDb),
            GRAPH_DB => parse_settings(name, &settings).map(Self::GraphDb),
            LEGRA | LIGHT_RAG_ALIAS => parse_settings(name, &settings).map(Self::Legra),
            other => {
                return Self::Unknown {
                    name: other.to_string(),
                    settings,
                };
            }
        };

        match parsed.and_then(|config| config.validate().map(|_| config)) {
            Ok(config) => config,
            Err(e) => Self::Invalid {
                name: name.to_string(),
                settings,
                reason: e.to_string(),
            },
        }
    }

    fn validate(&self) -> Result<(), DomainError> {
        let (chunk_size, chunk_overlap) = match self {
            Self::VectorDb(s) => (s.chunk_size, s.chunk_overlap),
            Self::GraphDb(s) => (s.chunk_size, s.chunk_overlap),
            Self::Legra(s) => {
                validate_vector_weight(s.vector_weight)
                    .map_err(|e| DomainError::configuration(format!("{}: {}", LEGRA, e)))?;
                (s.chunk_size, s.chunk_overlap)
            }
            Self::Unknown { .. } | Self::Invalid { .. } => return Ok(()),
        };

        validate_chunking(chunk_size, chunk_overlap)
            .map_err(|e| DomainError::configuration(format!("{}: {}", self.name(), e)))
    }

    fn settings_value(&self) -> serde_json::Value {
        let value = match self {
            Self::VectorDb(s) => serde_json::to_value(s),
            Self::GraphDb(s) => serde_json::to_value(s),
            Self::Legra(s) => serde_json::to_value(s),
            Self::Unknown { settings, .. } | Self::Invalid { settings, .. } => {
                return settings.clone();
            }
        };

        value.unwrap_or(serde_json::Value::Null)
    }
}

fn parse_settings<T: serde::de::DeserializeOwned>(
    name: &str,
    settings: &serde_json::Value,
) -> Result<T, DomainError> {
    T::deserialize(settings).map_err(|e| {
        DomainError::configuration(format!("Invalid settings for provider '{}': {}", name, e))
    })
}

fn is_disabled(settings: &serde_json::Value) -> bool {
    match settings {
        serde_json::Value::Bool(enabled) => !enabled,
        serde_json::Value::Object(map) => {
            matches!(map.get("enabled"), Some(serde_json::Value::Bool(false)))
        }
        _ => false,
    }
}

/// The set of providers enabled for one knowledge base
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RagConfig {
    providers: Vec<ProviderConfig>,
}

impl RagConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.providers.push(provider);
        self
    }

    /// Parse the stored JSON form. `null` yields an empty config.
    ///
    /// Only a non-object fails; bad provider entries become
    /// [`ProviderConfig::Invalid`].
    pub fn from_value(value: &serde_json::Value) -> Result<Self, DomainError> {
        let map = match value {
            serde_json::Value::Null => return Ok(Self::default()),
            serde_json::Value::Object(map) => map,
            other => {
                return Err(DomainError::configuration(format!(
                    "rag_config must be an object keyed by provider name, got {}",
                    other
                )))
            }
        };

        let mut providers = Vec::with_capacity(map.len());
        let mut seen: HashSet<String> = HashSet::new();
        for (name, settings) in map {
            if is_disabled(settings) {
                continue;
            }
            let config = match settings {
                serde_json::Value::Bool(true) => {
                    ProviderConfig::parse(name, &serde_json::Value::Null)
                }
                other => ProviderConfig::parse(name, other),
            };

            // legra and light_rag name the same provider
            if config.is_known() && !seen.insert(config.name().to_string()) {
                providers.push(ProviderConfig::Invalid {
                    name: name.clone(),
                    settings: settings.clone(),
                    reason: format!("duplicates provider '{}'", config.name()),
                });
                continue;
            }
            providers.push(config);
        }

        Ok(Self { providers })
    }

    pub fn providers(&self) -> &[ProviderConfig] {
        &self.providers
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Serialize for RagConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.providers.len()))?;
        for provider in &self.providers {
            map.serialize_entry(provider.name(), &provider.settings_value())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RagConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::knowledge_base::KnowledgeBase;
    use serde_json::json;

    #[test]
    fn test_parse_known_providers_with_defaults() {
        let config = RagConfig::from_value(&json!({
            "vector_db": {},
            "graph_db": null,
            "light_rag": {"vector_weight": 0.8}
        }))
        .unwrap();

        assert_eq!(config.providers().len(), 3);
        let names: Vec<&str> = config.providers().iter().map(|p| p.name()).collect();
        assert!(names.contains(&VECTOR_DB));
        assert!(names.contains(&GRAPH_DB));
        assert!(names.contains(&LEGRA));

        let legra = config
            .providers()
            .iter()
            .find_map(|p| match p {
                ProviderConfig::Legra(s) => Some(s.clone()),
                _ => None,
            })
            .unwrap();
        assert!((legra.vector_weight - 0.8).abs() < f32::EPSILON);
        assert_eq!(legra.chunk_size, 512);
    }

    #[test]
    fn test_unknown_provider_is_kept() {
        let config = RagConfig::from_value(&json!({"pinecone": {"index": "x"}})).unwrap();

        assert_eq!(config.providers().len(), 1);
        assert!(matches!(
            &config.providers()[0],
            ProviderConfig::Unknown { name, .. } if name == "pinecone"
        ));
    }

    #[test]
    fn test_disabled_providers_are_dropped() {
        let config = RagConfig::from_value(&json!({
            "vector_db": false,
            "graph_db": {"enabled": false},
            "legra": true
        }))
        .unwrap();

        assert_eq!(config.providers().len(), 1);
        assert_eq!(config.providers()[0].name(), LEGRA);
    }

    #[test]
    fn test_embedding_settings() {
        let config = RagConfig::from_value(&json!({
            "vector_db": {
                "collection": "docs",
                "embedding": {"kind": "openai", "model": "text-embedding-3-large", "dimensions": 3072}
            }
        }))
        .unwrap();

        match &config.providers()[0] {
            ProviderConfig::VectorDb(s) => {
                assert_eq!(s.collection, "docs");
                assert_eq!(s.embedding.dimensions(), 3072);
                assert!(matches!(
                    &s.embedding,
                    EmbeddingSettings::OpenAi { api_key_env, .. } if api_key_env == "OPENAI_API_KEY"
                ));
            }
            other => panic!("unexpected provider {:?}", other),
        }
    }

    #[test]
    fn test_rejected_settings_are_kept_as_invalid() {
        let config = RagConfig::from_value(&json!({
            "graph_db": {"chunk_size": 100, "chunk_overlap": 100},
            "legra": {"vector_weight": 1.5},
            "vector_db": {"chunk_size": "large"}
        }))
        .unwrap();

        assert_eq!(config.providers().len(), 3);
        assert!(config.providers().iter().all(|p| !p.is_known()));
        assert!(config.providers().iter().all(|p| matches!(
            p,
            ProviderConfig::Invalid { reason, .. } if !reason.is_empty()
        )));
    }

    #[test]
    fn test_misconfigured_knowledge_base_does_not_fail_batch() {
        let batch: Vec<KnowledgeBase> = serde_json::from_value(json!([
            {"id": "good", "type": "text", "content": "alpha", "rag_config": {"graph_db": {}}},
            {
                "id": "bad",
                "type": "text",
                "content": "beta",
                "rag_config": {"graph_db": {"chunk_size": 100, "chunk_overlap": 100}}
            }
        ]))
        .unwrap();

        assert_eq!(batch.len(), 2);
        assert!(batch[0].rag_config().providers()[0].is_known());
        assert!(!batch[1].rag_config().providers()[0].is_known());
    }

    #[test]
    fn test_alias_of_configured_provider_is_invalid() {
        let config = RagConfig::from_value(&json!({
            "legra": {},
            "light_rag": {"vector_weight": 0.9}
        }))
        .unwrap();

        let known: Vec<&str> = config
            .providers()
            .iter()
            .filter(|p| p.is_known())
            .map(|p| p.name())
            .collect();
        assert_eq!(known, vec![LEGRA]);
        assert!(matches!(
            &config.providers()[1],
            ProviderConfig::Invalid { name, reason, .. }
                if name == "light_rag" && reason.contains(LEGRA)
        ));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(RagConfig::from_value(&json!(["vector_db"])).is_err());
        assert!(RagConfig::from_value(&serde_json::Value::Null)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_serialize_keyed_by_name() {
        let config = RagConfig::new().with_provider(ProviderConfig::GraphDb(GraphDbSettings::default()));
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["graph_db"]["uri"], "memory://graph");
        assert_eq!(value["graph_db"]["chunk_size"], 1000);
    }
}
