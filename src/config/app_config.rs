use serde::Deserialize;

use crate::domain::knowledge_base::{InitializationPolicy, LOCAL_FILE_STORAGE};
use crate::infrastructure::knowledge_base::RegistrySettings;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Retrieval orchestration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub initialization_policy: InitializationPolicy,
    pub default_search_limit: usize,
    /// `local` reads stored files from disk; anything else downloads them
    pub file_storage_provider: String,
    pub download_timeout_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            initialization_policy: InitializationPolicy::default(),
            default_search_limit: 5,
            file_storage_provider: LOCAL_FILE_STORAGE.to_string(),
            download_timeout_secs: 30,
        }
    }
}

impl RetrievalConfig {
    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            initialization_policy: self.initialization_policy,
            file_storage_provider: self.file_storage_provider.clone(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
