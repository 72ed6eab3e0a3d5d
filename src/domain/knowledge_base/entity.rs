//! Knowledge base entity and related types

use serde::{Deserialize, Serialize};

use super::rag_config::RagConfig;
use super::validation::{validate_knowledge_base_id, KnowledgeBaseValidationError};

/// Knowledge base identifier - opaque string or UUID, never containing `#`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KnowledgeBaseId(String);

impl KnowledgeBaseId {
    /// Create a new KnowledgeBaseId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, KnowledgeBaseValidationError> {
        let id = id.into();
        validate_knowledge_base_id(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for KnowledgeBaseId {
    type Error = KnowledgeBaseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KnowledgeBaseId> for String {
    fn from(id: KnowledgeBaseId) -> Self {
        id.0
    }
}

impl std::fmt::Display for KnowledgeBaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tenant identifier; registries and shared stores are partitioned by it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Result<Self, KnowledgeBaseValidationError> {
        let id = id.into();
        validate_knowledge_base_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self("default".to_string())
    }
}

impl TryFrom<String> for TenantId {
    type Error = KnowledgeBaseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the content of a knowledge item comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeBaseType {
    /// Inline text content
    #[default]
    Text,
    /// One or more uploaded files (local paths or URLs)
    File,
    /// A web page fetched at ingestion time
    Url,
}

impl std::fmt::Display for KnowledgeBaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::File => write!(f, "file"),
            Self::Url => write!(f, "url"),
        }
    }
}

/// A file attached to a knowledge item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KnowledgeFile {
    /// Local path or http(s) URL
    Locator(String),
    /// Record written by the file manager: a local path and/or a storage URL
    Stored {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
        #[serde(default, alias = "urls", skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

impl KnowledgeFile {
    pub fn locator(locator: impl Into<String>) -> Self {
        Self::Locator(locator.into())
    }

    /// Best human-readable reference, used in log lines
    pub fn display_ref(&self) -> &str {
        match self {
            Self::Locator(l) => l,
            Self::Stored { file_path, url } => file_path
                .as_deref()
                .or(url.as_deref())
                .unwrap_or("unknown"),
        }
    }
}

/// Knowledge base entity as read from the metadata store.
///
/// Retrieval code only reads it; it never writes back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    id: KnowledgeBaseId,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, rename = "type")]
    kb_type: KnowledgeBaseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    files: Vec<KnowledgeFile>,
    #[serde(default)]
    rag_config: RagConfig,
    /// Ask two-phase providers to finalize right after this item is added
    #[serde(default, alias = "legra_finalize")]
    finalize: bool,
}

impl KnowledgeBase {
    /// Create a new knowledge base entity
    pub fn new(id: KnowledgeBaseId, kb_type: KnowledgeBaseType, rag_config: RagConfig) -> Self {
        Self {
            id,
            name: String::new(),
            description: None,
            kb_type,
            content: None,
            url: None,
            files: Vec::new(),
            rag_config,
            finalize: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_files(mut self, files: Vec<KnowledgeFile>) -> Self {
        self.files = files;
        self
    }

    pub fn with_finalize(mut self, finalize: bool) -> Self {
        self.finalize = finalize;
        self
    }

    // Getters
    pub fn id(&self) -> &KnowledgeBaseId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn kb_type(&self) -> KnowledgeBaseType {
        self.kb_type
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn files(&self) -> &[KnowledgeFile] {
        &self.files
    }

    pub fn rag_config(&self) -> &RagConfig {
        &self.rag_config
    }

    pub fn finalize(&self) -> bool {
        self.finalize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knowledge_base_id_validation() {
        assert!(KnowledgeBaseId::new("valid-id").is_ok());
        assert!(KnowledgeBaseId::new("").is_err());
        assert!(KnowledgeBaseId::new("has#hash").is_err());
    }

    #[test]
    fn test_deserialize_file_item() {
        let json = serde_json::json!({
            "id": "abc",
            "name": "Handbook",
            "type": "file",
            "files": ["/tmp/x.pdf", {"file_path": "/data/y.docx", "url": "https://cdn.example.com/y.docx"}],
            "rag_config": {"graph_db": {}},
            "legra_finalize": true
        });

        let kb: KnowledgeBase = serde_json::from_value(json).unwrap();

        assert_eq!(kb.id().as_str(), "abc");
        assert_eq!(kb.kb_type(), KnowledgeBaseType::File);
        assert_eq!(kb.files().len(), 2);
        assert_eq!(kb.files()[0], KnowledgeFile::locator("/tmp/x.pdf"));
        assert_eq!(kb.files()[1].display_ref(), "/data/y.docx");
        assert_eq!(kb.rag_config().providers().len(), 1);
        assert!(kb.finalize());
    }

    #[test]
    fn test_deserialize_rejects_bad_id() {
        let json = serde_json::json!({"id": "bad#id", "type": "text"});
        let result: Result<KnowledgeBase, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_type_defaults_to_text() {
        let json = serde_json::json!({"id": "kb-1", "content": "hello"});
        let kb: KnowledgeBase = serde_json::from_value(json).unwrap();

        assert_eq!(kb.kb_type(), KnowledgeBaseType::Text);
        assert_eq!(kb.content(), Some("hello"));
        assert!(kb.rag_config().is_empty());
    }
}
