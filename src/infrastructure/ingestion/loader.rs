//! Default content loader: local files, downloaded files and web pages

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::extractor::html_to_text;
use crate::domain::ingestion::{ContentLoader, TextExtractor};
use crate::domain::knowledge_base::is_remote;
use crate::domain::DomainError;
use crate::infrastructure::embedding::HttpClientTrait;

/// Extension of the last path segment of a URL, with the leading dot
fn url_suffix(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            Path::new(u.path())
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{}", e))
        })
        .unwrap_or_default()
}

/// Loads local files through a [`TextExtractor`]. Remote files are
/// downloaded to a temp file that keeps the URL's extension and is removed
/// once extracted.
#[derive(Debug, Clone)]
pub struct DefaultContentLoader {
    http: Arc<dyn HttpClientTrait>,
    extractor: Arc<dyn TextExtractor>,
}

impl DefaultContentLoader {
    pub fn new(http: Arc<dyn HttpClientTrait>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self { http, extractor }
    }

    async fn load_remote_file(&self, url: &str) -> Result<String, DomainError> {
        let bytes = self
            .http
            .get_bytes(url)
            .await
            .map_err(|e| DomainError::extraction(url, e.to_string()))?;

        let temp = tempfile::Builder::new()
            .prefix("kb-download-")
            .suffix(&url_suffix(url))
            .tempfile()
            .map_err(|e| DomainError::extraction(url, format!("Temp file: {}", e)))?;

        tokio::fs::write(temp.path(), &bytes)
            .await
            .map_err(|e| DomainError::extraction(url, format!("Temp file: {}", e)))?;

        debug!(url = %url, path = %temp.path().display(), bytes = bytes.len(), "Downloaded remote file");

        // temp is removed on drop, after extraction
        self.extractor.extract(temp.path()).await
    }
}

#[async_trait]
impl ContentLoader for DefaultContentLoader {
    async fn load_file(&self, locator: &str) -> Result<String, DomainError> {
        if is_remote(locator) {
            self.load_remote_file(locator).await
        } else {
            self.extractor.extract(Path::new(locator)).await
        }
    }

    async fn load_url(&self, url: &str) -> Result<String, DomainError> {
        let bytes = self
            .http
            .get_bytes(url)
            .await
            .map_err(|e| DomainError::extraction(url, e.to_string()))?;

        Ok(html_to_text(&String::from_utf8_lossy(&bytes)))
    }
}
