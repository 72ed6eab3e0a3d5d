//! Content loading traits: turn locators into plain text

use std::fmt::Debug;
use std::path::Path;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Extracts plain text from a file on disk. Responsible for format sniffing.
#[async_trait]
pub trait TextExtractor: Send + Sync + Debug {
    async fn extract(&self, path: &Path) -> Result<String, DomainError>;
}

/// Resolves the raw content of a knowledge item into text
#[async_trait]
pub trait ContentLoader: Send + Sync + Debug {
    /// Text of a local path or an http(s) file URL
    async fn load_file(&self, locator: &str) -> Result<String, DomainError>;

    /// Visible text of a web page
    async fn load_url(&self, url: &str) -> Result<String, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Loader backed by a fixed locator -> text map; unknown locators fail
    #[derive(Debug, Default)]
    pub struct MockContentLoader {
        contents: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl MockContentLoader {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_content(mut self, locator: impl Into<String>, text: impl Into<String>) -> Self {
            self.contents.insert(locator.into(), text.into());
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }

        fn lookup(&self, locator: &str) -> Result<String, DomainError> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(locator.to_string());
            }
            self.contents
                .get(locator)
                .cloned()
                .ok_or_else(|| DomainError::extraction(locator, "no such file"))
        }
    }

    #[async_trait]
    impl ContentLoader for MockContentLoader {
        async fn load_file(&self, locator: &str) -> Result<String, DomainError> {
            self.lookup(locator)
        }

        async fn load_url(&self, url: &str) -> Result<String, DomainError> {
            self.lookup(url)
        }
    }
}
