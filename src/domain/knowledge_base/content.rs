//! Planning of the content units that make up a knowledge item.
//!
//! Planning is pure: it decides which documents an item produces and where
//! their text comes from. Fetching and extraction happen later through a
//! [`ContentLoader`](crate::domain::ingestion::ContentLoader).

use tracing::warn;

use super::doc_id::{content_doc_id, file_doc_id};
use super::entity::{KnowledgeBase, KnowledgeBaseType, KnowledgeFile};

/// Storage provider name for files kept on the local filesystem
pub const LOCAL_FILE_STORAGE: &str = "local";

/// Where the text of one document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Text carried by the item itself
    Inline(String),
    /// Local path or http(s) URL of a file to extract
    File(String),
    /// Web page fetched at ingestion time
    Url(String),
}

/// One document to be produced from a knowledge item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUnit {
    pub doc_id: String,
    pub source: ContentSource,
}

impl ContentUnit {
    fn new(doc_id: String, source: ContentSource) -> Self {
        Self { doc_id, source }
    }
}

pub fn is_remote(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

/// Ordered content units of a knowledge item.
///
/// `file_storage_provider` decides which half of a stored file record is
/// used: `local` reads `file_path`, anything else downloads `url`.
pub fn plan_content_units(kb: &KnowledgeBase, file_storage_provider: &str) -> Vec<ContentUnit> {
    let inline = || {
        ContentUnit::new(
            content_doc_id(kb.id()),
            ContentSource::Inline(kb.content().unwrap_or_default().to_string()),
        )
    };

    match kb.kb_type() {
        KnowledgeBaseType::File if !kb.files().is_empty() => kb
            .files()
            .iter()
            .enumerate()
            .filter_map(|(idx, file)| plan_file(kb, idx, file, file_storage_provider))
            .collect(),
        KnowledgeBaseType::Url => match kb.url() {
            Some(url) => vec![ContentUnit::new(
                content_doc_id(kb.id()),
                ContentSource::Url(url.to_string()),
            )],
            None => vec![inline()],
        },
        _ => vec![inline()],
    }
}

fn plan_file(
    kb: &KnowledgeBase,
    idx: usize,
    file: &KnowledgeFile,
    file_storage_provider: &str,
) -> Option<ContentUnit> {
    let locator = match file {
        KnowledgeFile::Locator(locator) => locator.as_str(),
        KnowledgeFile::Stored { file_path, url } => {
            let is_local = file_storage_provider == LOCAL_FILE_STORAGE;
            match (is_local, file_path.as_deref(), url.as_deref()) {
                (false, _, Some(url)) if is_remote(url) => url,
                (true, Some(path), _) => path,
                _ => {
                    warn!(
                        kb_id = %kb.id(),
                        file_index = idx,
                        file = file.display_ref(),
                        storage = file_storage_provider,
                        "File entry has no usable path or URL, skipping"
                    );
                    return None;
                }
            }
        }
    };

    Some(ContentUnit::new(
        file_doc_id(kb.id(), idx, locator),
        ContentSource::File(locator.to_string()),
    ))
}
