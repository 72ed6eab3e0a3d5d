//! Composite document ids.
//!
//! Every document submitted to a provider is keyed `KB:{kb_id}#...`:
//!
//! - `KB:{kb_id}#content` for the inline content of an item
//! - `KB:{kb_id}#file_{index}:{locator}` for the index-th file or URL
//!
//! Listing and deleting by knowledge base is a prefix match on `KB:{kb_id}#`,
//! so the format must stay bit-exact.

use super::entity::KnowledgeBaseId;

const KB_MARKER: &str = "KB:";
const KB_TERMINATOR: char = '#';

/// Prefix shared by every document of a knowledge base
pub fn kb_prefix(kb_id: &KnowledgeBaseId) -> String {
    format!("{}{}{}", KB_MARKER, kb_id, KB_TERMINATOR)
}

/// Id of the inline-content document of a knowledge item
pub fn content_doc_id(kb_id: &KnowledgeBaseId) -> String {
    format!("{}content", kb_prefix(kb_id))
}

/// Id of the `index`-th file of a knowledge item, `locator` as given at ingestion
pub fn file_doc_id(kb_id: &KnowledgeBaseId, index: usize, locator: &str) -> String {
    format!("{}file_{}:{}", kb_prefix(kb_id), index, locator)
}

/// Whether `doc_id` is scoped to `kb_id`
pub fn belongs_to(doc_id: &str, kb_id: &KnowledgeBaseId) -> bool {
    doc_id
        .strip_prefix(KB_MARKER)
        .and_then(|rest| rest.strip_prefix(kb_id.as_str()))
        .is_some_and(|rest| rest.starts_with(KB_TERMINATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb(id: &str) -> KnowledgeBaseId {
        KnowledgeBaseId::new(id).unwrap()
    }

    #[test]
    fn test_content_doc_id() {
        assert_eq!(content_doc_id(&kb("abc")), "KB:abc#content");
    }

    #[test]
    fn test_file_doc_ids() {
        let id = kb("abc");

        assert_eq!(file_doc_id(&id, 0, "/tmp/x.pdf"), "KB:abc#file_0:/tmp/x.pdf");
        assert_eq!(
            file_doc_id(&id, 1, "https://ex.com/y.docx"),
            "KB:abc#file_1:https://ex.com/y.docx"
        );
    }

    #[test]
    fn test_belongs_to_is_exact_on_kb_segment() {
        assert!(belongs_to("KB:abc#content", &kb("abc")));
        assert!(belongs_to("KB:abc#file_0:/tmp/x.pdf", &kb("abc")));
        assert!(!belongs_to("KB:abcd#content", &kb("abc")));
        assert!(!belongs_to("KB:ab#content", &kb("abc")));
        assert!(!belongs_to("abc#content", &kb("abc")));
    }
}
