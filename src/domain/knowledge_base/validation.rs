//! Knowledge base validation utilities

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length for knowledge base and tenant IDs
pub const MAX_KB_ID_LENGTH: usize = 128;

/// Valid IDs start alphanumeric and never contain `#`, which delimits the
/// knowledge base segment of a document id.
static KB_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._:-]*$").unwrap());

/// Knowledge base validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeBaseValidationError {
    /// ID is empty
    EmptyId,
    /// ID exceeds maximum length
    IdTooLong { length: usize, max: usize },
    /// ID contains invalid characters
    InvalidIdFormat { id: String },
    /// Invalid chunking parameters
    InvalidChunking { chunk_size: usize, chunk_overlap: usize },
    /// Invalid hybrid weighting
    InvalidWeight { value: f32 },
}

impl fmt::Display for KnowledgeBaseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "Knowledge base ID cannot be empty"),
            Self::IdTooLong { length, max } => {
                write!(
                    f,
                    "Knowledge base ID too long: {} characters (max {})",
                    length, max
                )
            }
            Self::InvalidIdFormat { id } => {
                write!(
                    f,
                    "Invalid knowledge base ID format '{}': must start alphanumeric and may not contain '#' or whitespace",
                    id
                )
            }
            Self::InvalidChunking {
                chunk_size,
                chunk_overlap,
            } => {
                write!(
                    f,
                    "Invalid chunking: chunk_size {} must be > 0 and greater than chunk_overlap {}",
                    chunk_size, chunk_overlap
                )
            }
            Self::InvalidWeight { value } => {
                write!(
                    f,
                    "Invalid vector weight {}: must be between 0.0 and 1.0",
                    value
                )
            }
        }
    }
}

impl std::error::Error for KnowledgeBaseValidationError {}

/// Validate a knowledge base ID
pub fn validate_knowledge_base_id(id: &str) -> Result<(), KnowledgeBaseValidationError> {
    if id.is_empty() {
        return Err(KnowledgeBaseValidationError::EmptyId);
    }

    if id.len() > MAX_KB_ID_LENGTH {
        return Err(KnowledgeBaseValidationError::IdTooLong {
            length: id.len(),
            max: MAX_KB_ID_LENGTH,
        });
    }

    if !KB_ID_PATTERN.is_match(id) {
        return Err(KnowledgeBaseValidationError::InvalidIdFormat { id: id.to_string() });
    }

    Ok(())
}

/// Validate chunk size and overlap as carried in provider settings
pub fn validate_chunking(
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<(), KnowledgeBaseValidationError> {
    if chunk_size == 0 || chunk_overlap >= chunk_size {
        return Err(KnowledgeBaseValidationError::InvalidChunking {
            chunk_size,
            chunk_overlap,
        });
    }

    Ok(())
}

/// Validate the vector share of a hybrid score
pub fn validate_vector_weight(weight: f32) -> Result<(), KnowledgeBaseValidationError> {
    if !(0.0..=1.0).contains(&weight) {
        return Err(KnowledgeBaseValidationError::InvalidWeight { value: weight });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_kb_ids() {
        assert!(validate_knowledge_base_id("a").is_ok());
        assert!(validate_knowledge_base_id("my-kb").is_ok());
        assert!(validate_knowledge_base_id("my_kb.v2").is_ok());
        assert!(validate_knowledge_base_id("3f2b6a1e-9c2d-4f7a-8b1e-0d5c6e7f8a9b").is_ok());
    }

    #[test]
    fn test_invalid_kb_ids() {
        assert!(matches!(
            validate_knowledge_base_id(""),
            Err(KnowledgeBaseValidationError::EmptyId)
        ));

        let long_id = "a".repeat(129);
        assert!(matches!(
            validate_knowledge_base_id(&long_id),
            Err(KnowledgeBaseValidationError::IdTooLong { .. })
        ));

        assert!(matches!(
            validate_knowledge_base_id("kb#1"),
            Err(KnowledgeBaseValidationError::InvalidIdFormat { .. })
        ));

        assert!(matches!(
            validate_knowledge_base_id("my kb"),
            Err(KnowledgeBaseValidationError::InvalidIdFormat { .. })
        ));

        assert!(matches!(
            validate_knowledge_base_id("-kb"),
            Err(KnowledgeBaseValidationError::InvalidIdFormat { .. })
        ));
    }

    #[test]
    fn test_chunking_validation() {
        assert!(validate_chunking(1000, 200).is_ok());
        assert!(validate_chunking(10, 0).is_ok());

        assert!(validate_chunking(0, 0).is_err());
        assert!(validate_chunking(100, 100).is_err());
    }

    #[test]
    fn test_vector_weight_validation() {
        assert!(validate_vector_weight(0.0).is_ok());
        assert!(validate_vector_weight(0.6).is_ok());
        assert!(validate_vector_weight(1.0).is_ok());

        assert!(validate_vector_weight(-0.1).is_err());
        assert!(validate_vector_weight(1.5).is_err());
    }
}
