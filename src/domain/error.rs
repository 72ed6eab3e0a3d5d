use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Extraction error: {locator} - {message}")]
    Extraction { locator: String, message: String },

    #[error("Unsupported content: {message}")]
    Unsupported { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn extraction(locator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            locator: locator.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("chunk_overlap must be smaller than chunk_size");
        assert_eq!(
            error.to_string(),
            "Validation error: chunk_overlap must be smaller than chunk_size"
        );
    }

    #[test]
    fn test_provider_error() {
        let error = DomainError::provider("graph_db", "connection refused");
        assert_eq!(error.to_string(), "Provider error: graph_db - connection refused");
    }

    #[test]
    fn test_extraction_error() {
        let error = DomainError::extraction("/tmp/x.pdf", "corrupt xref table");
        assert_eq!(
            error.to_string(),
            "Extraction error: /tmp/x.pdf - corrupt xref table"
        );
    }
}
