//! Bulk-load request and result types

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::provider::ProviderResults;

/// What a bulk load does to documents already stored for a knowledge base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadAction {
    /// Add documents on top of what is stored
    #[default]
    Create,
    /// Delete every stored document of the knowledge base, then add
    Update,
}

impl FromStr for LoadAction {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("update") {
            Self::Update
        } else {
            Self::Create
        })
    }
}

impl std::fmt::Display for LoadAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Outcome of one document of a bulk load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadItemResult {
    pub id: String,
    pub result: ProviderResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoadItemResult {
    pub fn success(id: impl Into<String>, result: ProviderResults) -> Self {
        Self {
            id: id.into(),
            result,
            error: None,
        }
    }

    /// No provider was attempted for this document
    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result: ProviderResults::new(),
            error: Some(error.into()),
        }
    }

    /// At least one provider stored the document
    pub fn is_stored(&self) -> bool {
        self.result.values().any(|ok| *ok)
    }
}
