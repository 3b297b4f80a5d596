use std::path::PathBuf;

use thiserror::Error;

use crate::llm::LlmError;
use crate::models::{UnknownLanguage, UnmappedTag};
use crate::response::ParseError;

/// Which model call produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extraction,
    Unification,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extraction => write!(f, "metadata extraction"),
            Self::Unification => write!(f, "tag unification"),
        }
    }
}

/// Errors that abort an enrichment run.
///
/// Every variant is fatal: no output is written once one occurs.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// The raw input file does not exist
    #[error("Raw file not found: {}", .path.display())]
    InputNotFound { path: PathBuf },

    /// The raw input is not a JSON array of posts with a `text` field
    #[error("Invalid input document {}: {source}", .path.display())]
    InvalidInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A model response was not valid JSON
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The model provider could not be reached or rejected the request
    #[error("Model provider failure: {0}")]
    Provider(#[from] LlmError),

    /// A model response was valid JSON with the wrong shape
    #[error("Unexpected {stage} response: {source}")]
    MalformedResponse {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    /// The model labelled a post with a language outside the vocabulary
    #[error("Language validation failed: {0}")]
    Validation(#[from] UnknownLanguage),

    /// The unification mapping did not cover a tag
    #[error(transparent)]
    UnmappedTag(#[from] UnmappedTag),

    /// Filesystem failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The enriched posts could not be serialized
    #[error("Failed to serialize output: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl EnrichError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for failures caused by what the user passed in rather
    /// than by the provider or the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::InputNotFound { .. } | Self::InvalidInput { .. })
    }
}
