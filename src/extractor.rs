//! Per-post metadata extraction using an LLM.
//!
//! This module provides the `MetadataExtractor` struct which asks the model for a
//! post's line count, language and up to two topical tags.

use std::sync::Arc;

use crate::error::{EnrichError, Stage};
use crate::llm::CompletionClient;
use crate::models::{Language, PostMetadata};
use crate::response::parse_json_response;

/// Prompt template for metadata extraction.
const PROMPT_TEMPLATE: &str = r#"
You are given a LinkedIn post. You need to extract number of lines, language of the post and tags.
1. Return a valid JSON. No preamble.
2. JSON object should have exactly three keys: line_count, language and tags.
3. tags is an array of text tags. Extract maximum two tags.
4. Language should be English or mixhindi (mixhindi means hindi + english)

Here is the actual post on which you need to perform this task:
{post}
"#;

/// Extracts line count, language and tags from one post at a time.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use postags::extractor::MetadataExtractor;
/// use postags::llm::GroqClientBuilder;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GroqClientBuilder::new().build()?;
/// let extractor = MetadataExtractor::new(Arc::new(client));
///
/// let metadata = extractor.extract("Looking for jobs in tech. #JobSearch")?;
/// println!("{} line(s), {}, {:?}", metadata.line_count, metadata.language, metadata.tags);
/// # Ok(())
/// # }
/// ```
pub struct MetadataExtractor {
    client: Arc<dyn CompletionClient>,
    strict_language: bool,
}

impl MetadataExtractor {
    /// Creates an extractor that accepts any language label the model returns.
    #[must_use]
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            strict_language: false,
        }
    }

    /// Rejects language labels outside [`Language`] when `strict` is true.
    #[must_use]
    pub fn with_strict_language(mut self, strict: bool) -> Self {
        self.strict_language = strict;
        self
    }

    /// Asks the model for the metadata of `text`.
    ///
    /// # Errors
    ///
    /// - `EnrichError::Provider` if the model call fails
    /// - `EnrichError::Parse` if the completion is not valid JSON
    /// - `EnrichError::MalformedResponse` if the JSON lacks the expected keys or types
    /// - `EnrichError::Validation` if strict language checking is on and the
    ///   label is unrecognized
    pub fn extract(&self, text: &str) -> Result<PostMetadata, EnrichError> {
        let prompt = build_prompt(text);
        let response = self.client.complete(&prompt)?;

        let value = parse_json_response(&response)?;
        let metadata: PostMetadata =
            serde_json::from_value(value).map_err(|source| EnrichError::MalformedResponse {
                stage: Stage::Extraction,
                source,
            })?;

        if self.strict_language {
            metadata.language.parse::<Language>()?;
        }

        Ok(metadata)
    }
}

fn build_prompt(text: &str) -> String {
    PROMPT_TEMPLATE.replace("{post}", text)
}
