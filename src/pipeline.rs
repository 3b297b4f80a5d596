//! Batch enrichment pipeline.
//!
//! Loads posts, extracts metadata for each one, unifies the tag vocabulary
//! across the batch and writes the enriched posts back out. Every failure is
//! fatal and nothing is written unless the whole batch succeeds.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::EnrichError;
use crate::extractor::MetadataExtractor;
use crate::llm::CompletionClient;
use crate::models::{Post, TagMapping};
use crate::unifier::TagUnifier;
use crate::utils::{ensure_parent_directory, to_pretty_json, write_atomically};

/// Input location used when none is given.
pub const DEFAULT_RAW_PATH: &str = "data/Raw_data.json";

/// Output location used when none is given.
pub const DEFAULT_PROCESSED_PATH: &str = "data/processed.json";

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Number of posts enriched
    pub posts: usize,
    /// Entries in the unification mapping
    pub mapped_tags: usize,
    /// Distinct canonical tags across all posts after unification
    pub canonical_tags: usize,
    /// Where the enriched posts were written
    pub output_path: PathBuf,
}

/// Enriches posts through a language model.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use std::sync::Arc;
/// use postags::Pipeline;
/// use postags::llm::GroqClientBuilder;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GroqClientBuilder::new().build()?;
/// let pipeline = Pipeline::new(Arc::new(client));
///
/// let summary = pipeline.process_posts(Path::new("data/Raw_data.json"), None)?;
/// println!("Enriched {} posts into {}", summary.posts, summary.output_path.display());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    extractor: MetadataExtractor,
    unifier: TagUnifier,
}

impl Pipeline {
    #[must_use]
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            extractor: MetadataExtractor::new(client.clone()),
            unifier: TagUnifier::new(client),
        }
    }

    /// Rejects language labels outside the fixed vocabulary when `strict` is true.
    #[must_use]
    pub fn with_strict_language(mut self, strict: bool) -> Self {
        self.extractor = self.extractor.with_strict_language(strict);
        self
    }

    /// Reads posts from `raw_path`, enriches them and writes the result.
    ///
    /// `processed_path` defaults to [`DEFAULT_PROCESSED_PATH`]. Its parent
    /// directory is created if needed and any existing file is replaced.
    ///
    /// # Errors
    ///
    /// Returns `EnrichError::InputNotFound` before any model call if `raw_path`
    /// does not exist, and any extraction, unification or I/O failure after
    /// that. No output file is written when an error is returned.
    pub fn process_posts(
        &self,
        raw_path: &Path,
        processed_path: Option<&Path>,
    ) -> Result<ProcessSummary, EnrichError> {
        let processed_path = processed_path.unwrap_or(Path::new(DEFAULT_PROCESSED_PATH));

        if !raw_path.exists() {
            return Err(EnrichError::InputNotFound {
                path: raw_path.to_path_buf(),
            });
        }

        ensure_parent_directory(processed_path)?;

        let posts = load_posts(raw_path)?;
        tracing::info!(
            input = %raw_path.display(),
            posts = posts.len(),
            "enriching posts"
        );

        let (posts, mapping) = self.enrich(posts)?;

        let bytes = to_pretty_json(&posts).map_err(EnrichError::Serialize)?;
        write_atomically(processed_path, &bytes)?;

        let summary = ProcessSummary {
            posts: posts.len(),
            mapped_tags: mapping.len(),
            canonical_tags: distinct_tags(&posts),
            output_path: processed_path.to_path_buf(),
        };
        tracing::info!(
            output = %processed_path.display(),
            posts = summary.posts,
            mapped_tags = summary.mapped_tags,
            canonical_tags = summary.canonical_tags,
            "wrote enriched posts"
        );

        Ok(summary)
    }

    /// Runs both enrichment passes over in-memory posts.
    ///
    /// Returns the enriched posts together with the mapping used to
    /// canonicalize their tags.
    ///
    /// # Errors
    ///
    /// Fails on the first extraction error, on a unification error, or if the
    /// mapping does not cover a tag some post carries.
    pub fn enrich(&self, mut posts: Vec<Post>) -> Result<(Vec<Post>, TagMapping), EnrichError> {
        let total = posts.len();
        for (index, post) in posts.iter_mut().enumerate() {
            let metadata = self.extractor.extract(&post.text)?;
            tracing::debug!(
                post = index + 1,
                total,
                line_count = metadata.line_count,
                language = %metadata.language,
                tags = ?metadata.tags,
                "extracted metadata"
            );
            post.merge_metadata(metadata);
        }

        let unique_tags = collect_tags(&posts);
        let mapping = self.unifier.unify(&unique_tags)?;
        tracing::debug!(
            raw_tags = unique_tags.len(),
            canonical_tags = mapping.canonical_count(),
            "unified tags"
        );

        for post in &mut posts {
            let canonical = mapping.remap(post.tags())?;
            post.tags = Some(canonical);
        }

        Ok((posts, mapping))
    }
}

/// Enriches the posts in `raw_path` using `client` and writes them to
/// `processed_path` (default [`DEFAULT_PROCESSED_PATH`]).
///
/// Convenience wrapper around [`Pipeline::process_posts`].
pub fn process_posts(
    client: Arc<dyn CompletionClient>,
    raw_path: &Path,
    processed_path: Option<&Path>,
) -> Result<ProcessSummary, EnrichError> {
    Pipeline::new(client).process_posts(raw_path, processed_path)
}

/// Reads the whole input document.
fn load_posts(path: &Path) -> Result<Vec<Post>, EnrichError> {
    let content = std::fs::read_to_string(path).map_err(|e| EnrichError::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| EnrichError::InvalidInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Union of every post's tags.
fn collect_tags(posts: &[Post]) -> BTreeSet<String> {
    posts
        .iter()
        .flat_map(|post| post.tags().iter().cloned())
        .collect()
}

fn distinct_tags(posts: &[Post]) -> usize {
    posts
        .iter()
        .flat_map(|post| post.tags())
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers prompts from a queue, in order.
    struct QueuedClient {
        responses: Mutex<VecDeque<String>>,
    }

    impl QueuedClient {
        fn new(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            })
        }
    }

    impl CompletionClient for QueuedClient {
        fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LlmError::Api {
                    message: "no response queued".to_string(),
                })
        }
    }

    #[test]
    fn enrich_merges_metadata_and_canonicalizes_tags() {
        let client = QueuedClient::new(&[
            r#"{"line_count": 1, "language": "english", "tags": ["Jobseekers", "Motivation"]}"#,
            r#"{"line_count": 4, "language": "mixhindi", "tags": ["Job Hunting"]}"#,
            r#"{"Jobseekers": "Job Search", "Job Hunting": "Job Search", "Motivation": "Motivation"}"#,
        ]);
        let pipeline = Pipeline::new(client);

        let (posts, mapping) = pipeline
            .enrich(vec![Post::new("first"), Post::new("second")])
            .unwrap();

        assert_eq!(mapping.len(), 3);
        assert_eq!(posts[0].tags(), &["Job Search", "Motivation"]);
        assert_eq!(posts[1].tags(), &["Job Search"]);
        assert_eq!(posts[1].line_count, Some(4));
        assert_eq!(posts[1].language.as_deref(), Some("mixhindi"));
        assert_eq!(distinct_tags(&posts), 2);
    }

    #[test]
    fn enrich_of_empty_batch_makes_no_calls() {
        let client = QueuedClient::new(&[]);
        let (posts, mapping) = Pipeline::new(client).enrich(Vec::new()).unwrap();
        assert!(posts.is_empty());
        assert!(mapping.is_empty());
    }

    #[test]
    fn enrich_fails_when_mapping_misses_a_tag() {
        let client = QueuedClient::new(&[
            r#"{"line_count": 1, "language": "english", "tags": ["Hiring", "Remote"]}"#,
            r#"{"Hiring": "Hiring"}"#,
        ]);
        let err = Pipeline::new(client)
            .enrich(vec![Post::new("post")])
            .unwrap_err();
        assert!(matches!(err, EnrichError::UnmappedTag(_)));
    }

    #[test]
    fn collect_tags_deduplicates_across_posts() {
        let mut a = Post::new("a");
        a.tags = Some(vec!["Rust".to_string(), "Hiring".to_string()]);
        let mut b = Post::new("b");
        b.tags = Some(vec!["Hiring".to_string()]);

        let tags = collect_tags(&[a, b, Post::new("c")]);
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["Hiring", "Rust"]);
    }

    #[test]
    fn load_posts_rejects_non_array_document() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("raw.json");
        std::fs::write(&path, r#"{"text": "not in an array"}"#).unwrap();

        let err = load_posts(&path).unwrap_err();
        assert!(matches!(err, EnrichError::InvalidInput { .. }));
        assert!(err.is_user_error());
    }
}
