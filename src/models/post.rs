use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// One social-media post, before or after enrichment.
///
/// Only `text` is required on input. Every other input field is carried
/// through untouched in `extra`, keeping its relative order. On output `text`
/// always comes first, followed by `extra` and then the enrichment fields.
///
/// The enrichment fields are absent until [`Post::merge_metadata`] fills them
/// in. Input values of the wrong type for those fields (say
/// `"line_count": "3"`) are read as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// The raw post content.
    pub text: String,
    /// Input fields this tool does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    /// Number of lines in the post, as counted by the model.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub line_count: Option<u64>,
    /// Language label, e.g. `english` or `mixhindi`.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub language: Option<String>,
    /// Topical tags; raw after extraction, canonical after unification.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub tags: Option<Vec<String>>,
}

impl Post {
    /// Creates an unenriched post with no extra fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use postags::Post;
    ///
    /// let post = Post::new("Open to work!");
    /// assert_eq!(post.text, "Open to work!");
    /// assert!(post.tags().is_empty());
    /// ```
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: serde_json::Map::new(),
            line_count: None,
            language: None,
            tags: None,
        }
    }

    /// Copies extracted metadata onto the post.
    ///
    /// Enrichment fields always overwrite values the post already had.
    pub fn merge_metadata(&mut self, metadata: PostMetadata) {
        self.line_count = Some(metadata.line_count);
        self.language = Some(metadata.language);
        self.tags = Some(metadata.tags);
    }

    /// Returns the post's tags, or an empty slice if it has none yet.
    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }

    /// Returns true once all three enrichment fields are present.
    pub fn is_enriched(&self) -> bool {
        self.line_count.is_some() && self.language.is_some() && self.tags.is_some()
    }
}

/// Reads an optional field, treating a value of the wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Metadata the model extracts from a single post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub line_count: u64,
    pub language: String,
    pub tags: Vec<String>,
}
