//! Batch-wide tag unification using an LLM.
//!
//! The model sees the whole tag vocabulary at once, so the same original tag
//! can never be assigned two different canonical forms within one run.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{EnrichError, Stage};
use crate::llm::CompletionClient;
use crate::models::TagMapping;
use crate::response::parse_json_response;

/// Prompt template for tag unification.
///
/// Includes worked merge examples and an example of the expected output shape.
const PROMPT_TEMPLATE: &str = r#"I will give you a list of tags. You need to unify tags with the following requirements,
1. Tags are unified and merged to create a shorter list.
   Example 1: "Jobseekers", "Job Hunting" can be all merged into a single tag "Job Search".
   Example 2: "Motivation", "Inspiration", "Drive" can be mapped to "Motivation"
   Example 3: "Personal Growth", "Personal Development", "Self Improvement" can be mapped to "Self Improvement"
   Example 4: "Scam Alert", "Job Scam" etc. can be mapped to "Scams"
2. Each tag should be follow title case convention. example: "Motivation", "Job Search"
3. Output should be a JSON object, No preamble
4. Output should have mapping of original tag and the unified tag.
   For example: {"Jobseekers": "Job Search",  "Job Hunting": "Job Search", "Motivation": "Motivation"}

Here is the list of tags:
{tags}
"#;

/// Merges synonymous tags into a canonical, title-cased vocabulary.
///
/// # Examples
///
/// ```no_run
/// use std::collections::BTreeSet;
/// use std::sync::Arc;
/// use postags::llm::GroqClientBuilder;
/// use postags::unifier::TagUnifier;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GroqClientBuilder::new().build()?;
/// let unifier = TagUnifier::new(Arc::new(client));
///
/// let tags: BTreeSet<String> = ["Jobseekers", "Job Hunting"].iter().map(|s| s.to_string()).collect();
/// let mapping = unifier.unify(&tags)?;
/// println!("{:?}", mapping.canonical("Jobseekers"));
/// # Ok(())
/// # }
/// ```
pub struct TagUnifier {
    client: Arc<dyn CompletionClient>,
}

impl TagUnifier {
    #[must_use]
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Asks the model to map every tag in `tags` to a canonical tag.
    ///
    /// An empty tag set yields an empty mapping without calling the model.
    ///
    /// # Errors
    ///
    /// - `EnrichError::Provider` if the model call fails
    /// - `EnrichError::Parse` if the completion is not valid JSON
    /// - `EnrichError::MalformedResponse` if the JSON is not an object of strings
    pub fn unify(&self, tags: &BTreeSet<String>) -> Result<TagMapping, EnrichError> {
        if tags.is_empty() {
            return Ok(TagMapping::new());
        }

        let prompt = build_prompt(tags);
        let response = self.client.complete(&prompt)?;

        let value = parse_json_response(&response)?;
        serde_json::from_value(value).map_err(|source| EnrichError::MalformedResponse {
            stage: Stage::Unification,
            source,
        })
    }
}

fn build_prompt(tags: &BTreeSet<String>) -> String {
    let joined = tags.iter().map(String::as_str).collect::<Vec<_>>().join(",");
    PROMPT_TEMPLATE.replace("{tags}", &joined)
}
