//! Architecture Validation Integration Tests
//!
//! Confirms that the enrichment pipeline can be driven entirely through the
//! library API, with no CLI types, no environment and no network.
//!
//! **Critical Architecture Invariant:**
//! This file must NOT import anything from main.rs. It only uses types
//! exported from the `postags::` crate root.

use std::sync::Arc;

use postags::{
    CompletionClient, EnrichError, Language, LlmError, MetadataExtractor, Pipeline, Post,
    PostMetadata, TagMapping, TagUnifier,
};

/// A model that answers every prompt the same way.
struct FixedModel(&'static str);

impl CompletionClient for FixedModel {
    fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Ok(self.0.to_string())
    }
}

#[test]
fn components_accept_any_completion_client() {
    let client: Arc<dyn CompletionClient> =
        Arc::new(FixedModel(r#"{"line_count": 1, "language": "english", "tags": []}"#));

    let _extractor = MetadataExtractor::new(client.clone());
    let _unifier = TagUnifier::new(client.clone());
    let _pipeline = Pipeline::new(client);
}

#[test]
fn pipeline_enriches_in_memory_posts() {
    let pipeline = Pipeline::new(Arc::new(FixedModel(
        r#"{"line_count": 1, "language": "english", "tags": []}"#,
    )));

    let (posts, mapping) = pipeline
        .enrich(vec![Post::new("one"), Post::new("two")])
        .expect("enrichment should succeed");

    assert!(mapping.is_empty());
    assert!(posts.iter().all(Post::is_enriched));
    assert!(posts.iter().all(|p| p.tags().is_empty()));
}

#[test]
fn model_types_compose_without_a_client() {
    let mut post = Post::new("Namaste");
    post.merge_metadata(PostMetadata {
        line_count: 1,
        language: Language::MixHindi.to_string(),
        tags: vec!["Greeting".to_string()],
    });

    let mut mapping = TagMapping::new();
    mapping.insert("Greeting", "Greetings");
    let remapped = mapping.remap(post.tags()).expect("tag is mapped");

    assert_eq!(remapped, vec!["Greetings"]);
    assert_eq!(post.language.as_deref(), Some("mixhindi"));
}

#[test]
fn errors_are_typed_at_the_library_boundary() {
    let pipeline = Pipeline::new(Arc::new(FixedModel("not json")));
    let err = pipeline.enrich(vec![Post::new("x")]).unwrap_err();

    assert!(matches!(err, EnrichError::Parse(_)));
    assert!(!err.is_user_error());
}
