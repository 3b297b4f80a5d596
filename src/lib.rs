//! Enrich social-media posts with model-derived metadata and a batch-wide,
//! canonical tag vocabulary.

pub mod doctor;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod response;
pub mod unifier;
pub mod utils;

pub use error::{EnrichError, Stage};
pub use extractor::MetadataExtractor;
pub use llm::{CompletionClient, GroqClient, GroqClientBuilder, LlmError};
pub use models::{Language, Post, PostMetadata, TagMapping};
pub use pipeline::{
    DEFAULT_PROCESSED_PATH, DEFAULT_RAW_PATH, Pipeline, ProcessSummary, process_posts,
};
pub use unifier::TagUnifier;
