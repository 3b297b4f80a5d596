mod language;
mod post;
mod tag_mapping;

pub use language::{Language, UnknownLanguage};
pub use post::{Post, PostMetadata};
pub use tag_mapping::{TagMapping, UnmappedTag};
