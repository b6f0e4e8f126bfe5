//! Entity lexing for user-authored text.
//!
//! Finds #hashtags, @mentions and URLs in post captions and renders captions
//! into HTML-safe markup with entities wrapped in anchors. Extraction and
//! autolinking share one tokenizer, so both passes always agree on token
//! boundaries.

pub mod autolink;
pub mod extractor;
pub mod tokenizer;

pub use autolink::{autolink, nl2br, AutolinkOptions};
pub use extractor::{extract, ExtractedEntities, UrlEntity};
pub use tokenizer::{tokenize, EntityToken};

/// Derive the canonical URL-safe slug for a hashtag name.
///
/// Case-folds the display name and replaces underscores with dashes, so
/// `"Music"` and `"music"` share the slug `"music"` and `"no_filter"`
/// becomes `"no-filter"`.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace('_', "-")
}
