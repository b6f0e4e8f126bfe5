//! Entity extraction from caption text.
//!
//! Returns the hashtags, mentions and URLs found in a caption, in first
//! occurrence order. Duplicates are preserved; deduplication policy belongs
//! to the persistence layer, not the lexer.

use serde::{Deserialize, Serialize};

use crate::tokenizer::{tokenize, EntityToken};

/// A URL entity with its byte span in the source text, for placement-aware
/// rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlEntity {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Entities extracted from one caption. Serialized as-is onto the owning
/// post record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub urls: Vec<UrlEntity>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.hashtags.is_empty() && self.mentions.is_empty() && self.urls.is_empty()
    }
}

/// Extract all entities from `text`.
///
/// Pure and deterministic; non-matching text simply yields empty lists.
/// Remote mentions keep their `handle@domain` form.
pub fn extract(text: &str) -> ExtractedEntities {
    let mut entities = ExtractedEntities::default();

    for token in tokenize(text) {
        match token {
            EntityToken::Hashtag { name, .. } => entities.hashtags.push(name.to_string()),
            EntityToken::Mention { handle, domain, .. } => {
                let mention = match domain {
                    Some(domain) => format!("{handle}@{domain}"),
                    None => handle.to_string(),
                };
                entities.mentions.push(mention);
            }
            EntityToken::Url { text, range } => entities.urls.push(UrlEntity {
                text: text.to_string(),
                start: range.start,
                end: range.end,
            }),
        }
    }

    entities
}
