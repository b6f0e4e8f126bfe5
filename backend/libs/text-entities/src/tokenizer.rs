//! Shared tokenizer for caption entities.
//!
//! Both the extractor and the autolinker consume this tokenizer, which keeps
//! their token boundaries identical by construction. Tokens carry byte
//! ranges into the source text so callers can reassemble the surrounding
//! text segments.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Longest hashtag name accepted, in characters.
pub const MAX_HASHTAG_LENGTH: usize = 100;

/// Longest mention handle accepted (without domain), in characters.
pub const MAX_HANDLE_LENGTH: usize = 64;

/// Hashtag: `#` plus word characters, not preceded by a word character.
/// `&` is also excluded as a prefix so HTML entities like `&#39;` never
/// introduce a tag.
static HASHTAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w&])(?P<tag>#(?P<name>\w+))").expect("invalid hashtag regex")
});

/// Mention: `@` plus a handle of ASCII word characters with interior dots,
/// optionally followed by a single `@domain` suffix for remote handles.
/// Same non-word-preceded boundary rule; a preceding `@` also does not
/// introduce a mention.
static MENTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[^\w@])(?P<mention>@(?P<handle>[A-Za-z0-9_](?:[A-Za-z0-9_.]*[A-Za-z0-9_])?)(?:@(?P<domain>(?:[A-Za-z0-9-]+\.)+[A-Za-z]{2,}))?)",
    )
    .expect("invalid mention regex")
});

/// URL: permissive scheme + host match; trailing punctuation is trimmed
/// after the fact.
static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("invalid url regex"));

/// A single entity token with its byte range in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityToken<'a> {
    /// `#name`; the range covers the leading `#`.
    Hashtag { name: &'a str, range: Range<usize> },
    /// `@handle` or `@handle@domain`; the range covers the full form.
    Mention {
        handle: &'a str,
        domain: Option<&'a str>,
        range: Range<usize>,
    },
    /// A bare URL.
    Url { text: &'a str, range: Range<usize> },
}

impl EntityToken<'_> {
    /// Byte range of the token in the source text.
    pub fn range(&self) -> Range<usize> {
        match self {
            EntityToken::Hashtag { range, .. }
            | EntityToken::Mention { range, .. }
            | EntityToken::Url { range, .. } => range.clone(),
        }
    }
}

/// Tokenize `text` into entity tokens ordered by position.
///
/// Deterministic and total: arbitrary input yields a (possibly empty) token
/// list, never a panic. URLs are matched first; hashtag and mention
/// candidates inside a URL span are suppressed so the spans never overlap.
pub fn tokenize(text: &str) -> Vec<EntityToken<'_>> {
    let mut tokens = Vec::new();
    let mut url_spans: Vec<Range<usize>> = Vec::new();

    for m in URL_REGEX.find_iter(text) {
        let trimmed = trim_url_candidate(m.as_str());
        if !has_host(trimmed) {
            continue;
        }
        let range = m.start()..m.start() + trimmed.len();
        url_spans.push(range.clone());
        tokens.push(EntityToken::Url {
            text: trimmed,
            range,
        });
    }

    for cap in HASHTAG_REGEX.captures_iter(text) {
        let (Some(tag), Some(name)) = (cap.name("tag"), cap.name("name")) else {
            continue;
        };
        if name.as_str().chars().count() > MAX_HASHTAG_LENGTH {
            continue;
        }
        if overlaps_any(&url_spans, tag.start(), tag.end()) {
            continue;
        }
        tokens.push(EntityToken::Hashtag {
            name: name.as_str(),
            range: tag.range(),
        });
    }

    for cap in MENTION_REGEX.captures_iter(text) {
        let (Some(mention), Some(handle)) = (cap.name("mention"), cap.name("handle")) else {
            continue;
        };
        if handle.as_str().len() > MAX_HANDLE_LENGTH {
            continue;
        }
        // The handle/domain classes are ASCII; reject forms glued to a
        // following letter or digit so `@alice日本` is not a mention.
        if next_char_is_alphanumeric(text, mention.end()) {
            continue;
        }
        if overlaps_any(&url_spans, mention.start(), mention.end()) {
            continue;
        }
        tokens.push(EntityToken::Mention {
            handle: handle.as_str(),
            domain: cap.name("domain").map(|d| d.as_str()),
            range: mention.range(),
        });
    }

    tokens.sort_by_key(|t| t.range().start);
    tokens
}

/// Strip trailing punctuation that is almost always sentence structure
/// rather than part of the URL. A closing parenthesis is kept when the URL
/// itself contains an opening one (wiki-style paths).
fn trim_url_candidate(candidate: &str) -> &str {
    let mut url = candidate;
    loop {
        match url.chars().last() {
            Some('.' | ',' | '!' | '?' | ';' | ':') => url = &url[..url.len() - 1],
            Some(')') if !url.contains('(') => url = &url[..url.len() - 1],
            _ => break,
        }
    }
    url
}

fn has_host(url: &str) -> bool {
    url.find("://")
        .and_then(|idx| url[idx + 3..].chars().next())
        .map_or(false, |c| c.is_ascii_alphanumeric())
}

fn overlaps_any(spans: &[Range<usize>], start: usize, end: usize) -> bool {
    spans.iter().any(|s| start < s.end && end > s.start)
}

fn next_char_is_alphanumeric(text: &str, at: usize) -> bool {
    text[at..].chars().next().map_or(false, |c| c.is_alphanumeric())
}
