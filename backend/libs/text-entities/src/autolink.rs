//! Caption rendering: HTML-safe markup with linked entities.
//!
//! The input is user-authored text, so everything outside generated markup
//! goes through the escaper before any anchors are inserted. Token
//! boundaries come from the shared tokenizer, which keeps rendered links and
//! extracted entities in lockstep.

use crate::slugify;
use crate::tokenizer::{tokenize, EntityToken};

/// Rendering options for [`autolink`].
#[derive(Debug, Clone)]
pub struct AutolinkOptions {
    /// Path prefix for hashtag browse pages; the tag slug is appended.
    pub tag_path_base: String,
    /// Path prefix for profile pages; the handle is appended.
    pub mention_path_base: String,
    /// Maximum characters of a URL shown as display text; longer URLs are
    /// truncated with an ellipsis while the href keeps the full target.
    pub url_display_limit: usize,
}

impl Default for AutolinkOptions {
    fn default() -> Self {
        Self {
            tag_path_base: "/tags/".to_string(),
            mention_path_base: "/@".to_string(),
            url_display_limit: 30,
        }
    }
}

/// Render `text` as HTML-safe markup with hashtags, mentions and URLs
/// wrapped in anchors.
///
/// Handle shapes the tokenizer rejects never become tokens, so invalid
/// mentions remain plain escaped text.
pub fn autolink(text: &str, opts: &AutolinkOptions) -> String {
    let tokens = tokenize(text);
    let mut out = String::with_capacity(text.len() * 2);
    let mut cursor = 0;

    for token in &tokens {
        let range = token.range();
        out.push_str(&html_escape(&text[cursor..range.start]));
        match token {
            EntityToken::Hashtag { name, .. } => {
                let slug = slugify(name);
                out.push_str(&format!(
                    "<a href=\"{}{}\" class=\"u-url hashtag\" rel=\"nofollow noopener\">#{}</a>",
                    html_escape(&opts.tag_path_base),
                    slug,
                    html_escape(name),
                ));
            }
            EntityToken::Mention { handle, domain, .. } => {
                let full = match domain {
                    Some(domain) => format!("{handle}@{domain}"),
                    None => (*handle).to_string(),
                };
                out.push_str(&format!(
                    "<a href=\"{}{}\" class=\"u-url mention\" rel=\"nofollow noopener\">@{}</a>",
                    html_escape(&opts.mention_path_base),
                    html_escape(&full),
                    html_escape(&full),
                ));
            }
            EntityToken::Url { text: url, .. } => {
                out.push_str(&format!(
                    "<a href=\"{}\" rel=\"nofollow noopener noreferrer\" target=\"_blank\">{}</a>",
                    html_escape(url),
                    html_escape(&display_url(url, opts.url_display_limit)),
                ));
            }
        }
        cursor = range.end;
    }
    out.push_str(&html_escape(&text[cursor..]));

    out
}

/// Convert line breaks to explicit `<br />` markup so plain-text formatting
/// survives HTML rendering. Applied after autolinking.
pub fn nl2br(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "<br />\n")
}

fn display_url(url: &str, limit: usize) -> String {
    if url.chars().count() <= limit {
        return url.to_string();
    }
    let mut short: String = url.chars().take(limit).collect();
    short.push('…');
    short
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;

    #[test]
    fn test_plain_text_is_escaped() {
        let opts = AutolinkOptions::default();
        assert_eq!(
            autolink("<script>alert('x')</script>", &opts),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_hashtag_links_to_slug_path() {
        let opts = AutolinkOptions::default();
        let html = autolink("try #Hello today", &opts);
        assert!(html.contains("href=\"/tags/hello\""), "got: {html}");
        assert!(html.contains(">#Hello</a>"), "got: {html}");
    }

    #[test]
    fn test_mention_links_to_profile_path() {
        let opts = AutolinkOptions::default();
        let html = autolink("hi @alice", &opts);
        assert!(html.contains("href=\"/@alice\""), "got: {html}");
        assert!(html.contains("class=\"u-url mention\""), "got: {html}");
        assert!(html.contains(">@alice</a>"), "got: {html}");
    }

    #[test]
    fn test_remote_mention_keeps_domain_in_href() {
        let opts = AutolinkOptions::default();
        let html = autolink("hi @alice@example.com", &opts);
        assert!(html.contains("href=\"/@alice@example.com\""), "got: {html}");
    }

    #[test]
    fn test_invalid_mention_stays_plain_text() {
        let opts = AutolinkOptions::default();
        let html = autolink("mail foo@bar.com", &opts);
        assert!(!html.contains("<a"), "got: {html}");
        assert_eq!(html, "mail foo@bar.com");
    }

    #[test]
    fn test_url_anchor_has_safe_attributes() {
        let opts = AutolinkOptions::default();
        let html = autolink("see https://example.com/a", &opts);
        assert!(html.contains("rel=\"nofollow noopener noreferrer\""), "got: {html}");
        assert!(html.contains("target=\"_blank\""), "got: {html}");
    }

    #[test]
    fn test_long_url_display_truncated_but_href_full() {
        let opts = AutolinkOptions::default();
        let url = "https://example.com/a/very/long/path/that/keeps/going/and/going";
        let html = autolink(url, &opts);
        assert!(html.contains(&format!("href=\"{url}\"")), "got: {html}");
        assert!(html.contains('…'), "got: {html}");
        assert!(!html.contains(&format!(">{url}</a>")), "got: {html}");
    }

    #[test]
    fn test_query_string_ampersand_escaped_in_href() {
        let opts = AutolinkOptions::default();
        let html = autolink("https://example.com/?a=1&b=2", &opts);
        assert!(html.contains("href=\"https://example.com/?a=1&amp;b=2\""), "got: {html}");
    }

    #[test]
    fn test_nl2br_inserts_break_markup() {
        assert_eq!(nl2br("a\nb"), "a<br />\nb");
        assert_eq!(nl2br("a\r\nb"), "a<br />\nb");
        assert_eq!(nl2br("no breaks"), "no breaks");
    }

    #[test]
    fn test_rendered_anchors_match_extracted_tags() {
        // Parity: every extracted hashtag appears as a slug anchor, and the
        // anchor count matches the extraction count.
        let opts = AutolinkOptions::default();
        let text = "mixing #Tags and #tags with @people and https://example.com/#notag";
        let entities = extract(text);
        let html = autolink(text, &opts);
        for tag in &entities.hashtags {
            assert!(
                html.contains(&format!("href=\"/tags/{}\"", slugify(tag))),
                "missing anchor for #{tag} in {html}"
            );
        }
        let tag_anchors = html.matches("class=\"u-url hashtag\"").count();
        assert_eq!(tag_anchors, entities.hashtags.len());
        let mention_anchors = html.matches("class=\"u-url mention\"").count();
        assert_eq!(mention_anchors, entities.mentions.len());
    }
}
