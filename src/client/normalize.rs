//! Text normalization shared by the source adapters.

use crate::client::ContentType;
use regex::Regex;
use std::sync::OnceLock;

/// Maximum snippet length in characters, before the ellipsis
pub const SNIPPET_MAX_CHARS: usize = 200;

const ELLIPSIS: &str = "...";

/// Collapse runs of whitespace (including newlines) into single spaces
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleaned text, or `fallback` when the value is missing or blank
#[must_use]
pub fn text_or(value: Option<&str>, fallback: &str) -> String {
    value
        .map(collapse_whitespace)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Cut `text` to [`SNIPPET_MAX_CHARS`] characters, appending an ellipsis when cut
#[must_use]
pub fn truncate_snippet(text: &str) -> String {
    let text = collapse_whitespace(text);
    match text.char_indices().nth(SNIPPET_MAX_CHARS) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", text[..cut].trim_end()),
        None => text,
    }
}

/// Truncated snippet, or the generic placeholder for `content_type`
#[must_use]
pub fn snippet_or_placeholder(text: Option<&str>, content_type: ContentType) -> String {
    match text.map(truncate_snippet) {
        Some(snippet) if !snippet.is_empty() => snippet,
        _ => content_type.placeholder_snippet().to_string(),
    }
}

fn tag_pattern() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static regex is valid"))
}

/// Remove markup from feed descriptions and decode the common entities
#[must_use]
pub fn strip_html(text: &str) -> String {
    let without_tags = tag_pattern().replace_all(text, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&");
    collapse_whitespace(&decoded)
}

/// Lower-cased whitespace-separated words of a topic
#[must_use]
pub fn topic_words(topic: &str) -> Vec<String> {
    topic.split_whitespace().map(str::to_lowercase).collect()
}

/// Whether `text` contains at least one topic word, case-insensitively
#[must_use]
pub fn matches_topic(text: &str, words: &[String]) -> bool {
    let haystack = text.to_lowercase();
    words.iter().any(|word| haystack.contains(word.as_str()))
}
