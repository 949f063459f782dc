pub mod auth;
pub mod meta_search;
pub mod normalize;
pub mod providers;

pub use auth::{RedditTokenProvider, SearchSession, SessionToken};
pub use meta_search::{
    BulkSearchResult, MetaSearchClient, MetaSearchConfig, ProviderFailure, SourceInfo,
};

use crate::client::providers::ProviderError;
use crate::config::SearchConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// HTTP client configuration for source adapters
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout duration
    pub timeout: Duration,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
            user_agent: "SoundMindAgent/1.0".to_string(),
        }
    }
}

impl From<&SearchConfig> for HttpClientConfig {
    fn from(search: &SearchConfig) -> Self {
        Self {
            timeout: search.request_timeout(),
            user_agent: search.user_agent.clone(),
            ..Self::default()
        }
    }
}

impl HttpClientConfig {
    /// Build a `reqwest` client with these settings
    pub fn build(&self) -> Result<reqwest::Client, ProviderError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| ProviderError::Other(format!("Failed to create HTTP client: {e}")))
    }
}

/// Closed set of record families; drives grouping in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    News,
    Reddit,
    Research,
    Video,
    Academic,
    Podcast,
    Blog,
    Code,
}

impl ContentType {
    pub const ALL: [Self; 8] = [
        Self::News,
        Self::Reddit,
        Self::Research,
        Self::Video,
        Self::Academic,
        Self::Podcast,
        Self::Blog,
        Self::Code,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Reddit => "reddit",
            Self::Research => "research",
            Self::Video => "video",
            Self::Academic => "academic",
            Self::Podcast => "podcast",
            Self::Blog => "blog",
            Self::Code => "code",
        }
    }

    /// Generic snippet used when a source gives no description
    #[must_use]
    pub const fn placeholder_snippet(self) -> &'static str {
        match self {
            Self::News => "News coverage related to the search topic.",
            Self::Reddit => "Community discussion related to the search topic.",
            Self::Research => "Peer-reviewed research related to the search topic.",
            Self::Video => "Video content related to the search topic.",
            Self::Academic => "Academic paper related to the search topic.",
            Self::Podcast => "Podcast related to the search topic.",
            Self::Blog => "Blog article related to the search topic.",
            Self::Code => "Open source project related to the search topic.",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title used when a source item has none
pub const UNTITLED: &str = "Untitled";

/// Date text used when a source item has none
pub const UNKNOWN_DATE: &str = "Unknown";

/// Normalized result unit returned by every source adapter
///
/// Serialized field names (`source`, `date`, `type`) are the ones the
/// front end reads. `published_at` is the source's native date text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub title: String,
    #[serde(rename = "source")]
    pub source_label: String,
    pub url: String,
    #[serde(rename = "date")]
    pub published_at: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_comments: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u64>,
}

impl ContentRecord {
    /// Build a record, substituting placeholders for missing text.
    ///
    /// `url` falls back to `fallback_url` when absent or blank; the date
    /// defaults to [`UNKNOWN_DATE`] and the snippet to the type placeholder
    /// until set with the builder methods below.
    #[must_use]
    pub fn new(
        content_type: ContentType,
        source_label: String,
        title: Option<&str>,
        url: Option<&str>,
        fallback_url: &str,
    ) -> Self {
        Self {
            title: normalize::text_or(title, UNTITLED),
            source_label,
            url: normalize::text_or(url, fallback_url),
            published_at: UNKNOWN_DATE.to_string(),
            content_type,
            snippet: content_type.placeholder_snippet().to_string(),
            score: None,
            num_comments: None,
            stars: None,
        }
    }

    #[must_use]
    pub fn published_at(mut self, date: Option<&str>) -> Self {
        self.published_at = normalize::text_or(date, UNKNOWN_DATE);
        self
    }

    /// Set the snippet from source text, truncating long descriptions
    #[must_use]
    pub fn snippet(mut self, text: Option<&str>) -> Self {
        self.snippet = normalize::snippet_or_placeholder(text, self.content_type);
        self
    }

    #[must_use]
    pub const fn with_score(mut self, score: i64) -> Self {
        self.score = Some(score);
        self
    }

    #[must_use]
    pub const fn with_num_comments(mut self, num_comments: u64) -> Self {
        self.num_comments = Some(num_comments);
        self
    }

    #[must_use]
    pub const fn with_stars(mut self, stars: u64) -> Self {
        self.stars = Some(stars);
        self
    }
}

/// Build a `"{category}: {origin}"` provenance label
#[must_use]
pub fn source_label(category: &str, origin: Option<&str>, default_origin: &str) -> String {
    format!("{category}: {}", normalize::text_or(origin, default_origin))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_placeholders() {
        let record = ContentRecord::new(
            ContentType::Research,
            source_label("Research", None, "PubMed"),
            Some("   "),
            None,
            "https://pubmed.ncbi.nlm.nih.gov/",
        );

        assert_eq!(record.title, UNTITLED);
        assert_eq!(record.source_label, "Research: PubMed");
        assert_eq!(record.url, "https://pubmed.ncbi.nlm.nih.gov/");
        assert_eq!(record.published_at, UNKNOWN_DATE);
        assert_eq!(record.snippet, ContentType::Research.placeholder_snippet());
    }

    #[test]
    fn test_record_serializes_with_front_end_field_names() {
        let record = ContentRecord::new(
            ContentType::Code,
            source_label("GitHub", Some("octocat"), "GitHub"),
            Some("octocat/hello"),
            Some("https://github.com/octocat/hello"),
            "https://github.com",
        )
        .published_at(Some("2024-01-01T00:00:00Z"))
        .with_stars(42);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "code");
        assert_eq!(value["source"], "GitHub: octocat");
        assert_eq!(value["date"], "2024-01-01T00:00:00Z");
        assert_eq!(value["stars"], 42);
        assert!(value.get("score").is_none());
    }

    #[test]
    fn test_content_type_round_trip_names() {
        for content_type in ContentType::ALL {
            let json = serde_json::to_string(&content_type).unwrap();
            assert_eq!(json, format!("\"{}\"", content_type.as_str()));
        }
    }
}
