use super::feed::{self, AtomEntry};
use super::http;
use super::traits::{ProviderError, SearchContext, SearchQuery, SourceProvider};
use crate::client::{normalize, source_label, ContentRecord, ContentType, HttpClientConfig};
use crate::config::YoutubeSourceConfig;
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

/// `sp` filter value that orders YouTube results by upload date
const SORT_BY_UPLOAD_DATE: &str = "CAI=";

/// YouTube provider reading a fixed set of channel feeds.
///
/// Never returns an empty list: when no channel entry matches the topic it
/// returns search-link records pointing at the YouTube results page.
pub struct YoutubeProvider {
    client: Client,
    config: YoutubeSourceConfig,
}

impl YoutubeProvider {
    pub fn new(config: YoutubeSourceConfig, http: &HttpClientConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http.build()?,
            config,
        })
    }

    fn build_feed_url(&self, channel_id: &str) -> Result<Url, ProviderError> {
        Url::parse_with_params(&self.config.feed_url, &[("channel_id", channel_id)])
            .map_err(|e| ProviderError::Other(format!("Invalid feed URL: {e}")))
    }

    fn search_link_url(&self, query: &SearchQuery, sort: Option<&str>) -> String {
        let mut params = vec![("search_query", query.query.as_str())];
        if let Some(sort) = sort {
            params.push(("sp", sort));
        }
        Url::parse_with_params(&self.config.search_url, &params)
            .map_or_else(|_| self.config.search_url.clone(), String::from)
    }

    fn search_link(
        &self,
        query: &SearchQuery,
        title: &str,
        snippet: &str,
        sort: Option<&str>,
    ) -> ContentRecord {
        ContentRecord::new(
            ContentType::Video,
            source_label("YouTube", Some("Search"), "Search"),
            Some(title),
            Some(&self.search_link_url(query, sort)),
            "https://www.youtube.com",
        )
        .published_at(Some("Live search"))
        .snippet(Some(snippet))
    }

    /// Synthetic records linking to the YouTube results page for the topic
    #[must_use]
    pub fn search_links(&self, query: &SearchQuery) -> Vec<ContentRecord> {
        vec![
            self.search_link(
                query,
                &format!("YouTube videos about {}", query.query),
                &format!("Browse YouTube videos about {}.", query.query),
                None,
            ),
            self.search_link(
                query,
                &format!("Latest YouTube uploads about {}", query.query),
                &format!("The most recent YouTube uploads about {}.", query.query),
                Some(SORT_BY_UPLOAD_DATE),
            ),
        ]
    }

    fn convert_entry(entry: AtomEntry) -> ContentRecord {
        ContentRecord::new(
            ContentType::Video,
            source_label("YouTube", entry.author.as_deref(), "Channel"),
            entry.title.as_deref(),
            entry.link.as_deref(),
            "https://www.youtube.com",
        )
        .published_at(entry.published.as_deref())
        .snippet(entry.summary.as_deref())
    }

    /// Channel entries whose title contains at least one topic word
    fn matching_entries(
        &self,
        xml: &str,
        words: &[String],
    ) -> Result<Vec<ContentRecord>, ProviderError> {
        let records = feed::parse_atom(xml)?
            .into_iter()
            .filter(|entry| {
                entry
                    .title
                    .as_deref()
                    .is_some_and(|title| normalize::matches_topic(title, words))
            })
            .take(self.config.max_entries_per_channel)
            .map(Self::convert_entry)
            .collect();
        Ok(records)
    }

    async fn search_channel(
        &self,
        channel_id: &str,
        words: &[String],
    ) -> Result<Vec<ContentRecord>, ProviderError> {
        let url = self.build_feed_url(channel_id)?;
        debug!("Fetching YouTube channel feed: {}", url);

        let xml = http::get_text(self.client.get(url), "YouTube").await?;
        self.matching_entries(&xml, words)
    }
}

#[async_trait]
impl SourceProvider for YoutubeProvider {
    fn name(&self) -> &str {
        "youtube"
    }

    fn display_name(&self) -> &str {
        "YouTube"
    }

    fn description(&self) -> &str {
        "Video content from selected channels"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Video
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        _context: &SearchContext,
    ) -> Result<Vec<ContentRecord>, ProviderError> {
        let words = query.words();
        let channels = join_all(
            self.config
                .channel_ids
                .iter()
                .map(|channel_id| self.search_channel(channel_id, &words)),
        )
        .await;

        let mut records = Vec::new();
        for (channel_id, outcome) in self.config.channel_ids.iter().zip(channels) {
            match outcome {
                Ok(entries) => {
                    debug!("Channel {} matched {} entries", channel_id, entries.len());
                    records.extend(entries);
                }
                Err(e) => warn!("Skipping YouTube channel {}: {}", channel_id, e),
            }
        }

        if records.is_empty() {
            info!(
                "No channel videos matched '{}', returning search links",
                query.query
            );
            return Ok(self.search_links(query));
        }

        Ok(records)
    }

    fn fallback(&self, query: &SearchQuery, _error: &ProviderError) -> Vec<ContentRecord> {
        self.search_links(query).into_iter().take(1).collect()
    }
}
