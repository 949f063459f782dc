use super::feed::{self, RssItem};
use super::http;
use super::traits::{ProviderError, SearchContext, SearchQuery, SourceProvider};
use crate::client::{normalize, source_label, ContentRecord, ContentType, HttpClientConfig};
use crate::config::MediumSourceConfig;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

/// Medium provider reading tag RSS feeds
pub struct MediumProvider {
    client: Client,
    config: MediumSourceConfig,
}

impl MediumProvider {
    pub fn new(config: MediumSourceConfig, http: &HttpClientConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http.build()?,
            config,
        })
    }

    /// Medium tag slug for a topic: lower-cased, spaces replaced by hyphens
    #[must_use]
    pub fn topic_tag(topic: &str) -> String {
        topic
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }

    fn tag_feed_url(&self, tag: &str) -> String {
        format!(
            "{}/{}",
            self.config.tag_feed_url.trim_end_matches('/'),
            urlencoding::encode(tag)
        )
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<RssItem>, ProviderError> {
        debug!("Fetching Medium feed: {}", url);
        let xml = http::get_text(self.client.get(url), "Medium").await?;
        feed::parse_rss(&xml)
    }

    fn convert_item(item: RssItem, description: Option<&str>) -> ContentRecord {
        ContentRecord::new(
            ContentType::Blog,
            source_label("Medium", item.creator.as_deref(), "Blog"),
            item.title.as_deref(),
            item.link.as_deref(),
            "https://medium.com",
        )
        .published_at(item.pub_date.as_deref())
        .snippet(description)
    }

    /// Items whose title or description mentions a topic word, capped
    fn relevant_records(&self, items: Vec<RssItem>, words: &[String]) -> Vec<ContentRecord> {
        items
            .into_iter()
            .filter_map(|item| {
                let title = item.title.clone().unwrap_or_default();
                let description = item.description.as_deref().map(normalize::strip_html);
                let relevant = normalize::matches_topic(&title, words)
                    || description
                        .as_deref()
                        .is_some_and(|d| normalize::matches_topic(d, words));
                relevant.then(|| Self::convert_item(item, description.as_deref()))
            })
            .take(self.config.max_results)
            .collect()
    }
}

#[async_trait]
impl SourceProvider for MediumProvider {
    fn name(&self) -> &str {
        "medium"
    }

    fn display_name(&self) -> &str {
        "Medium"
    }

    fn description(&self) -> &str {
        "Blog articles and personal experiences"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Blog
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        _context: &SearchContext,
    ) -> Result<Vec<ContentRecord>, ProviderError> {
        let tag_url = self.tag_feed_url(&Self::topic_tag(&query.query));

        let items = match self.fetch_feed(&tag_url).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Medium tag feed unavailable ({}), using fallback feed", e);
                let fallback_url = self.tag_feed_url(&self.config.fallback_tag);
                self.fetch_feed(&fallback_url).await?
            }
        };

        info!("Medium feed returned {} items", items.len());
        Ok(self.relevant_records(items, &query.words()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MediumProvider {
        MediumProvider::new(MediumSourceConfig::default(), &HttpClientConfig::default()).unwrap()
    }

    fn item(title: &str, description: Option<&str>) -> RssItem {
        RssItem {
            title: Some(title.to_string()),
            link: Some(format!("https://medium.com/p/{}", title.len())),
            description: description.map(str::to_string),
            ..RssItem::default()
        }
    }

    #[test]
    fn test_topic_tag() {
        assert_eq!(MediumProvider::topic_tag("Sound Healing"), "sound-healing");
        assert_eq!(
            provider().tag_feed_url("sound-healing"),
            "https://medium.com/feed/tag/sound-healing"
        );
    }

    #[test]
    fn test_only_relevant_titles_are_kept() {
        let items = vec![
            item("Binaural Beats for Sleep", None),
            item("Unrelated Article", Some("<p>Cooking pasta</p>")),
        ];
        let records = provider().relevant_records(items, &normalize::topic_words("binaural beats"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Binaural Beats for Sleep");
    }

    #[test]
    fn test_description_match_counts() {
        let items = vec![item(
            "My evening routine",
            Some("<p>I listen to <em>binaural</em> tracks</p>"),
        )];
        let records = provider().relevant_records(items, &normalize::topic_words("binaural beats"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].snippet, "I listen to binaural tracks");
    }

    #[test]
    fn test_results_are_capped() {
        let items = (0..10)
            .map(|i| item(&format!("Sound healing part {i}"), None))
            .collect();
        let records = provider().relevant_records(items, &normalize::topic_words("sound"));
        assert_eq!(records.len(), 3);
    }
}
