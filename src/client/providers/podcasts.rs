use super::http;
use super::traits::{ProviderError, SearchContext, SearchQuery, SourceProvider};
use crate::client::{source_label, ContentRecord, ContentType, HttpClientConfig};
use crate::config::PodcastSourceConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

#[derive(Debug, Deserialize)]
struct ItunesResponse {
    #[serde(default)]
    results: Vec<ItunesPodcast>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesPodcast {
    collection_name: Option<String>,
    track_name: Option<String>,
    artist_name: Option<String>,
    collection_view_url: Option<String>,
    track_view_url: Option<String>,
    release_date: Option<String>,
    primary_genre_name: Option<String>,
}

/// Apple Podcasts directory provider
pub struct PodcastProvider {
    client: Client,
    config: PodcastSourceConfig,
}

impl PodcastProvider {
    pub fn new(config: PodcastSourceConfig, http: &HttpClientConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http.build()?,
            config,
        })
    }

    fn build_search_url(&self, query: &SearchQuery) -> Result<Url, ProviderError> {
        let limit = self.config.limit.to_string();
        Url::parse_with_params(
            &self.config.endpoint,
            &[
                ("term", query.query.as_str()),
                ("media", "podcast"),
                ("limit", limit.as_str()),
            ],
        )
        .map_err(|e| ProviderError::Other(format!("Invalid base URL: {e}")))
    }

    fn convert_podcast(podcast: ItunesPodcast) -> ContentRecord {
        let title = podcast.collection_name.or(podcast.track_name);
        let url = podcast.collection_view_url.or(podcast.track_view_url);
        let snippet = podcast
            .primary_genre_name
            .map(|genre| format!("{genre} podcast"));

        ContentRecord::new(
            ContentType::Podcast,
            source_label("Podcast", podcast.artist_name.as_deref(), "Apple Podcasts"),
            title.as_deref(),
            url.as_deref(),
            "https://podcasts.apple.com",
        )
        .published_at(podcast.release_date.as_deref())
        .snippet(snippet.as_deref())
    }
}

#[async_trait]
impl SourceProvider for PodcastProvider {
    fn name(&self) -> &str {
        "podcasts"
    }

    fn display_name(&self) -> &str {
        "iTunes/Apple Podcasts"
    }

    fn description(&self) -> &str {
        "Podcast episodes and shows"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Podcast
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        _context: &SearchContext,
    ) -> Result<Vec<ContentRecord>, ProviderError> {
        let url = self.build_search_url(query)?;
        debug!("Podcast search URL: {}", url);

        let response: ItunesResponse = http::get_json(self.client.get(url), "iTunes").await?;
        Ok(response
            .results
            .into_iter()
            .map(Self::convert_podcast)
            .collect())
    }
}
