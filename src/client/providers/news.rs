use super::http;
use super::traits::{ProviderError, SearchContext, SearchQuery, SourceProvider};
use crate::client::{source_label, ContentRecord, ContentType, HttpClientConfig};
use crate::config::NewsSourceConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsArticle {
    source: Option<NewsArticleSource>,
    title: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsArticleSource {
    name: Option<String>,
}

/// NewsAPI provider for recent press coverage
pub struct NewsProvider {
    client: Client,
    config: NewsSourceConfig,
    api_key: Option<String>,
}

impl NewsProvider {
    pub fn new(
        config: NewsSourceConfig,
        api_key: Option<String>,
        http: &HttpClientConfig,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http.build()?,
            config,
            api_key,
        })
    }

    fn build_search_url(&self, query: &SearchQuery) -> Result<Url, ProviderError> {
        let page_size = self.config.page_size.to_string();
        Url::parse_with_params(
            &self.config.endpoint,
            &[
                ("q", query.query.as_str()),
                ("sortBy", self.config.sort_by.as_str()),
                ("pageSize", page_size.as_str()),
            ],
        )
        .map_err(|e| ProviderError::Other(format!("Invalid base URL: {e}")))
    }

    fn convert_article(article: NewsArticle) -> ContentRecord {
        let publication = article.source.and_then(|s| s.name);
        ContentRecord::new(
            ContentType::News,
            source_label("News", publication.as_deref(), "Unknown"),
            article.title.as_deref(),
            article.url.as_deref(),
            "https://newsapi.org",
        )
        .published_at(article.published_at.as_deref())
        .snippet(article.description.as_deref())
    }
}

#[async_trait]
impl SourceProvider for NewsProvider {
    fn name(&self) -> &str {
        "news"
    }

    fn display_name(&self) -> &str {
        "NewsAPI"
    }

    fn description(&self) -> &str {
        "Latest news articles from various publications"
    }

    fn content_type(&self) -> ContentType {
        ContentType::News
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        _context: &SearchContext,
    ) -> Result<Vec<ContentRecord>, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            info!("NEWS_API_KEY not configured, skipping news search");
            return Ok(Vec::new());
        };

        let url = self.build_search_url(query)?;
        debug!("News search URL: {}", url);

        let response: NewsResponse = http::get_json(
            self.client.get(url).header("X-Api-Key", api_key),
            "NewsAPI",
        )
        .await?;

        debug!("NewsAPI returned {} articles", response.articles.len());
        Ok(response
            .articles
            .into_iter()
            .map(Self::convert_article)
            .collect())
    }
}
