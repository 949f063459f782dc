use super::feed::{self, AtomEntry};
use super::http;
use super::traits::{ProviderError, SearchContext, SearchQuery, SourceProvider};
use crate::client::{source_label, ContentRecord, ContentType, HttpClientConfig};
use crate::config::ArxivSourceConfig;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

/// arXiv API provider for preprints
pub struct ArxivProvider {
    client: Client,
    config: ArxivSourceConfig,
}

impl ArxivProvider {
    /// Create a new arXiv provider
    pub fn new(config: ArxivSourceConfig, http: &HttpClientConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http.build()?,
            config,
        })
    }

    /// Build arXiv API URL for search
    fn build_search_url(&self, query: &SearchQuery) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.config.endpoint)
            .map_err(|e| ProviderError::Other(format!("Invalid base URL: {e}")))?;

        // Search title, abstract and comments for the whole phrase
        url.query_pairs_mut()
            .append_pair("search_query", &format!("all:\"{}\"", query.query))
            .append_pair("start", "0")
            .append_pair("max_results", &self.config.max_results.to_string())
            .append_pair("sortBy", "relevance")
            .append_pair("sortOrder", "descending");

        Ok(url)
    }

    fn convert_entry(entry: AtomEntry) -> ContentRecord {
        let link = entry.link.or(entry.id);
        ContentRecord::new(
            ContentType::Academic,
            source_label("arXiv", entry.category.as_deref(), "Preprint"),
            entry.title.as_deref(),
            link.as_deref(),
            "https://arxiv.org",
        )
        .published_at(entry.published.as_deref())
        .snippet(entry.summary.as_deref())
    }

    /// Parse arXiv Atom feed response
    fn parse_response(response_text: &str) -> Result<Vec<ContentRecord>, ProviderError> {
        let records: Vec<ContentRecord> = feed::parse_atom(response_text)?
            .into_iter()
            .map(Self::convert_entry)
            .collect();

        debug!("Parsed {} papers from arXiv response", records.len());
        Ok(records)
    }
}

#[async_trait]
impl SourceProvider for ArxivProvider {
    fn name(&self) -> &str {
        "arxiv"
    }

    fn display_name(&self) -> &str {
        "arXiv"
    }

    fn description(&self) -> &str {
        "Preprint academic papers"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Academic
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        _context: &SearchContext,
    ) -> Result<Vec<ContentRecord>, ProviderError> {
        let url = self.build_search_url(query)?;
        debug!("arXiv search URL: {}", url);

        let response_text = http::get_text(self.client.get(url), "arXiv").await?;
        let records = Self::parse_response(&response_text)?;

        info!("arXiv search completed: {} papers found", records.len());
        Ok(records)
    }
}
