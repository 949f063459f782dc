use super::http;
use super::traits::{ProviderError, SearchContext, SearchQuery, SourceProvider};
use crate::client::{source_label, ContentRecord, ContentType, HttpClientConfig};
use crate::config::ScholarSourceConfig;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

/// Google Scholar provider.
///
/// Scholar has no public API. The provider performs one request so that
/// reachability shows up in the logs, discards the body, and always answers
/// with a single record linking to the live results page.
pub struct ScholarProvider {
    client: Client,
    config: ScholarSourceConfig,
}

impl ScholarProvider {
    pub fn new(config: ScholarSourceConfig, http: &HttpClientConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http.build()?,
            config,
        })
    }

    fn build_search_url(&self, query: &SearchQuery) -> Result<Url, ProviderError> {
        Url::parse_with_params(
            &self.config.search_url,
            &[("q", query.query.as_str()), ("hl", "en")],
        )
        .map_err(|e| ProviderError::Other(format!("Invalid search URL: {e}")))
    }

    fn search_link(query: &SearchQuery, url: &str) -> ContentRecord {
        ContentRecord::new(
            ContentType::Academic,
            source_label("Scholar", Some("Google Scholar"), "Google Scholar"),
            Some(&format!("Google Scholar results for \"{}\"", query.query)),
            Some(url),
            "https://scholar.google.com",
        )
        .published_at(Some("Various"))
        .snippet(Some(&format!(
            "Academic papers and citations about {} on Google Scholar.",
            query.query
        )))
    }
}

#[async_trait]
impl SourceProvider for ScholarProvider {
    fn name(&self) -> &str {
        "scholar"
    }

    fn display_name(&self) -> &str {
        "Google Scholar"
    }

    fn description(&self) -> &str {
        "Academic papers and citations"
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
        debug!("Google Scholar URL: {}", url);

        // Reachability check only; results are not extracted
        match http::send(self.client.get(url.clone()), "Google Scholar").await {
            Ok(response) => info!("Google Scholar responded with {}", response.status()),
            Err(e) => warn!("Google Scholar request failed: {}", e),
        }

        Ok(vec![Self::search_link(query, url.as_str())])
    }
}
