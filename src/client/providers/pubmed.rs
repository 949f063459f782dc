use super::http;
use super::traits::{ProviderError, SearchContext, SearchQuery, SourceProvider};
use crate::client::{source_label, ContentRecord, ContentType, HttpClientConfig};
use crate::config::PubmedSourceConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};
use url::Url;

const ARTICLE_BASE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    esearchresult: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    /// Keyed by PMID; also holds a `uids` array, hence the loose value type
    #[serde(default)]
    result: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ArticleSummary {
    title: Option<String>,
    source: Option<String>,
    pubdate: Option<String>,
    #[serde(default)]
    authors: Vec<ArticleAuthor>,
}

#[derive(Debug, Deserialize)]
struct ArticleAuthor {
    name: Option<String>,
}

/// PubMed E-utilities provider for peer-reviewed research
pub struct PubmedProvider {
    client: Client,
    config: PubmedSourceConfig,
}

impl PubmedProvider {
    pub fn new(config: PubmedSourceConfig, http: &HttpClientConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http.build()?,
            config,
        })
    }

    fn build_search_url(&self, query: &SearchQuery) -> Result<Url, ProviderError> {
        let retmax = self.config.max_results.to_string();
        Url::parse_with_params(
            &self.config.search_url,
            &[
                ("db", "pubmed"),
                ("term", query.query.as_str()),
                ("retmax", retmax.as_str()),
                ("retmode", "json"),
            ],
        )
        .map_err(|e| ProviderError::Other(format!("Invalid search URL: {e}")))
    }

    fn build_summary_url(&self, ids: &[String]) -> Result<Url, ProviderError> {
        let id_list = ids.join(",");
        Url::parse_with_params(
            &self.config.summary_url,
            &[
                ("db", "pubmed"),
                ("id", id_list.as_str()),
                ("retmode", "json"),
            ],
        )
        .map_err(|e| ProviderError::Other(format!("Invalid summary URL: {e}")))
    }

    fn convert_summary(pmid: &str, summary: &ArticleSummary) -> ContentRecord {
        let authors = summary
            .authors
            .iter()
            .filter_map(|a| a.name.as_deref())
            .take(3)
            .collect::<Vec<_>>()
            .join(", ");
        let snippet = (!authors.is_empty()).then(|| format!("Authors: {authors}"));

        ContentRecord::new(
            ContentType::Research,
            source_label("Research", summary.source.as_deref(), "PubMed"),
            Some(summary.title.as_deref().unwrap_or("No title")),
            Some(&format!("{ARTICLE_BASE_URL}/{pmid}/")),
            ARTICLE_BASE_URL,
        )
        .published_at(summary.pubdate.as_deref())
        .snippet(snippet.as_deref())
    }

    /// Records for the summaries present, in ID order
    fn convert_summaries(ids: &[String], response: &SummaryResponse) -> Vec<ContentRecord> {
        ids.iter()
            .filter_map(|pmid| {
                let value = response.result.get(pmid)?;
                let summary = ArticleSummary::deserialize(value).unwrap_or_default();
                Some(Self::convert_summary(pmid, &summary))
            })
            .collect()
    }
}

#[async_trait]
impl SourceProvider for PubmedProvider {
    fn name(&self) -> &str {
        "pubmed"
    }

    fn route_name(&self) -> &str {
        "research"
    }

    fn display_name(&self) -> &str {
        "PubMed"
    }

    fn description(&self) -> &str {
        "Peer-reviewed medical and scientific research"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Research
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        _context: &SearchContext,
    ) -> Result<Vec<ContentRecord>, ProviderError> {
        let search_url = self.build_search_url(query)?;
        debug!("PubMed search URL: {}", search_url);

        let search: SearchResponse = http::get_json(self.client.get(search_url), "PubMed").await?;
        let ids = search.esearchresult.map(|r| r.idlist).unwrap_or_default();

        if ids.is_empty() {
            info!("No PubMed articles found for '{}'", query.query);
            return Ok(Vec::new());
        }
        info!("PubMed found {} article ids", ids.len());

        let summary_url = self.build_summary_url(&ids)?;
        let summaries: SummaryResponse =
            http::get_json(self.client.get(summary_url), "PubMed").await?;

        Ok(Self::convert_summaries(&ids, &summaries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_summaries_keeps_id_order() {
        let ids = vec!["222".to_string(), "111".to_string(), "333".to_string()];
        let response: SummaryResponse = serde_json::from_value(json!({
            "result": {
                "uids": ["111", "222"],
                "111": {"title": "First", "source": "J Acoust", "pubdate": "2023 Jan"},
                "222": {"source": "Sleep Med", "authors": [{"name": "Smith J"}, {"name": "Doe A"}]}
            }
        }))
        .unwrap();

        let records = PubmedProvider::convert_summaries(&ids, &response);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].title, "No title");
        assert_eq!(records[0].source_label, "Research: Sleep Med");
        assert_eq!(records[0].url, "https://pubmed.ncbi.nlm.nih.gov/222/");
        assert_eq!(records[0].published_at, "Unknown");
        assert_eq!(records[0].snippet, "Authors: Smith J, Doe A");

        assert_eq!(records[1].title, "First");
        assert_eq!(records[1].published_at, "2023 Jan");
    }

    #[test]
    fn test_summary_url_joins_ids() {
        let provider =
            PubmedProvider::new(PubmedSourceConfig::default(), &HttpClientConfig::default())
                .unwrap();
        let url = provider
            .build_summary_url(&["1".to_string(), "2".to_string()])
            .unwrap()
            .to_string();
        assert!(url.contains("id=1%2C2"));
        assert!(url.contains("retmode=json"));
    }
}
