use super::statistics::{BulkStatistics, SearchStatistics};
use crate::client::{
    BulkSearchResult, ContentRecord, ContentType, MetaSearchClient, ProviderFailure,
    SearchSession, SourceInfo,
};
use crate::{Error, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Longest accepted search term, in characters
const MAX_TERM_LEN: usize = 1000;

/// Body of a multi-topic search request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchInput {
    #[serde(rename = "searchTerms", default)]
    pub search_terms: Vec<String>,
}

/// Body of a bulk search request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkSearchInput {
    #[serde(rename = "searchTerms", default)]
    pub search_terms: Vec<String>,
    /// Allow-list of source names; absent or empty means all
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub results: Vec<ContentRecord>,
    pub total_count: usize,
    pub source_types: Vec<ContentType>,
    /// Number of distinct record types present
    pub sources_searched: usize,
    pub type_counts: BTreeMap<ContentType, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkSearchResponse {
    pub success: bool,
    pub results: Vec<ContentRecord>,
    pub results_by_source: BTreeMap<String, Vec<ContentRecord>>,
    pub statistics: BulkStatistics,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provider_errors: Vec<ProviderFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceSearchResponse {
    pub success: bool,
    pub results: Vec<ContentRecord>,
}

/// Source catalog, serialized as an object keyed by source name in
/// invocation order
#[derive(Debug, Clone)]
pub struct SourceCatalog(pub Vec<SourceInfo>);

impl Serialize for SourceCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a> {
            name: &'a str,
            description: &'a str,
            #[serde(rename = "type")]
            content_type: ContentType,
            requires_api_key: bool,
        }

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for info in &self.0 {
            map.serialize_entry(
                &info.name,
                &Entry {
                    name: &info.display_name,
                    description: &info.description,
                    content_type: info.content_type,
                    requires_api_key: info.requires_api_key,
                },
            )?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourcesResponse {
    pub sources: SourceCatalog,
    pub total_sources: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub reddit_connected: bool,
    pub available_sources: Vec<String>,
}

/// Request-level search operations over the orchestrator
#[derive(Clone)]
pub struct SearchTool {
    client: Arc<MetaSearchClient>,
    session: Arc<SearchSession>,
}

impl std::fmt::Debug for SearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchTool")
            .field("providers", &self.client.providers())
            .field("session", &self.session)
            .finish()
    }
}

impl SearchTool {
    pub fn new(client: Arc<MetaSearchClient>, session: Arc<SearchSession>) -> Self {
        info!("Initializing search tool");
        Self { client, session }
    }

    /// Search every source for every term
    #[instrument(skip(self), fields(terms = input.search_terms.len()))]
    pub async fn search(&self, input: SearchInput) -> Result<SearchResponse> {
        let terms = Self::validate_terms(&input.search_terms)?;
        let start_time = Instant::now();

        let results = self.client.search_topics(&terms, &self.session).await;
        let stats = SearchStatistics::from_records(&results);

        info!(
            "Search completed in {}ms, found {} results",
            start_time.elapsed().as_millis(),
            stats.total_count
        );

        Ok(SearchResponse {
            success: true,
            total_count: stats.total_count,
            sources_searched: stats.source_types.len(),
            source_types: stats.source_types,
            type_counts: stats.type_counts,
            results,
        })
    }

    /// Search the allowed sources for every term with a per-source breakdown
    #[instrument(skip(self), fields(terms = input.search_terms.len()))]
    pub async fn bulk_search(&self, input: BulkSearchInput) -> Result<BulkSearchResponse> {
        let terms = Self::validate_terms(&input.search_terms)?;

        let BulkSearchResult {
            results,
            by_source,
            provider_errors,
        } = self
            .client
            .bulk_search(&terms, input.sources.as_deref(), &self.session)
            .await;

        let statistics = BulkStatistics::new(&results, &by_source, &terms);
        Ok(BulkSearchResponse {
            success: true,
            results,
            results_by_source: by_source,
            statistics,
            provider_errors,
        })
    }

    /// Search a single source addressed by its route name
    #[instrument(skip(self))]
    pub async fn search_source(&self, source: &str, term: &str) -> Result<SourceSearchResponse> {
        let terms = Self::validate_terms(&[term.to_string()])?;
        let results = self
            .client
            .search_source(source, &terms[0], &self.session)
            .await?;

        Ok(SourceSearchResponse {
            success: true,
            results,
        })
    }

    pub fn sources(&self) -> SourcesResponse {
        let catalog = self.client.catalog();
        SourcesResponse {
            total_sources: catalog.len(),
            sources: SourceCatalog(catalog),
        }
    }

    /// Liveness report including session state
    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            message: "Sound Mind API is working!".to_string(),
            reddit_connected: self.session.is_reddit_connected(),
            available_sources: self
                .client
                .catalog()
                .into_iter()
                .map(|info| info.display_name)
                .collect(),
        }
    }

    /// Trim terms, drop blank ones and reject an empty remainder
    fn validate_terms(terms: &[String]) -> Result<Vec<String>> {
        let terms: Vec<String> = terms
            .iter()
            .map(|term| term.trim())
            .filter(|term| !term.is_empty())
            .map(str::to_string)
            .collect();

        if terms.is_empty() {
            return Err(Error::InvalidInput {
                field: "searchTerms".to_string(),
                reason: "No search terms provided".to_string(),
            });
        }

        for term in &terms {
            if term.chars().count() > MAX_TERM_LEN {
                return Err(Error::InvalidInput {
                    field: "searchTerms".to_string(),
                    reason: format!("Search term too long (max {MAX_TERM_LEN} characters)"),
                });
            }

            if term.contains('\0') || term.contains('\x1b') {
                return Err(Error::InvalidInput {
                    field: "searchTerms".to_string(),
                    reason: "Search term contains invalid characters".to_string(),
                });
            }
        }

        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::providers::{ProviderError, SearchContext, SearchQuery, SourceProvider};
    use crate::client::{source_label, MetaSearchConfig};
    use async_trait::async_trait;

    struct StaticProvider {
        name: &'static str,
        route: &'static str,
        content_type: ContentType,
    }

    #[async_trait]
    impl SourceProvider for StaticProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn route_name(&self) -> &str {
            self.route
        }

        fn display_name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "static"
        }

        fn content_type(&self) -> ContentType {
            self.content_type
        }

        async fn fetch(
            &self,
            query: &SearchQuery,
            _context: &SearchContext,
        ) -> std::result::Result<Vec<ContentRecord>, ProviderError> {
            Ok(vec![ContentRecord::new(
                self.content_type,
                source_label("Static", Some(self.name), "Static"),
                Some(&query.query),
                Some("https://example.com"),
                "https://example.com",
            )])
        }
    }

    fn create_test_search_tool() -> SearchTool {
        let providers: Vec<Arc<dyn SourceProvider>> = vec![
            Arc::new(StaticProvider {
                name: "pubmed",
                route: "research",
                content_type: ContentType::Research,
            }),
            Arc::new(StaticProvider {
                name: "github",
                route: "github",
                content_type: ContentType::Code,
            }),
        ];
        let client = MetaSearchClient::with_providers(providers, MetaSearchConfig::default());
        SearchTool::new(Arc::new(client), Arc::new(SearchSession::anonymous()))
    }

    #[test]
    fn test_search_terms_validation() {
        assert!(SearchTool::validate_terms(&[]).is_err());
        assert!(SearchTool::validate_terms(&[String::new(), "  ".to_string()]).is_err());
        assert!(SearchTool::validate_terms(&["a".repeat(1001)]).is_err());
        assert!(SearchTool::validate_terms(&["bad\0term".to_string()]).is_err());

        let terms = SearchTool::validate_terms(&[" calm ".to_string(), String::new()]).unwrap();
        assert_eq!(terms, ["calm"]);
    }

    #[test]
    fn test_term_length_counts_characters() {
        // 1000 three-byte characters is within the limit
        let cjk = "音".repeat(1000);
        assert!(cjk.len() > 1000);
        assert!(SearchTool::validate_terms(&[cjk]).is_ok());

        let err = SearchTool::validate_terms(&["音".repeat(1001)]).unwrap_err();
        assert!(err.to_string().contains("max 1000 characters"));
    }

    #[tokio::test]
    async fn test_search_reports_statistics() {
        let tool = create_test_search_tool();
        let response = tool
            .search(SearchInput {
                search_terms: vec!["one".to_string(), "two".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(response.total_count, 4);
        assert_eq!(response.sources_searched, 2);
        assert_eq!(response.type_counts[&ContentType::Research], 2);
        assert_eq!(response.results[0].title, "one");
        assert_eq!(response.results[2].title, "two");
    }

    #[tokio::test]
    async fn test_search_source_by_route_name() {
        let tool = create_test_search_tool();
        let response = tool.search_source("research", "sleep").await.unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].content_type, ContentType::Research);

        let err = tool.search_source("unknown", "sleep").await.unwrap_err();
        assert!(matches!(err, Error::UnknownSource { .. }));
    }

    #[test]
    fn test_sources_catalog_shape() {
        let tool = create_test_search_tool();
        let json = serde_json::to_value(tool.sources()).unwrap();
        assert_eq!(json["total_sources"], 2);
        assert_eq!(json["sources"]["pubmed"]["type"], "research");
        assert_eq!(json["sources"]["github"]["requires_api_key"], false);

        let status = tool.status();
        assert!(!status.reddit_connected);
        assert_eq!(status.available_sources, ["pubmed", "github"]);
    }
}
