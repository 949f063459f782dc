use crate::client::providers::{
    default_providers, ProviderError, ProviderResult, SearchContext, SearchQuery, SourceProvider,
};
use crate::client::{ContentRecord, ContentType, SearchSession};
use crate::config::{Config, SearchConfig};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Configuration for meta-search behavior
#[derive(Debug, Clone)]
pub struct MetaSearchConfig {
    /// Maximum number of providers to query in parallel
    pub max_parallel_providers: usize,
    /// Timeout for each provider
    pub provider_timeout: Duration,
}

impl Default for MetaSearchConfig {
    fn default() -> Self {
        Self {
            max_parallel_providers: 9,
            provider_timeout: Duration::from_secs(45),
        }
    }
}

impl From<&SearchConfig> for MetaSearchConfig {
    fn from(search: &SearchConfig) -> Self {
        Self {
            max_parallel_providers: search.max_parallel_providers.max(1),
            provider_timeout: search.provider_timeout(),
        }
    }
}

/// An adapter failure absorbed during a fan-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailure {
    pub source: String,
    pub topic: String,
    pub error: String,
}

/// Result of a bulk search across topics
#[derive(Debug, Clone, Default)]
pub struct BulkSearchResult {
    /// All records, topic by topic, each topic in provider order
    pub results: Vec<ContentRecord>,
    /// Records grouped by source name; one key per adapter that ran
    pub by_source: BTreeMap<String, Vec<ContentRecord>>,
    /// Failures absorbed along the way
    pub provider_errors: Vec<ProviderFailure>,
}

/// Catalog entry describing one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub route_name: String,
    pub display_name: String,
    pub description: String,
    pub content_type: ContentType,
    pub requires_api_key: bool,
}

/// Client that fans a topic out to every content source
pub struct MetaSearchClient {
    providers: Vec<Arc<dyn SourceProvider>>,
    config: MetaSearchConfig,
}

impl MetaSearchClient {
    /// Create a client with the production adapters
    pub fn new(app_config: &Config) -> Result<Self> {
        let providers = default_providers(app_config)?;
        Ok(Self::with_providers(
            providers,
            MetaSearchConfig::from(&app_config.search),
        ))
    }

    /// Create a client over an explicit, ordered adapter list
    #[must_use]
    pub fn with_providers(
        providers: Vec<Arc<dyn SourceProvider>>,
        config: MetaSearchConfig,
    ) -> Self {
        info!(
            "Initialized meta-search client with {} providers",
            providers.len()
        );
        Self { providers, config }
    }

    /// Names of the available providers, in invocation order
    pub fn providers(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Static description of every source
    pub fn catalog(&self) -> Vec<SourceInfo> {
        self.providers
            .iter()
            .map(|p| SourceInfo {
                name: p.name().to_string(),
                route_name: p.route_name().to_string(),
                display_name: p.display_name().to_string(),
                description: p.description().to_string(),
                content_type: p.content_type(),
                requires_api_key: p.requires_api_key(),
            })
            .collect()
    }

    /// Search every source for one topic
    #[instrument(skip(self, session))]
    pub async fn search_all_sources(
        &self,
        topic: &str,
        session: &SearchSession,
    ) -> Vec<ContentRecord> {
        let query = SearchQuery::new(topic);
        let results = self
            .fan_out(&self.providers, &query, &session.context())
            .await;

        results.into_iter().flat_map(|r| r.records).collect()
    }

    /// Search every source for each topic, concatenated topic by topic
    #[instrument(skip(self, session))]
    pub async fn search_topics(
        &self,
        topics: &[String],
        session: &SearchSession,
    ) -> Vec<ContentRecord> {
        let mut records = Vec::new();
        for topic in topics {
            records.extend(self.search_all_sources(topic, session).await);
        }
        records
    }

    /// Search the allowed sources for each topic, keeping a per-source
    /// breakdown. An absent or empty allow-list runs every source.
    #[instrument(skip(self, session))]
    pub async fn bulk_search(
        &self,
        topics: &[String],
        allow_list: Option<&[String]>,
        session: &SearchSession,
    ) -> BulkSearchResult {
        let selected = self.select_providers(allow_list);
        let context = session.context();

        let mut bulk = BulkSearchResult::default();
        for provider in &selected {
            bulk.by_source.entry(provider.name().to_string()).or_default();
        }

        for topic in topics {
            let query = SearchQuery::new(topic);
            for result in self.fan_out(&selected, &query, &context).await {
                if let Some(error) = result.error {
                    bulk.provider_errors.push(ProviderFailure {
                        source: result.source.clone(),
                        topic: query.query.clone(),
                        error,
                    });
                }
                bulk.by_source
                    .entry(result.source)
                    .or_default()
                    .extend(result.records.iter().cloned());
                bulk.results.extend(result.records);
            }
        }

        info!(
            "Bulk search completed: {} records from {} sources for {} topics",
            bulk.results.len(),
            bulk.by_source.len(),
            topics.len()
        );
        bulk
    }

    /// Search one source, addressed by its route name or its name
    #[instrument(skip(self, session))]
    pub async fn search_source(
        &self,
        route_name: &str,
        topic: &str,
        session: &SearchSession,
    ) -> Result<Vec<ContentRecord>> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.route_name() == route_name || p.name() == route_name)
            .cloned()
            .ok_or_else(|| Error::UnknownSource {
                name: route_name.to_string(),
            })?;

        let query = SearchQuery::new(topic);
        let mut results = self
            .fan_out(&[provider], &query, &session.context())
            .await;
        Ok(results.pop().map(|r| r.records).unwrap_or_default())
    }

    fn select_providers(&self, allow_list: Option<&[String]>) -> Vec<Arc<dyn SourceProvider>> {
        let Some(allowed) = allow_list.filter(|names| !names.is_empty()) else {
            return self.providers.clone();
        };

        for name in allowed {
            if !self.providers.iter().any(|p| p.name() == name) {
                warn!("Ignoring unknown source '{}' in allow-list", name);
            }
        }

        self.providers
            .iter()
            .filter(|p| allowed.iter().any(|name| name == p.name()))
            .cloned()
            .collect()
    }

    /// Run providers concurrently and return their results in provider order
    async fn fan_out(
        &self,
        providers: &[Arc<dyn SourceProvider>],
        query: &SearchQuery,
        context: &SearchContext,
    ) -> Vec<ProviderResult> {
        let start_time = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_providers));

        let mut tasks = Vec::with_capacity(providers.len());
        for provider in providers {
            let name = provider.name().to_string();
            let provider = Arc::clone(provider);
            let query = query.clone();
            let context = context.clone();
            let semaphore = Arc::clone(&semaphore);
            let timeout_duration = self.config.provider_timeout;

            let task = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return failed_result(provider.name(), Duration::ZERO, e.to_string());
                    }
                };

                let started = Instant::now();
                match timeout(timeout_duration, provider.search(&query, &context)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            "Provider {} timed out after {:?}",
                            provider.name(),
                            timeout_duration
                        );
                        let error = ProviderError::Timeout;
                        ProviderResult {
                            records: provider.fallback(&query, &error),
                            source: provider.name().to_string(),
                            search_time: started.elapsed(),
                            error: Some(error.to_string()),
                        }
                    }
                }
            });

            tasks.push((name, task));
        }

        // Await in spawn order so output order does not depend on timing
        let mut results = Vec::with_capacity(tasks.len());
        for (name, task) in tasks {
            match task.await {
                Ok(result) => {
                    debug!("Provider {} returned {} records", name, result.records.len());
                    results.push(result);
                }
                Err(e) => {
                    error!("Provider {} task failed: {}", name, e);
                    results.push(failed_result(&name, Duration::ZERO, e.to_string()));
                }
            }
        }

        info!(
            "Fan-out for '{}' completed: {} records from {} providers in {:?}",
            query.query,
            results.iter().map(|r| r.records.len()).sum::<usize>(),
            results.len(),
            start_time.elapsed()
        );
        results
    }
}

fn failed_result(source: &str, search_time: Duration, error: String) -> ProviderResult {
    ProviderResult {
        records: Vec::new(),
        source: source.to_string(),
        search_time,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::source_label;
    use async_trait::async_trait;

    enum Behavior {
        Records(usize),
        Fail,
        Panic,
        Hang,
        HangWithFallback,
    }

    struct FakeProvider {
        name: &'static str,
        behavior: Behavior,
    }

    impl FakeProvider {
        fn arc(name: &'static str, behavior: Behavior) -> Arc<dyn SourceProvider> {
            Arc::new(Self { name, behavior })
        }
    }

    #[async_trait]
    impl SourceProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn display_name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "fake"
        }

        fn content_type(&self) -> ContentType {
            ContentType::News
        }

        async fn fetch(
            &self,
            query: &SearchQuery,
            _context: &SearchContext,
        ) -> std::result::Result<Vec<ContentRecord>, ProviderError> {
            match self.behavior {
                Behavior::Records(count) => Ok((0..count)
                    .map(|i| {
                        ContentRecord::new(
                            ContentType::News,
                            source_label("Fake", Some(self.name), "Fake"),
                            Some(&format!("{} {} {}", self.name, query.query, i)),
                            Some("https://example.com"),
                            "https://example.com",
                        )
                    })
                    .collect()),
                Behavior::Fail => Err(ProviderError::Network("down".to_string())),
                Behavior::Panic => panic!("adapter bug"),
                Behavior::Hang | Behavior::HangWithFallback => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(Vec::new())
                }
            }
        }

        fn fallback(&self, query: &SearchQuery, _error: &ProviderError) -> Vec<ContentRecord> {
            match self.behavior {
                Behavior::HangWithFallback => vec![ContentRecord::new(
                    ContentType::Video,
                    source_label("Fake", Some("Search"), "Search"),
                    Some(&format!("search {}", query.query)),
                    Some("https://example.com/search"),
                    "https://example.com",
                )],
                _ => Vec::new(),
            }
        }
    }

    fn client(providers: Vec<Arc<dyn SourceProvider>>) -> MetaSearchClient {
        MetaSearchClient::with_providers(
            providers,
            MetaSearchConfig {
                max_parallel_providers: 4,
                provider_timeout: Duration::from_millis(200),
            },
        )
    }

    #[tokio::test]
    async fn test_results_follow_provider_order() {
        let client = client(vec![
            FakeProvider::arc("first", Behavior::Records(2)),
            FakeProvider::arc("second", Behavior::Records(1)),
        ]);

        let records = client
            .search_all_sources("calm", &SearchSession::anonymous())
            .await;
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["first calm 0", "first calm 1", "second calm 0"]);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let client = client(vec![
            FakeProvider::arc("failing", Behavior::Fail),
            FakeProvider::arc("panicking", Behavior::Panic),
            FakeProvider::arc("hanging", Behavior::Hang),
            FakeProvider::arc("healthy", Behavior::Records(3)),
        ]);

        let bulk = client
            .bulk_search(&["calm".to_string()], None, &SearchSession::anonymous())
            .await;
        assert_eq!(bulk.results.len(), 3);
        assert_eq!(bulk.by_source.len(), 4);
        assert!(bulk.by_source["panicking"].is_empty());

        let failed: Vec<&str> = bulk
            .provider_errors
            .iter()
            .map(|f| f.source.as_str())
            .collect();
        assert_eq!(failed, ["failing", "panicking", "hanging"]);
    }

    #[tokio::test]
    async fn test_timed_out_provider_returns_its_fallback() {
        let client = client(vec![
            FakeProvider::arc("video", Behavior::HangWithFallback),
            FakeProvider::arc("healthy", Behavior::Records(1)),
        ]);

        let bulk = client
            .bulk_search(&["calm".to_string()], None, &SearchSession::anonymous())
            .await;
        let titles: Vec<&str> = bulk.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["search calm", "healthy calm 0"]);
        assert_eq!(bulk.provider_errors.len(), 1);
        assert_eq!(bulk.provider_errors[0].source, "video");
        assert_eq!(bulk.provider_errors[0].error, "Timeout occurred");
    }

    #[test]
    fn test_default_timeout_covers_two_requests() {
        let search = SearchConfig::default();
        let config = MetaSearchConfig::from(&search);
        assert!(config.provider_timeout > search.request_timeout() * 2);
        assert_eq!(
            MetaSearchConfig::default().provider_timeout,
            config.provider_timeout
        );
    }

    #[tokio::test]
    async fn test_allow_list_restricts_sources() {
        let client = client(vec![
            FakeProvider::arc("news", Behavior::Records(1)),
            FakeProvider::arc("reddit", Behavior::Records(1)),
            FakeProvider::arc("github", Behavior::Records(1)),
        ]);

        let allow = vec!["github".to_string(), "news".to_string(), "bogus".to_string()];
        let bulk = client
            .bulk_search(
                &["a".to_string(), "b".to_string()],
                Some(allow.as_slice()),
                &SearchSession::anonymous(),
            )
            .await;

        let keys: Vec<&str> = bulk.by_source.keys().map(String::as_str).collect();
        assert_eq!(keys, ["github", "news"]);
        assert_eq!(bulk.results.len(), 4);
        assert_eq!(bulk.results[0].title, "news a 0");
    }

    #[tokio::test]
    async fn test_unknown_single_source() {
        let client = client(vec![FakeProvider::arc("news", Behavior::Records(1))]);
        let result = client
            .search_source("nope", "calm", &SearchSession::anonymous())
            .await;
        assert!(matches!(result, Err(Error::UnknownSource { .. })));
    }
}
