use crate::client::normalize;
use crate::client::{ContentRecord, ContentType, SessionToken};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// Topic handed to every adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free-text topic, trimmed
    pub query: String,
}

impl SearchQuery {
    #[must_use]
    pub fn new(query: &str) -> Self {
        Self {
            query: query.trim().to_string(),
        }
    }

    /// Lower-cased topic words used by relevance filters
    #[must_use]
    pub fn words(&self) -> Vec<String> {
        normalize::topic_words(&self.query)
    }
}

/// Per-invocation context shared by all adapters of one fan-out
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    /// Session bearer token for sources that need one
    pub reddit_token: Option<SessionToken>,
}

/// Outcome of one adapter invocation
#[derive(Debug, Clone)]
pub struct ProviderResult {
    /// Records in the source's native order
    pub records: Vec<ContentRecord>,
    /// Name of the adapter that produced the records
    pub source: String,
    /// Time taken by the adapter
    pub search_time: Duration,
    /// Failure that was absorbed, if any
    pub error: Option<String>,
}

/// Errors that can occur inside an adapter
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Timeout occurred")]
    Timeout,

    #[error("Provider error: {0}")]
    Other(String),
}

/// Contract implemented by every content source.
///
/// Implementors write [`fetch`](SourceProvider::fetch), which may fail.
/// Callers use [`search`](SourceProvider::search), which never does: a
/// failed fetch is logged and replaced by the adapter's
/// [`fallback`](SourceProvider::fallback) records. Missing configuration
/// is not a failure; `fetch` returns an empty list instead.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Unique name/identifier for this provider
    fn name(&self) -> &str;

    /// Path segment of the single-source search route
    fn route_name(&self) -> &str {
        self.name()
    }

    /// Human-readable source name
    fn display_name(&self) -> &str;

    /// Human-readable description of the provider
    fn description(&self) -> &str;

    /// Record type produced by this provider
    fn content_type(&self) -> ContentType;

    /// Whether a provisioned API key or client secret is needed
    fn requires_api_key(&self) -> bool {
        false
    }

    /// Query the source and map its items into records
    async fn fetch(
        &self,
        query: &SearchQuery,
        context: &SearchContext,
    ) -> Result<Vec<ContentRecord>, ProviderError>;

    /// Records returned when `fetch` fails
    fn fallback(&self, _query: &SearchQuery, _error: &ProviderError) -> Vec<ContentRecord> {
        Vec::new()
    }

    /// Search the source, absorbing any failure
    async fn search(&self, query: &SearchQuery, context: &SearchContext) -> ProviderResult {
        let start_time = Instant::now();

        let (records, error) = match self.fetch(query, context).await {
            Ok(records) => (records, None),
            Err(e) => {
                warn!("{} search failed for '{}': {}", self.name(), query.query, e);
                (self.fallback(query, &e), Some(e.to_string()))
            }
        };

        let search_time = start_time.elapsed();
        info!(
            "{} returned {} records for '{}' in {:?}",
            self.name(),
            records.len(),
            query.query,
            search_time
        );

        ProviderResult {
            records,
            source: self.name().to_string(),
            search_time,
            error,
        }
    }
}
