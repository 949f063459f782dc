//! # Configuration
//!
//! Layered application configuration. Values are resolved in this order:
//!
//! 1. compiled defaults (identical to the historical hardcoded source policy)
//! 2. an optional TOML file
//! 3. `SOUND_MIND__SECTION__KEY` environment variables
//! 4. command line overrides
//!
//! Provider credentials are kept apart from the rest: they only ever come from
//! the process environment (optionally seeded from a `.env` file) and are never
//! serialized.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "SOUND_MIND";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub sources: SourcesConfig,
    /// Provider credentials, loaded from the environment only
    #[serde(skip)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the front-end assets
    pub static_dir: String,
    pub graceful_shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: "static".to_string(),
            graceful_shutdown_timeout_secs: 5,
        }
    }
}

/// Fan-out behaviour shared by all sources
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of adapters running at once for a single topic
    pub max_parallel_providers: usize,
    /// Upper bound on one adapter invocation, all requests included.
    /// Must leave room for two sequential requests.
    pub provider_timeout_secs: u64,
    /// Timeout applied to each outbound HTTP request
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_parallel_providers: 9,
            provider_timeout_secs: 45,
            request_timeout_secs: 15,
            user_agent: "SoundMindAgent/1.0".to_string(),
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub const fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Per-source endpoints and result policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub news: NewsSourceConfig,
    pub reddit: RedditSourceConfig,
    pub pubmed: PubmedSourceConfig,
    pub youtube: YoutubeSourceConfig,
    pub arxiv: ArxivSourceConfig,
    pub podcasts: PodcastSourceConfig,
    pub medium: MediumSourceConfig,
    pub github: GithubSourceConfig,
    pub scholar: ScholarSourceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSourceConfig {
    pub endpoint: String,
    pub page_size: u32,
    pub sort_by: String,
}

impl Default for NewsSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://newsapi.org/v2/everything".to_string(),
            page_size: 3,
            sort_by: "publishedAt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSourceConfig {
    /// OAuth2 client-credentials endpoint
    pub token_url: String,
    /// Authenticated API host
    pub api_base_url: String,
    /// Host used when building public permalinks
    pub link_base_url: String,
    pub subreddits: Vec<String>,
    /// Only the first `max_subreddits` entries of `subreddits` are searched
    pub max_subreddits: usize,
    /// Posts requested per subreddit
    pub limit: u32,
    pub sort: String,
}

impl Default for RedditSourceConfig {
    fn default() -> Self {
        Self {
            token_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            api_base_url: "https://oauth.reddit.com".to_string(),
            link_base_url: "https://reddit.com".to_string(),
            subreddits: vec![
                "Meditation".to_string(),
                "soundhealing".to_string(),
                "BinauralBeats".to_string(),
                "ambientmusic".to_string(),
            ],
            max_subreddits: 2,
            limit: 2,
            sort: "relevance".to_string(),
        }
    }
}

impl RedditSourceConfig {
    /// Subreddits actually searched, in order
    #[must_use]
    pub fn searched_subreddits(&self) -> &[String] {
        let end = self.max_subreddits.min(self.subreddits.len());
        &self.subreddits[..end]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PubmedSourceConfig {
    pub search_url: String,
    pub summary_url: String,
    pub max_results: u32,
}

impl Default for PubmedSourceConfig {
    fn default() -> Self {
        Self {
            search_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi".to_string(),
            summary_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi"
                .to_string(),
            max_results: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSourceConfig {
    /// Channel feed endpoint, queried with `channel_id`
    pub feed_url: String,
    /// Public results page used for fallback search links
    pub search_url: String,
    pub channel_ids: Vec<String>,
    pub max_entries_per_channel: usize,
}

impl Default for YoutubeSourceConfig {
    fn default() -> Self {
        Self {
            feed_url: "https://www.youtube.com/feeds/videos.xml".to_string(),
            search_url: "https://www.youtube.com/results".to_string(),
            channel_ids: vec![
                "UCN4vyryy6O4GlIXcXTIuZQQ".to_string(),
                "UCjzHeG1KWoonmf9d5KBvSiw".to_string(),
                "UC7xlVp8ItZI4I2O9W3Pb1kQ".to_string(),
            ],
            max_entries_per_channel: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivSourceConfig {
    pub endpoint: String,
    pub max_results: u32,
}

impl Default for ArxivSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://export.arxiv.org/api/query".to_string(),
            max_results: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PodcastSourceConfig {
    pub endpoint: String,
    pub limit: u32,
}

impl Default for PodcastSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://itunes.apple.com/search".to_string(),
            limit: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediumSourceConfig {
    /// Tag feed root; the topic-derived tag is appended as a path segment
    pub tag_feed_url: String,
    /// Tag whose feed is read when the topic feed cannot be fetched
    pub fallback_tag: String,
    pub max_results: usize,
}

impl Default for MediumSourceConfig {
    fn default() -> Self {
        Self {
            tag_feed_url: "https://medium.com/feed/tag".to_string(),
            fallback_tag: "meditation".to_string(),
            max_results: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSourceConfig {
    pub endpoint: String,
    pub per_page: u32,
    pub sort: String,
}

impl Default for GithubSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.github.com/search/repositories".to_string(),
            per_page: 3,
            sort: "stars".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScholarSourceConfig {
    pub search_url: String,
}

impl Default for ScholarSourceConfig {
    fn default() -> Self {
        Self {
            search_url: "https://scholar.google.com/scholar".to_string(),
        }
    }
}

/// API keys and client secrets for the sources that need them
///
/// Field names map to the upper-case environment variables
/// `NEWS_API_KEY`, `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET` and `GITHUB_TOKEN`.
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub news_api_key: Option<String>,
    #[serde(default)]
    pub reddit_client_id: Option<String>,
    #[serde(default)]
    pub reddit_client_secret: Option<String>,
    #[serde(default)]
    pub github_token: Option<String>,
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self> {
        let credentials: Self = envy::from_env()?;
        Ok(credentials.normalized())
    }

    /// Seed the process environment from a `.env` style file.
    ///
    /// A missing file is not an error; variables already set in the
    /// environment win over the file.
    pub fn load_env_file(path: &Path) {
        match dotenvy::from_path(path) {
            Ok(()) => info!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {
                debug!("No env file at {}, using process environment", path.display());
            }
            Err(e) => warn!("Ignoring unreadable env file {}: {}", path.display(), e),
        }
    }

    /// Treat blank values as absent
    #[must_use]
    pub fn normalized(self) -> Self {
        fn present(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            news_api_key: present(self.news_api_key),
            reddit_client_id: present(self.reddit_client_id),
            reddit_client_secret: present(self.reddit_client_secret),
            github_token: present(self.github_token),
        }
    }

    /// Client id and secret, when both are configured
    #[must_use]
    pub fn reddit_client(&self) -> Option<(&str, &str)> {
        match (&self.reddit_client_id, &self.reddit_client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(value: Option<&String>) -> &'static str {
            if value.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("Credentials")
            .field("news_api_key", &mask(self.news_api_key.as_ref()))
            .field("reddit_client_id", &mask(self.reddit_client_id.as_ref()))
            .field(
                "reddit_client_secret",
                &mask(self.reddit_client_secret.as_ref()),
            )
            .field("github_token", &mask(self.github_token.as_ref()))
            .finish()
    }
}

/// Command line overrides applied after every other layer
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<String>,
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and the environment.
    ///
    /// Credentials are read from the process environment; call
    /// [`Credentials::load_env_file`] first to honour a `.env` file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!("Reading configuration file {}", path.display());
            builder = builder.add_source(
                config::File::new(&path.to_string_lossy(), config::FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.credentials = Credentials::from_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply command line overrides and re-validate
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if let Some(host) = &overrides.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(static_dir) = &overrides.static_dir {
            self.server.static_dir.clone_from(static_dir);
        }
        self.validate()
    }

    /// Render the non-secret part of the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Service(format!("Failed to render config: {e}")))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        fn invalid(field: &str, reason: &str) -> Error {
            Error::InvalidInput {
                field: field.to_string(),
                reason: reason.to_string(),
            }
        }

        if self.server.port == 0 {
            return Err(invalid("server.port", "port must be non-zero"));
        }
        if self.search.max_parallel_providers == 0 {
            return Err(invalid(
                "search.max_parallel_providers",
                "at least one provider must be allowed to run",
            ));
        }
        if self.search.provider_timeout_secs == 0 || self.search.request_timeout_secs == 0 {
            return Err(invalid("search", "timeouts must be non-zero"));
        }
        if self.search.provider_timeout_secs <= self.search.request_timeout_secs.saturating_mul(2) {
            return Err(invalid(
                "search.provider_timeout_secs",
                "must exceed twice search.request_timeout_secs",
            ));
        }
        if self.search.user_agent.trim().is_empty() {
            return Err(invalid("search.user_agent", "user agent cannot be empty"));
        }

        let sources = &self.sources;
        let limits = [
            ("sources.news.page_size", sources.news.page_size as usize),
            ("sources.reddit.limit", sources.reddit.limit as usize),
            ("sources.pubmed.max_results", sources.pubmed.max_results as usize),
            (
                "sources.youtube.max_entries_per_channel",
                sources.youtube.max_entries_per_channel,
            ),
            ("sources.arxiv.max_results", sources.arxiv.max_results as usize),
            ("sources.podcasts.limit", sources.podcasts.limit as usize),
            ("sources.medium.max_results", sources.medium.max_results),
            ("sources.github.per_page", sources.github.per_page as usize),
        ];
        for (field, value) in limits {
            if value == 0 {
                return Err(invalid(field, "result limit must be non-zero"));
            }
        }

        Ok(())
    }
}
