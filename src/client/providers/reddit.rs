use super::http;
use super::traits::{ProviderError, SearchContext, SearchQuery, SourceProvider};
use crate::client::{source_label, ContentRecord, ContentType, HttpClientConfig, SessionToken};
use crate::config::RedditSourceConfig;
use async_trait::async_trait;
use chrono::DateTime;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    title: Option<String>,
    permalink: Option<String>,
    created_utc: Option<f64>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
    selftext: Option<String>,
}

/// Reddit provider searching a fixed set of communities
pub struct RedditProvider {
    client: Client,
    config: RedditSourceConfig,
}

impl RedditProvider {
    pub fn new(config: RedditSourceConfig, http: &HttpClientConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http.build()?,
            config,
        })
    }

    fn build_search_url(&self, subreddit: &str, query: &SearchQuery) -> Result<Url, ProviderError> {
        let endpoint = format!(
            "{}/r/{}/search",
            self.config.api_base_url.trim_end_matches('/'),
            subreddit
        );
        let limit = self.config.limit.to_string();
        Url::parse_with_params(
            &endpoint,
            &[
                ("q", query.query.as_str()),
                ("sort", self.config.sort.as_str()),
                ("limit", limit.as_str()),
                ("restrict_sr", "true"),
            ],
        )
        .map_err(|e| ProviderError::Other(format!("Invalid base URL: {e}")))
    }

    /// `created_utc` as an ISO-8601 timestamp
    fn format_created(created_utc: Option<f64>) -> Option<String> {
        #[allow(clippy::cast_possible_truncation)]
        let seconds = created_utc?.trunc() as i64;
        DateTime::from_timestamp(seconds, 0)
            .map(|dt| dt.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    fn convert_post(&self, subreddit: &str, post: RedditPost) -> ContentRecord {
        let link_base = self.config.link_base_url.trim_end_matches('/');
        let url = post
            .permalink
            .as_deref()
            .map(|permalink| format!("{link_base}{permalink}"));
        let created = Self::format_created(post.created_utc);

        ContentRecord::new(
            ContentType::Reddit,
            source_label("Reddit", Some(&format!("r/{subreddit}")), "r/all"),
            post.title.as_deref(),
            url.as_deref(),
            &format!("{link_base}/r/{subreddit}"),
        )
        .published_at(created.as_deref())
        .snippet(post.selftext.as_deref())
        .with_score(post.score)
        .with_num_comments(post.num_comments)
    }

    async fn search_subreddit(
        &self,
        subreddit: &str,
        query: &SearchQuery,
        token: &SessionToken,
    ) -> Result<Vec<ContentRecord>, ProviderError> {
        let url = self.build_search_url(subreddit, query)?;
        debug!("Searching r/{}: {}", subreddit, url);

        let listing: Listing = http::get_json(
            self.client.get(url).bearer_auth(token.as_str()),
            "Reddit",
        )
        .await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| self.convert_post(subreddit, child.data))
            .collect())
    }
}

#[async_trait]
impl SourceProvider for RedditProvider {
    fn name(&self) -> &str {
        "reddit"
    }

    fn display_name(&self) -> &str {
        "Reddit"
    }

    fn description(&self) -> &str {
        "Community discussions and user experiences"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Reddit
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        context: &SearchContext,
    ) -> Result<Vec<ContentRecord>, ProviderError> {
        let Some(token) = context.reddit_token.as_ref() else {
            info!("No Reddit session token, skipping Reddit search");
            return Ok(Vec::new());
        };

        let subreddits = self.config.searched_subreddits();
        let outcomes = join_all(
            subreddits
                .iter()
                .map(|subreddit| self.search_subreddit(subreddit, query, token)),
        )
        .await;

        let mut records = Vec::new();
        for (subreddit, outcome) in subreddits.iter().zip(outcomes) {
            match outcome {
                Ok(posts) => {
                    info!("r/{}: found {} posts", subreddit, posts.len());
                    records.extend(posts);
                }
                Err(e) => warn!("Skipping r/{}: {}", subreddit, e),
            }
        }

        Ok(records)
    }
}
