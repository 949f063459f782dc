//! Reddit application-only OAuth and the per-process search session.

use super::providers::{http, SearchContext};
use super::HttpClientConfig;
use crate::config::{Config, Credentials, RedditSourceConfig};
use serde::Deserialize;
use std::fmt;
use tracing::{info, instrument, warn};

/// Opaque bearer credential; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Exchanges client credentials for an application-only Reddit token
pub struct RedditTokenProvider {
    client: reqwest::Client,
    config: RedditSourceConfig,
}

impl RedditTokenProvider {
    pub fn new(
        config: RedditSourceConfig,
        http: &HttpClientConfig,
    ) -> Result<Self, super::providers::ProviderError> {
        Ok(Self {
            client: http.build()?,
            config,
        })
    }

    /// Request a token. Every failure, including missing credentials,
    /// yields `None` and leaves Reddit disabled for the session.
    #[instrument(skip_all)]
    pub async fn acquire(&self, credentials: &Credentials) -> Option<SessionToken> {
        let Some((client_id, client_secret)) = credentials.reddit_client() else {
            info!("Reddit credentials not configured, Reddit search disabled");
            return None;
        };

        let request = self
            .client
            .post(&self.config.token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")]);

        match http::get_json::<TokenResponse>(request, "Reddit OAuth").await {
            Ok(TokenResponse {
                access_token: Some(token),
            }) if !token.trim().is_empty() => {
                info!("Reddit access token obtained");
                Some(SessionToken::new(token))
            }
            Ok(_) => {
                warn!("Reddit token response carried no access_token");
                None
            }
            Err(e) => {
                warn!("Failed to get Reddit token: {}", e);
                None
            }
        }
    }
}

/// Credentials established once at startup and shared by every request.
///
/// The session is read-only after construction, so handlers hold it behind
/// an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    reddit_token: Option<SessionToken>,
}

impl SearchSession {
    /// Acquire whatever session credentials the configuration allows
    pub async fn establish(config: &Config) -> Self {
        let http = HttpClientConfig::from(&config.search);
        let reddit_token = match RedditTokenProvider::new(config.sources.reddit.clone(), &http) {
            Ok(provider) => provider.acquire(&config.credentials).await,
            Err(e) => {
                warn!("Could not build Reddit token client: {}", e);
                None
            }
        };

        Self { reddit_token }
    }

    /// A session with no credentials
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reddit_token(mut self, token: SessionToken) -> Self {
        self.reddit_token = Some(token);
        self
    }

    #[must_use]
    pub fn reddit_token(&self) -> Option<&SessionToken> {
        self.reddit_token.as_ref()
    }

    #[must_use]
    pub fn is_reddit_connected(&self) -> bool {
        self.reddit_token.is_some()
    }

    /// Adapter context derived from this session
    #[must_use]
    pub fn context(&self) -> SearchContext {
        SearchContext {
            reddit_token: self.reddit_token.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = SessionToken::new("super-secret");
        assert_eq!(token.as_str(), "super-secret");
        assert!(!format!("{token:?}").contains("super-secret"));
    }

    #[test]
    fn test_session_context_carries_token() {
        let session = SearchSession::anonymous();
        assert!(!session.is_reddit_connected());
        assert!(session.context().reddit_token.is_none());

        let session = session.with_reddit_token(SessionToken::new("abc"));
        assert!(session.is_reddit_connected());
        assert_eq!(
            session.context().reddit_token.as_ref().map(SessionToken::as_str),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn test_acquire_without_credentials_is_none() {
        let provider =
            RedditTokenProvider::new(RedditSourceConfig::default(), &HttpClientConfig::default())
                .unwrap();
        assert!(provider.acquire(&Credentials::default()).await.is_none());
    }
}
