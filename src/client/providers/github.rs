use super::http;
use super::traits::{ProviderError, SearchContext, SearchQuery, SourceProvider};
use crate::client::{source_label, ContentRecord, ContentType, HttpClientConfig};
use crate::config::GithubSourceConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

#[derive(Debug, Deserialize)]
struct RepositorySearch {
    #[serde(default)]
    items: Vec<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: Option<String>,
    full_name: Option<String>,
    html_url: Option<String>,
    description: Option<String>,
    updated_at: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    owner: Option<RepositoryOwner>,
}

#[derive(Debug, Deserialize)]
struct RepositoryOwner {
    login: Option<String>,
}

/// GitHub repository search provider.
///
/// Works unauthenticated; a configured token only raises the rate limit.
pub struct GithubProvider {
    client: Client,
    config: GithubSourceConfig,
    token: Option<String>,
}

impl GithubProvider {
    pub fn new(
        config: GithubSourceConfig,
        token: Option<String>,
        http: &HttpClientConfig,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http.build()?,
            config,
            token,
        })
    }

    fn build_search_url(&self, query: &SearchQuery) -> Result<Url, ProviderError> {
        let per_page = self.config.per_page.to_string();
        Url::parse_with_params(
            &self.config.endpoint,
            &[
                ("q", query.query.as_str()),
                ("sort", self.config.sort.as_str()),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ],
        )
        .map_err(|e| ProviderError::Other(format!("Invalid base URL: {e}")))
    }

    fn convert_repository(repo: Repository) -> ContentRecord {
        let owner = repo.owner.and_then(|o| o.login);
        let title = repo.full_name.or(repo.name);

        ContentRecord::new(
            ContentType::Code,
            source_label("GitHub", owner.as_deref(), "Repository"),
            title.as_deref(),
            repo.html_url.as_deref(),
            "https://github.com",
        )
        .published_at(repo.updated_at.as_deref())
        .snippet(repo.description.as_deref())
        .with_stars(repo.stargazers_count)
    }
}

#[async_trait]
impl SourceProvider for GithubProvider {
    fn name(&self) -> &str {
        "github"
    }

    fn display_name(&self) -> &str {
        "GitHub"
    }

    fn description(&self) -> &str {
        "Open source projects and code repositories"
    }

    fn content_type(&self) -> ContentType {
        ContentType::Code
    }

    async fn fetch(
        &self,
        query: &SearchQuery,
        _context: &SearchContext,
    ) -> Result<Vec<ContentRecord>, ProviderError> {
        let url = self.build_search_url(query)?;
        debug!("GitHub search URL: {}", url);

        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let search: RepositorySearch = http::get_json(request, "GitHub").await?;
        Ok(search
            .items
            .into_iter()
            .map(Self::convert_repository)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_repository() {
        let repo: Repository = serde_json::from_value(json!({
            "name": "beats",
            "full_name": "octo/beats",
            "html_url": "https://github.com/octo/beats",
            "description": "Python library for generating binaural beats",
            "updated_at": "2024-03-03T03:03:03Z",
            "stargazers_count": 128,
            "owner": {"login": "octo"}
        }))
        .unwrap();

        let record = GithubProvider::convert_repository(repo);
        assert_eq!(record.title, "octo/beats");
        assert_eq!(record.source_label, "GitHub: octo");
        assert_eq!(record.stars, Some(128));
        assert_eq!(record.content_type, ContentType::Code);
    }

    #[test]
    fn test_search_url() {
        let provider =
            GithubProvider::new(GithubSourceConfig::default(), None, &HttpClientConfig::default())
                .unwrap();
        let url = provider
            .build_search_url(&SearchQuery::new("binaural beats"))
            .unwrap()
            .to_string();
        assert!(url.contains("sort=stars"));
        assert!(url.contains("per_page=3"));
    }
}
