pub mod arxiv;
pub mod feed;
pub mod github;
pub mod http;
pub mod medium;
pub mod news;
pub mod podcasts;
pub mod pubmed;
pub mod reddit;
pub mod scholar;
pub mod traits;
pub mod youtube;

pub use arxiv::ArxivProvider;
pub use github::GithubProvider;
pub use medium::MediumProvider;
pub use news::NewsProvider;
pub use podcasts::PodcastProvider;
pub use pubmed::PubmedProvider;
pub use reddit::RedditProvider;
pub use scholar::ScholarProvider;
pub use traits::{ProviderError, ProviderResult, SearchContext, SearchQuery, SourceProvider};
pub use youtube::YoutubeProvider;

use crate::client::HttpClientConfig;
use crate::config::Config;
use std::sync::Arc;

/// Build the production adapters in their fixed invocation order:
/// news, reddit, pubmed, youtube, arxiv, podcasts, medium, github, scholar.
pub fn default_providers(config: &Config) -> Result<Vec<Arc<dyn SourceProvider>>, ProviderError> {
    let http = HttpClientConfig::from(&config.search);
    let sources = &config.sources;
    let credentials = &config.credentials;

    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        Arc::new(NewsProvider::new(
            sources.news.clone(),
            credentials.news_api_key.clone(),
            &http,
        )?),
        Arc::new(RedditProvider::new(sources.reddit.clone(), &http)?),
        Arc::new(PubmedProvider::new(sources.pubmed.clone(), &http)?),
        Arc::new(YoutubeProvider::new(sources.youtube.clone(), &http)?),
        Arc::new(ArxivProvider::new(sources.arxiv.clone(), &http)?),
        Arc::new(PodcastProvider::new(sources.podcasts.clone(), &http)?),
        Arc::new(MediumProvider::new(sources.medium.clone(), &http)?),
        Arc::new(GithubProvider::new(
            sources.github.clone(),
            credentials.github_token.clone(),
            &http,
        )?),
        Arc::new(ScholarProvider::new(sources.scholar.clone(), &http)?),
    ];

    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_provider_order() {
        let providers = default_providers(&Config::default()).unwrap();
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            [
                "news", "reddit", "pubmed", "youtube", "arxiv", "podcasts", "medium", "github",
                "scholar"
            ]
        );
        assert_eq!(providers[2].route_name(), "research");
    }
}
