use serde_json::json;
use sound_mind_api::client::normalize::strip_html;
use sound_mind_api::client::providers::{NewsProvider, SearchContext, SearchQuery, SourceProvider};
use sound_mind_api::client::HttpClientConfig;
use sound_mind_api::config::NewsSourceConfig;
use sound_mind_api::tools::{BulkSearchInput, SearchInput};
use sound_mind_api::{Error, MetaSearchClient, MetaSearchConfig, SearchSession, SearchTool};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn empty_tool() -> SearchTool {
    let client = MetaSearchClient::with_providers(Vec::new(), MetaSearchConfig::default());
    SearchTool::new(Arc::new(client), Arc::new(SearchSession::anonymous()))
}

fn terms(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Security tests for input validation and sanitization
#[tokio::test]
async fn test_injection_payloads_are_encoded_not_interpreted() {
    let payloads = [
        "'; DROP TABLE papers; --",
        "calm&apiKey=stolen",
        "<script>alert('xss')</script>",
        "../../../etc/passwd",
        "a b#fragment?x=1",
    ];

    for payload in payloads {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .and(query_param("q", payload))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"articles": []})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = NewsSourceConfig {
            endpoint: format!("{}/v2/everything", mock_server.uri()),
            ..NewsSourceConfig::default()
        };
        let provider = NewsProvider::new(
            config,
            Some("news-key".to_string()),
            &HttpClientConfig::default(),
        )
        .unwrap();

        let result = provider
            .search(&SearchQuery::new(payload), &SearchContext::default())
            .await;
        assert!(result.error.is_none(), "payload {payload} failed: {:?}", result.error);
    }
}

#[tokio::test]
async fn test_oversized_terms_are_rejected() {
    let tool = empty_tool();
    let huge = "a".repeat(10_000);

    let result = tool
        .search(SearchInput {
            search_terms: vec![huge.clone()],
        })
        .await;
    assert!(matches!(result, Err(Error::InvalidInput { .. })));

    let result = tool
        .bulk_search(BulkSearchInput {
            search_terms: vec!["calm".to_string(), huge],
            sources: None,
        })
        .await;
    assert!(matches!(result, Err(Error::InvalidInput { .. })));
}

#[tokio::test]
async fn test_control_characters_are_rejected() {
    let tool = empty_tool();

    for payload in ["calm\0", "focus\x1b[31m"] {
        let result = tool
            .search(SearchInput {
                search_terms: terms(&[payload]),
            })
            .await;
        assert!(
            matches!(result, Err(Error::InvalidInput { .. })),
            "payload {payload:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_unicode_terms_are_accepted() {
    let tool = empty_tool();
    let response = tool
        .search(SearchInput {
            search_terms: terms(&["méditation", "音楽療法", "🎵 calm"]),
        })
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.total_count, 0);
}

#[tokio::test]
async fn test_unknown_source_route_does_not_reach_providers() {
    let tool = empty_tool();
    for source in ["../admin", "news%00", "", "REDDIT"] {
        let result = tool.search_source(source, "calm").await;
        assert!(matches!(result, Err(Error::UnknownSource { .. })));
    }
}

#[test]
fn test_feed_markup_is_stripped_from_snippets() {
    let payloads = [
        "<script>alert('xss')</script>",
        "<img src=x onerror=alert('xss')>",
        "<iframe src=javascript:alert('xss')></iframe>",
    ];

    for payload in payloads {
        let cleaned = strip_html(payload);
        assert!(!cleaned.contains('<'), "markup survived in {cleaned}");
    }
}
