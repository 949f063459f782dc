//! Request helpers shared by the HTTP-backed providers.

use super::traits::ProviderError;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

/// Send a request and map transport failures and error statuses
pub async fn send(request: RequestBuilder, source: &str) -> Result<Response, ProviderError> {
    let response = request.send().await.map_err(|e| {
        error!("{} request failed: {}", source, e);
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_connect() {
            ProviderError::Network(format!("Connection failed: {e}"))
        } else {
            ProviderError::Network(format!("Request failed: {e}"))
        }
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    debug!("{} returned HTTP {}: {}", source, status, error_text);

    Err(match status.as_u16() {
        401 | 403 => ProviderError::Auth(format!("{source} rejected credentials (HTTP {status})")),
        429 => ProviderError::RateLimit,
        503 => ProviderError::ServiceUnavailable(format!("{source} temporarily unavailable")),
        _ => ProviderError::Network(format!("HTTP {status}: {error_text}")),
    })
}

/// Send a request and return the body as text
pub async fn get_text(request: RequestBuilder, source: &str) -> Result<String, ProviderError> {
    send(request, source)
        .await?
        .text()
        .await
        .map_err(|e| ProviderError::Network(format!("Failed to read response: {e}")))
}

/// Send a request and decode a JSON body
pub async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    source: &str,
) -> Result<T, ProviderError> {
    let body = get_text(request, source).await?;
    serde_json::from_str(&body)
        .map_err(|e| ProviderError::Parse(format!("Failed to parse {source} JSON: {e}")))
}
