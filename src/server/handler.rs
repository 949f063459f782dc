use crate::tools::search::{
    BulkSearchResponse, SearchResponse, SourceSearchResponse, SourcesResponse, StatusResponse,
};
use crate::tools::{BulkSearchInput, SearchInput, SearchTool};
use crate::Error;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Error rendered as `{"success": false, "error": ...}`
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::InvalidInput {
            field: "body".to_string(),
            reason: rejection.body_text(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Error::UnknownSource { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if self.0.is_client_error() {
            warn!("Rejected request: {}", self.0);
        } else {
            error!("Request failed: {}", self.0);
        }

        let body = Json(json!({
            "success": false,
            "error": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Build the application router. Unmatched paths fall through to the
/// static front-end directory.
pub fn router(tool: Arc<SearchTool>, static_dir: &str) -> Router {
    Router::new()
        .route("/api/search", post(search_handler))
        .route("/api/search/bulk", post(bulk_search_handler))
        .route("/api/search/:source/:term", get(source_search_handler))
        .route("/api/sources", get(sources_handler))
        .route("/api/test", get(test_handler))
        .with_state(tool)
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

async fn search_handler(
    State(tool): State<Arc<SearchTool>>,
    input: std::result::Result<Json<SearchInput>, JsonRejection>,
) -> ApiResult<SearchResponse> {
    let Json(input) = input?;
    Ok(Json(tool.search(input).await?))
}

async fn bulk_search_handler(
    State(tool): State<Arc<SearchTool>>,
    input: std::result::Result<Json<BulkSearchInput>, JsonRejection>,
) -> ApiResult<BulkSearchResponse> {
    let Json(input) = input?;
    Ok(Json(tool.bulk_search(input).await?))
}

async fn source_search_handler(
    State(tool): State<Arc<SearchTool>>,
    Path((source, term)): Path<(String, String)>,
) -> ApiResult<SourceSearchResponse> {
    Ok(Json(tool.search_source(&source, &term).await?))
}

async fn sources_handler(State(tool): State<Arc<SearchTool>>) -> Json<SourcesResponse> {
    Json(tool.sources())
}

async fn test_handler(State(tool): State<Arc<SearchTool>>) -> Json<StatusResponse> {
    Json(tool.status())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                Error::InvalidInput {
                    field: "searchTerms".to_string(),
                    reason: "empty".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::UnknownSource {
                    name: "myspace".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (Error::Service("boom".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Timeout, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.is_client_error(), expected.is_client_error());
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }
}
