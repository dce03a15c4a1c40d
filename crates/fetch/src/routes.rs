use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;

use webcache_common::api::fetch::{FetchErrorBody, FetchMetadata, FetchRequest, FetchResponse};

use crate::cache::{CacheError, CachingFetcher};
use crate::fetch::PageFetcher;
use crate::store::KeyValueStore;

/// Shared application state.
pub struct AppState<S, F> {
    pub cache: CachingFetcher<S, F>,
    pub metrics_handle: PrometheusHandle,
}

/// Build the service router over the given state.
pub fn router<S, F>(state: Arc<AppState<S, F>>) -> Router
where
    S: KeyValueStore + 'static,
    F: PageFetcher + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler::<S, F>))
        .route("/fetch", post(fetch_handler::<S, F>))
        .with_state(state)
}

type ErrorResponse = (StatusCode, Json<FetchErrorBody>);

/// POST /fetch — return the content of a URL, cached for a short window.
pub async fn fetch_handler<S, F>(
    State(state): State<Arc<AppState<S, F>>>,
    Json(request): Json<FetchRequest>,
) -> Result<Json<FetchResponse>, ErrorResponse>
where
    S: KeyValueStore + 'static,
    F: PageFetcher + 'static,
{
    if request.url.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "url must not be empty".into(),
            None,
        ));
    }

    let fetched = state.cache.fetch(&request.url).await.map_err(|e| match e {
        CacheError::Fetch(e) => error_response(StatusCode::BAD_GATEWAY, e.to_string(), e.status()),
        CacheError::Store(e) => {
            tracing::error!(error = %e, "Store unavailable");
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string(), None)
        }
    })?;

    Ok(Json(FetchResponse {
        content: fetched.content,
        metadata: FetchMetadata {
            url: request.url,
            cached: fetched.cached,
        },
    }))
}

fn error_response(status: StatusCode, error: String, upstream_status: Option<u16>) -> ErrorResponse {
    (
        status,
        Json(FetchErrorBody {
            error,
            upstream_status,
        }),
    )
}

async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "healthy" })),
    )
}

async fn metrics_handler<S, F>(State(state): State<Arc<AppState<S, F>>>) -> String
where
    S: KeyValueStore + 'static,
    F: PageFetcher + 'static,
{
    state.metrics_handle.render()
}
