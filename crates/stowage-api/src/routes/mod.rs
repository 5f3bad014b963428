//! API routes

mod health;
pub mod metrics;
mod objects;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
};
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Maximum accepted object upload size (1 GiB)
const MAX_BODY_SIZE: usize = 1024 * 1024 * 1024;

/// Add `X-Version` and `X-Env` headers to every response
async fn add_version_headers(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    if let Ok(version) = HeaderValue::from_str(&state.info.version) {
        headers.insert("X-Version", version);
    }
    if let Ok(env) = HeaderValue::from_str(&state.info.env) {
        headers.insert("X-Env", env);
    }

    response
}

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Object storage
        .merge(objects::routes())
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router.layer(middleware::from_fn_with_state(state, add_version_headers))
}
