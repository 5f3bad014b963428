//! Object routes backed by the storage facade

use axum::{
    Router,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /objects/{*key} - stream an object
async fn get_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    debug!("GET object: {}", key);

    let stream = state.storage.load_stream(&key).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(stream),
    )
        .into_response())
}

/// HEAD /objects/{*key} - check existence
async fn head_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.storage.exists(&key).await? {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::NotFound(format!("Object not found: {}", key)))
    }
}

/// PUT /objects/{*key} - store the request body
async fn put_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    debug!("PUT object: {} ({} bytes)", key, body.len());

    state.storage.save(&key, body).await?;
    Ok(StatusCode::CREATED)
}

/// DELETE /objects/{*key}
async fn delete_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    debug!("DELETE object: {}", key);

    state.storage.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create object routes
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/objects/{*key}",
        get(get_object)
            .head(head_object)
            .put(put_object)
            .delete(delete_object),
    )
}
