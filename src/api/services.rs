use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use super::models::{
    ActionResponse, DownloadAcceptedResponse, DownloadView, FormatsQuery, HealthResponse,
};
use super::state::AppState;
use crate::api::error::ApiError;
use crate::manager::DownloadRequest;

/// Queue a new download (POST /api/downloads)
///
/// Returns 202 Accepted with the generated id; the fetch itself runs on a
/// worker slot and is tracked via the status endpoints.
pub async fn start_download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_request(&request)?;

    let id = state.manager.start(request, None).await?;
    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(DownloadAcceptedResponse { id }),
    ))
}

/// List all downloads, most recently created first (GET /api/downloads)
pub async fn list_downloads(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.manager.list()?;
    let views: Vec<DownloadView> = records.into_iter().map(DownloadView::from).collect();
    Ok(Json(views))
}

/// Fetch one download (GET /api/downloads/{id})
pub async fn get_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .manager
        .get(&id)?
        .ok_or_else(|| ApiError::NotFound(format!("download {id}")))?;
    Ok(Json(DownloadView::from(record)))
}

/// Pause an active download (POST /api/downloads/{id}/pause)
pub async fn pause_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let success = state.manager.pause(&id).await?;
    if !success {
        return Err(ApiError::NotFound(format!("download {id}")));
    }
    Ok(Json(ActionResponse { success }))
}

/// Cancel a download (POST /api/downloads/{id}/cancel)
pub async fn cancel_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let success = state.manager.cancel(&id).await?;
    if !success {
        return Err(ApiError::NotFound(format!("download {id}")));
    }
    Ok(Json(ActionResponse { success }))
}

/// Resume a paused download (POST /api/downloads/{id}/resume)
///
/// 404 when the record is missing, 409 when it exists but is not paused.
pub async fn resume_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let success = state.manager.resume(&id, None).await?;
    if !success {
        return match state.manager.get(&id)? {
            Some(record) => Err(ApiError::Conflict(format!(
                "download {id} is {}, not paused",
                record.status
            ))),
            None => Err(ApiError::NotFound(format!("download {id}"))),
        };
    }
    Ok(Json(ActionResponse { success }))
}

/// Remove a download record, cancelling it first when active
/// (DELETE /api/downloads/{id})
pub async fn delete_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let success = state.manager.delete(&id).await?;
    if !success {
        return Err(ApiError::NotFound(format!("download {id}")));
    }
    Ok(Json(ActionResponse { success }))
}

/// Remove every download record (DELETE /api/downloads)
pub async fn delete_all_downloads(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let success = state.manager.delete_all().await?;
    Ok(Json(ActionResponse { success }))
}

/// Probe available formats without downloading (GET /api/formats?url=...)
pub async fn list_formats(
    State(state): State<AppState>,
    Query(query): Query<FormatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.url.trim().is_empty() {
        return Err(ApiError::InvalidPayload("url must not be empty".to_string()));
    }
    let metadata = state.manager.list_formats(&query.url).await?;
    Ok(Json(metadata))
}

/// Health check endpoint (GET /health)
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    use std::collections::HashMap;

    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());
    components.insert("store".to_string(), "healthy".to_string());
    components.insert("manager".to_string(), "healthy".to_string());

    let snapshot = state.metrics.snapshot();
    tracing::debug!(?snapshot, "Health check");

    let response = HealthResponse {
        status: "healthy".to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (axum::http::StatusCode::OK, Json(response))
}

fn validate_request(request: &DownloadRequest) -> Result<(), ApiError> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(ApiError::InvalidPayload("url must not be empty".to_string()));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ApiError::InvalidPayload(format!(
            "url must be http(s): {url}"
        )));
    }
    Ok(())
}
