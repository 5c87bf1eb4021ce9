pub mod error;
pub mod models;
pub mod services;
pub mod state;

use axum::{
    Router,
    routing::{delete, get, post},
};

use state::AppState;

/// Build the full API router over the lifecycle manager.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/downloads",
            post(services::start_download)
                .get(services::list_downloads)
                .delete(services::delete_all_downloads),
        )
        .route(
            "/api/downloads/{id}",
            get(services::get_download).delete(services::delete_download),
        )
        .route("/api/downloads/{id}/pause", post(services::pause_download))
        .route("/api/downloads/{id}/cancel", post(services::cancel_download))
        .route("/api/downloads/{id}/resume", post(services::resume_download))
        .route("/api/formats", get(services::list_formats))
        .route("/health", get(services::health))
        .with_state(state)
}
