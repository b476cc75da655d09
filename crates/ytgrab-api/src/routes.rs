//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::health::health;
use crate::handlers::system::get_system_info;
use crate::handlers::videos::{download_file, get_progress, get_video_info, start_download};
use crate::middleware::{cors_layer, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/video-info", post(get_video_info))
        .route("/download", post(start_download))
        .route("/progress/:download_id", get(get_progress))
        .route("/download-file/:download_id", get(download_file))
        .route("/system-info", get(get_system_info))
        .layer(cors_layer());

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(request_logging))
        .with_state(state)
}
