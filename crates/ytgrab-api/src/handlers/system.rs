//! System info handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Capabilities and configuration surfaced to the frontend.
#[derive(Serialize)]
pub struct SystemInfoResponse {
    pub ffmpeg_available: bool,
    pub yt_dlp_version: String,
    pub debug_mode: bool,
    /// Seconds before finished files become eligible for cleanup
    pub max_file_age: u64,
}

pub async fn get_system_info(State(state): State<AppState>) -> Json<SystemInfoResponse> {
    Json(SystemInfoResponse {
        ffmpeg_available: state.backend.ffmpeg_available().await,
        yt_dlp_version: state.backend.version().to_string(),
        debug_mode: state.config.debug,
        max_file_age: state.config.max_file_age.as_secs(),
    })
}
