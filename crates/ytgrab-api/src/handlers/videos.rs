//! Video metadata, download and progress handlers.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::info;

use ytgrab_models::{clean_youtube_url, is_valid_youtube_url, next_job_id, FormatKind, JobStatus};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::worker::{self, DownloadJob};

#[derive(Deserialize)]
pub struct VideoInfoRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Serialize)]
pub struct VideoInfoResponse {
    pub title: String,
    pub uploader: String,
    /// `m:ss`, or `N/A` when the duration is unknown
    pub duration: String,
    pub view_count: u64,
    pub thumbnail: String,
    /// Offered quality labels, best first
    pub video_formats: Vec<String>,
    /// Canonical watch URL the download endpoint should be given
    pub clean_url: String,
}

/// Probe a video without downloading it.
pub async fn get_video_info(
    State(state): State<AppState>,
    Json(body): Json<VideoInfoRequest>,
) -> ApiResult<Json<VideoInfoResponse>> {
    let url = body.url.trim();
    if url.is_empty() {
        return Err(ApiError::bad_request("url is required"));
    }
    if !is_valid_youtube_url(url) {
        return Err(ApiError::bad_request("not a valid YouTube URL"));
    }
    let clean_url = clean_youtube_url(url);

    let metadata = state.backend.fetch_metadata(&clean_url).await?;

    let mut video_formats = vec!["Best quality".to_string()];
    video_formats.extend(metadata.heights.iter().map(|h| format!("{h}p")));

    Ok(Json(VideoInfoResponse {
        title: metadata.title,
        uploader: metadata.uploader,
        duration: format_duration(metadata.duration_secs),
        view_count: metadata.view_count,
        thumbnail: metadata.thumbnail,
        video_formats,
        clean_url,
    }))
}

#[derive(Deserialize)]
pub struct DownloadRequestBody {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub format_type: FormatKind,
    #[serde(default = "default_quality")]
    pub quality: String,
}

fn default_quality() -> String {
    "Best quality".to_string()
}

#[derive(Serialize)]
pub struct DownloadStarted {
    pub success: bool,
    pub download_id: String,
}

/// Accept a download request and hand it to a background worker.
///
/// Only presence of the url is validated here; normalization is
/// best-effort and unrecognized urls are passed to the backend as-is, so
/// anything yt-dlp can handle still works.
pub async fn start_download(
    State(state): State<AppState>,
    Json(body): Json<DownloadRequestBody>,
) -> ApiResult<Json<DownloadStarted>> {
    let url = body.url.trim();
    if url.is_empty() {
        return Err(ApiError::bad_request("url is required"));
    }
    let url = clean_youtube_url(url);

    let id = next_job_id();
    info!(job_id = %id, url = %url, "Accepted download request");

    state.registry.create(&id);
    worker::spawn(
        state.clone(),
        DownloadJob {
            id: id.clone(),
            url,
            format_type: body.format_type,
            quality: body.quality,
        },
    );

    Ok(Json(DownloadStarted {
        success: true,
        download_id: id,
    }))
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ProgressResponse {
    /// Unknown ids report only the sentinel status.
    Unknown { status: String },
    /// Tracked jobs always carry `progress` and `filename`, null until
    /// known; `error` appears only once the job has failed.
    Tracked {
        status: String,
        progress: f64,
        filename: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Poll job state. Always 200; unknown ids report `not_found`.
pub async fn get_progress(
    State(state): State<AppState>,
    Path(download_id): Path<String>,
) -> Json<ProgressResponse> {
    let job = state.registry.get(&download_id);
    let response = match job.status {
        JobStatus::NotFound => ProgressResponse::Unknown {
            status: job.status.as_str().to_string(),
        },
        _ => ProgressResponse::Tracked {
            status: job.status.as_str().to_string(),
            progress: job.progress,
            filename: job.output_name,
            error: job.error_message,
        },
    };
    Json(response)
}

/// Stream a completed download back to the client as an attachment.
pub async fn download_file(
    State(state): State<AppState>,
    Path(download_id): Path<String>,
) -> ApiResult<Response> {
    let job = state.registry.get(&download_id);
    if job.status != JobStatus::Completed {
        return Err(ApiError::not_found("download not completed"));
    }
    let path = job
        .output_path
        .ok_or_else(|| ApiError::not_found("download has no file"))?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| ApiError::not_found("file no longer available"))?;

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let filename = sanitize_filename(
        job.output_name
            .as_deref()
            .unwrap_or("download"),
    );

    let response = Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(response)
}

/// `m:ss` rendering of a duration, `N/A` when unknown.
fn format_duration(secs: u64) -> String {
    if secs == 0 {
        return "N/A".to_string();
    }
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Strip characters that would break the Content-Disposition header.
fn sanitize_filename(name: &str) -> String {
    name.chars().filter(|c| !matches!(c, '"' | '\r' | '\n')).collect()
}
