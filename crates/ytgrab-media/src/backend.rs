//! The media backend boundary.
//!
//! The rest of the system treats video extraction as a black box exposing
//! "fetch metadata" and "download with a progress sink". [`crate::YtDlpBackend`]
//! is the production implementation; tests substitute synthetic backends.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MediaResult;
use crate::format::FormatSelection;

/// Video metadata returned by the extraction backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub uploader: String,
    /// Duration in seconds; zero when unknown
    pub duration_secs: u64,
    pub view_count: u64,
    /// Thumbnail URL, empty when unavailable
    pub thumbnail: String,
    /// Distinct video stream heights, descending
    pub heights: Vec<u32>,
}

/// A single progress notification from an in-flight download.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEvent {
    /// Bytes fetched so far over the known or estimated total.
    Downloading {
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
    },
    /// Streams are on disk; the backend is merging or transcoding.
    PostProcessing,
}

impl ProgressEvent {
    /// Percentage for this event, rounded to one decimal.
    ///
    /// When no total is known the percentage is reported as 0 rather
    /// than failing.
    pub fn percent(&self) -> f64 {
        match self {
            ProgressEvent::Downloading {
                downloaded_bytes,
                total_bytes: Some(total),
            } if *total > 0 => {
                let pct = (*downloaded_bytes as f64 / *total as f64) * 100.0;
                (pct.min(100.0) * 10.0).round() / 10.0
            }
            ProgressEvent::Downloading { .. } => 0.0,
            ProgressEvent::PostProcessing => 100.0,
        }
    }
}

/// Progress sink invoked by the backend on its own execution context.
///
/// Implementations must be safe to call from any thread.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Parameters for one download invocation.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub selection: FormatSelection,
    /// yt-dlp output template, e.g. `/tmp/ytgrab_<id>_%(title)s.%(ext)s`
    pub output_template: String,
}

/// Result of a finished download.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Final path on disk, after any merge or transcode step
    pub output_path: PathBuf,
}

/// External video-extraction capability.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Version string of the underlying tool.
    fn version(&self) -> &str;

    /// Whether the transcode/merge helper is usable. Capability flag,
    /// never an error.
    async fn ffmpeg_available(&self) -> bool;

    /// Query metadata without downloading.
    async fn fetch_metadata(&self, url: &str) -> MediaResult<VideoMetadata>;

    /// Perform a download, reporting progress through `sink`.
    async fn download(
        &self,
        request: &DownloadRequest,
        sink: ProgressSink,
    ) -> MediaResult<DownloadOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_with_known_total() {
        let event = ProgressEvent::Downloading {
            downloaded_bytes: 50,
            total_bytes: Some(100),
        };
        assert_eq!(event.percent(), 50.0);
    }

    #[test]
    fn test_percent_without_total_is_zero() {
        let event = ProgressEvent::Downloading {
            downloaded_bytes: 1234,
            total_bytes: None,
        };
        assert_eq!(event.percent(), 0.0);

        let zero_total = ProgressEvent::Downloading {
            downloaded_bytes: 10,
            total_bytes: Some(0),
        };
        assert_eq!(zero_total.percent(), 0.0);
    }

    #[test]
    fn test_percent_rounds_to_one_decimal() {
        let event = ProgressEvent::Downloading {
            downloaded_bytes: 1,
            total_bytes: Some(3),
        };
        assert_eq!(event.percent(), 33.3);
    }

    #[test]
    fn test_percent_is_capped_at_100() {
        let event = ProgressEvent::Downloading {
            downloaded_bytes: 150,
            total_bytes: Some(100),
        };
        assert_eq!(event.percent(), 100.0);
        assert_eq!(ProgressEvent::PostProcessing.percent(), 100.0);
    }
}
