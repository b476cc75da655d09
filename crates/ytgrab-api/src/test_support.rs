//! Synthetic media backend for handler and worker tests.

use std::path::PathBuf;

use async_trait::async_trait;

use ytgrab_media::{
    DownloadOutcome, DownloadRequest, MediaBackend, MediaError, MediaResult, ProgressEvent,
    ProgressSink, VideoMetadata,
};

/// Scripted [`MediaBackend`]: replays configured progress events and
/// returns configured results, failing where nothing was configured.
#[derive(Default)]
pub(crate) struct FakeBackend {
    metadata: Option<VideoMetadata>,
    events: Vec<ProgressEvent>,
    output_path: Option<PathBuf>,
    ffmpeg: bool,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_metadata(mut self, metadata: VideoMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub(crate) fn with_events(mut self, events: Vec<ProgressEvent>) -> Self {
        self.events = events;
        self
    }

    pub(crate) fn with_output(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }

    pub(crate) fn with_ffmpeg(mut self, available: bool) -> Self {
        self.ffmpeg = available;
        self
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    fn version(&self) -> &str {
        "fake 0.0.0"
    }

    async fn ffmpeg_available(&self) -> bool {
        self.ffmpeg
    }

    async fn fetch_metadata(&self, url: &str) -> MediaResult<VideoMetadata> {
        self.metadata
            .clone()
            .ok_or_else(|| MediaError::metadata_failed(format!("no metadata for {url}")))
    }

    async fn download(
        &self,
        _request: &DownloadRequest,
        sink: ProgressSink,
    ) -> MediaResult<DownloadOutcome> {
        for event in &self.events {
            sink(*event);
        }
        self.output_path
            .clone()
            .map(|output_path| DownloadOutcome { output_path })
            .ok_or_else(|| MediaError::download_failed("scripted failure"))
    }
}

pub(crate) fn sample_metadata() -> VideoMetadata {
    VideoMetadata {
        title: "Test Video".to_string(),
        uploader: "Test Channel".to_string(),
        duration_secs: 125,
        view_count: 4321,
        thumbnail: "https://i.ytimg.com/vi/dQw4w9WgXcQ/hq720.jpg".to_string(),
        heights: vec![1080, 720, 360],
    }
}
