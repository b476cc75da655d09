//! External media tooling for the ytgrab backend.
//!
//! This crate wraps the yt-dlp and ffmpeg command line tools:
//! - Metadata probing and downloads with progress reporting
//! - Output format selection
//! - Stale output file reaping

pub mod backend;
pub mod error;
pub mod ffmpeg;
pub mod format;
pub mod reaper;
pub mod ytdlp;

pub use backend::{
    DownloadOutcome, DownloadRequest, MediaBackend, ProgressEvent, ProgressSink, VideoMetadata,
};
pub use error::{MediaError, MediaResult};
pub use ffmpeg::ffmpeg_available;
pub use format::{parse_height, select_format, FormatSelection};
pub use reaper::{FileReaper, OUTPUT_FILE_PREFIX};
pub use ytdlp::YtDlpBackend;
