//! yt-dlp adapter.
//!
//! Shells out to the yt-dlp CLI for metadata extraction and downloads.
//! Download progress is parsed from stdout lines shaped by
//! `--progress-template`; the final output path comes from
//! `--print after_move:filepath`, which already reflects any merge or
//! transcode step.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::backend::{
    DownloadOutcome, DownloadRequest, MediaBackend, ProgressEvent, ProgressSink, VideoMetadata,
};
use crate::error::{MediaError, MediaResult};
use crate::ffmpeg;

/// Bounds individual network stalls, not total job duration.
const SOCKET_TIMEOUT_SECS: &str = "30";

/// Stdout prefix for download progress records.
const PROGRESS_TAG: &str = "dlp-progress ";

/// Stdout line emitted when yt-dlp hands a file to post-processing.
const POSTPROC_TAG: &str = "dlp-postprocess";

/// Streams below this height are preview noise, not offered to clients.
const MIN_FORMAT_HEIGHT: u32 = 144;

/// Production [`MediaBackend`] backed by the yt-dlp CLI.
pub struct YtDlpBackend {
    version: String,
    cookies_file: Option<PathBuf>,
}

impl YtDlpBackend {
    /// Resolve yt-dlp on PATH and capture its version.
    ///
    /// Call once at startup; a missing binary is fatal for the process.
    pub async fn detect() -> MediaResult<Self> {
        which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

        let output = Command::new("yt-dlp")
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await?;
        if !output.status.success() {
            return Err(MediaError::YtDlpNotFound);
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!(version = %version, "yt-dlp detected");
        Ok(Self {
            version,
            cookies_file: None,
        })
    }

    /// Pass a Netscape cookies file to every yt-dlp invocation.
    pub fn with_cookies(mut self, path: PathBuf) -> Self {
        self.cookies_file = Some(path);
        self
    }

    fn push_common_args(&self, args: &mut Vec<String>) {
        args.push("--socket-timeout".to_string());
        args.push(SOCKET_TIMEOUT_SECS.to_string());
        if let Some(cookies) = &self.cookies_file {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }
    }
}

#[async_trait]
impl MediaBackend for YtDlpBackend {
    fn version(&self) -> &str {
        &self.version
    }

    async fn ffmpeg_available(&self) -> bool {
        ffmpeg::ffmpeg_available().await
    }

    async fn fetch_metadata(&self, url: &str) -> MediaResult<VideoMetadata> {
        let mut args = vec!["-J".to_string(), "--no-warnings".to_string()];
        self.push_common_args(&mut args);
        args.push(url.to_string());

        debug!(url = %url, "Probing video metadata");

        let output = Command::new("yt-dlp")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp -J stderr: {}", stderr);
            return Err(MediaError::metadata_failed(last_stderr_line(&stderr)));
        }

        let info: RawInfo = serde_json::from_slice(&output.stdout)?;
        Ok(metadata_from_info(info))
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        sink: ProgressSink,
    ) -> MediaResult<DownloadOutcome> {
        let mut args = vec![
            // Quiet suppresses status chatter on stdout; progress lines and
            // --print output still come through, which keeps line parsing
            // unambiguous.
            "--quiet".to_string(),
            "--progress".to_string(),
            "--no-warnings".to_string(),
            "--newline".to_string(),
            "--progress-template".to_string(),
            format!(
                "download:{PROGRESS_TAG}%(progress.downloaded_bytes)s \
                 %(progress.total_bytes)s %(progress.total_bytes_estimate)s"
            ),
            "--progress-template".to_string(),
            format!("postprocess:{POSTPROC_TAG}"),
            // --print alone implies simulation
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
        ];
        args.extend(request.selection.to_args());
        self.push_common_args(&mut args);
        args.push("-o".to_string());
        args.push(request.output_template.clone());
        args.push(request.url.clone());

        debug!(url = %request.url, format = %request.selection.format, "Spawning yt-dlp download");

        let mut child = Command::new("yt-dlp")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::download_failed("yt-dlp stdout not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::download_failed("yt-dlp stderr not captured"))?;

        // Drain stderr concurrently so a chatty process cannot deadlock
        // on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut final_path: Option<PathBuf> = None;
        while let Some(line) = lines.next_line().await? {
            if let Some(fields) = line.strip_prefix(PROGRESS_TAG) {
                if let Some(event) = parse_progress_fields(fields) {
                    sink(event);
                }
            } else if line.starts_with(POSTPROC_TAG) {
                sink(ProgressEvent::PostProcessing);
            } else if !line.trim().is_empty() {
                // `--print after_move:filepath` output; the last printed
                // path wins when yt-dlp touches multiple files
                final_path = Some(PathBuf::from(line.trim()));
            }
        }

        let status = child.wait().await?;
        let stderr_buf = stderr_task.await.unwrap_or_default();

        if !status.success() {
            debug!("yt-dlp download stderr: {}", stderr_buf);
            return Err(MediaError::download_failed(last_stderr_line(&stderr_buf)));
        }

        let output_path = final_path
            .ok_or_else(|| MediaError::download_failed("yt-dlp did not report an output file"))?;
        if !output_path.exists() {
            return Err(MediaError::download_failed(format!(
                "Output file missing: {}",
                output_path.display()
            )));
        }

        info!(output = %output_path.display(), "Download finished");
        Ok(DownloadOutcome { output_path })
    }
}

/// yt-dlp `-J` output, reduced to the fields this system uses.
#[derive(Debug, Deserialize)]
struct RawInfo {
    title: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
    view_count: Option<u64>,
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    vcodec: Option<String>,
    height: Option<u32>,
}

fn metadata_from_info(info: RawInfo) -> VideoMetadata {
    let mut heights: Vec<u32> = info
        .formats
        .iter()
        .filter(|f| f.vcodec.as_deref().is_some_and(|v| v != "none"))
        .filter_map(|f| f.height)
        .filter(|h| *h >= MIN_FORMAT_HEIGHT)
        .collect();
    heights.sort_unstable_by(|a, b| b.cmp(a));
    heights.dedup();

    VideoMetadata {
        title: info.title.unwrap_or_else(|| "N/A".to_string()),
        uploader: info.uploader.unwrap_or_else(|| "N/A".to_string()),
        duration_secs: info.duration.unwrap_or(0.0).max(0.0) as u64,
        view_count: info.view_count.unwrap_or(0),
        thumbnail: info.thumbnail.unwrap_or_default(),
        heights,
    }
}

/// Parse `"<downloaded> <total> <estimate>"`; yt-dlp prints `NA` for
/// values it does not know.
fn parse_progress_fields(fields: &str) -> Option<ProgressEvent> {
    let mut parts = fields.split_whitespace();
    let downloaded_bytes = parse_bytes(parts.next()?)?;
    let total = parts.next().and_then(parse_bytes);
    let estimate = parts.next().and_then(parse_bytes);
    Some(ProgressEvent::Downloading {
        downloaded_bytes,
        total_bytes: total.or(estimate),
    })
}

/// Byte counts print as integers or floats depending on the field.
fn parse_bytes(s: &str) -> Option<u64> {
    s.parse::<f64>().ok().filter(|v| *v >= 0.0).map(|v| v as u64)
}

fn last_stderr_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("yt-dlp failed with no error output")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress_with_known_total() {
        assert_eq!(
            parse_progress_fields("512 1024 NA"),
            Some(ProgressEvent::Downloading {
                downloaded_bytes: 512,
                total_bytes: Some(1024),
            })
        );
    }

    #[test]
    fn test_parse_progress_falls_back_to_estimate() {
        assert_eq!(
            parse_progress_fields("512 NA 2048.0"),
            Some(ProgressEvent::Downloading {
                downloaded_bytes: 512,
                total_bytes: Some(2048),
            })
        );
    }

    #[test]
    fn test_parse_progress_without_any_total() {
        assert_eq!(
            parse_progress_fields("512 NA NA"),
            Some(ProgressEvent::Downloading {
                downloaded_bytes: 512,
                total_bytes: None,
            })
        );
    }

    #[test]
    fn test_parse_progress_rejects_garbage() {
        assert_eq!(parse_progress_fields("NA NA NA"), None);
        assert_eq!(parse_progress_fields(""), None);
        assert_eq!(parse_progress_fields("notanumber 100 100"), None);
    }

    #[test]
    fn test_last_stderr_line() {
        assert_eq!(
            last_stderr_line("WARNING: something\nERROR: video unavailable\n\n"),
            "ERROR: video unavailable"
        );
        assert_eq!(last_stderr_line(""), "yt-dlp failed with no error output");
    }

    #[test]
    fn test_metadata_heights_filtered_and_sorted() {
        let info = RawInfo {
            title: Some("A video".to_string()),
            uploader: None,
            duration: Some(95.7),
            view_count: Some(12),
            thumbnail: None,
            formats: vec![
                RawFormat { vcodec: Some("none".to_string()), height: Some(720) },
                RawFormat { vcodec: Some("avc1".to_string()), height: Some(360) },
                RawFormat { vcodec: Some("avc1".to_string()), height: Some(1080) },
                RawFormat { vcodec: Some("vp9".to_string()), height: Some(1080) },
                RawFormat { vcodec: Some("avc1".to_string()), height: Some(72) },
                RawFormat { vcodec: None, height: Some(480) },
            ],
        };
        let meta = metadata_from_info(info);
        assert_eq!(meta.heights, vec![1080, 360]);
        assert_eq!(meta.title, "A video");
        assert_eq!(meta.uploader, "N/A");
        assert_eq!(meta.duration_secs, 95);
        assert_eq!(meta.thumbnail, "");
    }
}
