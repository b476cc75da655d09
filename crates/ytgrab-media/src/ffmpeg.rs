//! FFmpeg capability probe.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::warn;

/// A hung ffmpeg must not stall job startup.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Check whether ffmpeg is runnable.
///
/// This is a capability flag, not an error: without ffmpeg, video
/// downloads fall back to pre-muxed streams and audio transcodes are
/// unavailable.
pub async fn ffmpeg_available() -> bool {
    if which::which("ffmpeg").is_err() {
        return false;
    }

    let probe = Command::new("ffmpeg")
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
        Ok(Ok(status)) => status.success(),
        Ok(Err(e)) => {
            warn!("ffmpeg probe failed: {}", e);
            false
        }
        Err(_) => {
            warn!("ffmpeg probe timed out");
            false
        }
    }
}
