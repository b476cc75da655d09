//! Output format selection.
//!
//! Maps the requested `(format_type, quality)` pair and ffmpeg
//! availability to a yt-dlp format expression plus any post-processing
//! arguments.

use ytgrab_models::FormatKind;

/// Resolved download format for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSelection {
    /// yt-dlp `-f` expression
    pub format: String,
    /// Audio codec to extract to (`-x --audio-format`), when transcoding
    pub extract_audio: Option<&'static str>,
    /// Preferred audio quality, passed alongside an mp3 extract
    pub audio_quality: Option<&'static str>,
    /// Container to merge separate video/audio streams into
    pub merge_output_format: Option<&'static str>,
}

impl FormatSelection {
    /// File extension the finished file will carry when a transcode
    /// changes it from the container's native one.
    pub fn expected_extension(&self) -> Option<&'static str> {
        self.extract_audio
    }

    /// yt-dlp arguments for this selection.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), self.format.clone()];
        if let Some(codec) = self.extract_audio {
            args.push("-x".to_string());
            args.push("--audio-format".to_string());
            args.push(codec.to_string());
            if let Some(quality) = self.audio_quality {
                args.push("--audio-quality".to_string());
                args.push(quality.to_string());
            }
        }
        if let Some(container) = self.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(container.to_string());
        }
        args
    }
}

/// Height cap parsed from a quality string such as `720p`.
///
/// `None` selects the best-quality path; the sentinel is anything that is
/// not `<digits>p`, which covers both `best` and the UI label
/// `Best quality`.
pub fn parse_height(quality: &str) -> Option<u32> {
    quality.trim().strip_suffix('p').and_then(|h| h.parse().ok())
}

/// Pick the yt-dlp format for a `(kind, quality)` request.
///
/// Audio transcodes (mp3/wav) need ffmpeg at download time, but yt-dlp
/// reports the missing post-processor itself; the availability flag only
/// shapes video selection, where pre-muxed fallbacks exist.
pub fn select_format(kind: FormatKind, quality: &str, ffmpeg_available: bool) -> FormatSelection {
    match kind {
        FormatKind::Audio => select_audio(quality),
        FormatKind::Video => select_video(quality, ffmpeg_available),
    }
}

fn select_audio(quality: &str) -> FormatSelection {
    let plain = FormatSelection {
        format: "bestaudio".to_string(),
        extract_audio: None,
        audio_quality: None,
        merge_output_format: None,
    };
    match quality.trim().to_ascii_lowercase().as_str() {
        "mp3" => FormatSelection {
            extract_audio: Some("mp3"),
            audio_quality: Some("192K"),
            ..plain
        },
        "m4a" => FormatSelection {
            // best audio already in the requested container, no transcode
            format: "bestaudio[ext=m4a]/bestaudio".to_string(),
            ..plain
        },
        "wav" => FormatSelection {
            extract_audio: Some("wav"),
            ..plain
        },
        _ => plain,
    }
}

fn select_video(quality: &str, ffmpeg_available: bool) -> FormatSelection {
    let height = parse_height(quality);
    let format = if ffmpeg_available {
        match height {
            Some(h) => format!(
                "bestvideo[height<={h}][ext=mp4]+bestaudio[ext=m4a]/best[height<={h}]"
            ),
            None => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best".to_string(),
        }
    } else {
        // Without the merge helper only pre-muxed streams are usable.
        match height {
            Some(h) => format!("best[height<={h}][ext=mp4]/best[height<={h}]"),
            None => "best[ext=mp4]/best".to_string(),
        }
    };
    FormatSelection {
        format,
        extract_audio: None,
        audio_quality: None,
        merge_output_format: ffmpeg_available.then_some("mp4"),
    }
}
