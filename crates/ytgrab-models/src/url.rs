//! YouTube URL validation and canonicalization.
//!
//! Validation and normalization are separate operations. Validation gates
//! whether a request is accepted at all; normalization is best effort and
//! never fails: when no video id can be found the input passes through
//! unchanged and downstream calls use the raw URL.

/// Hosts recognized as YouTube, matched after stripping the scheme.
const YOUTUBE_HOSTS: [&str; 8] = [
    "youtube.com/",
    "www.youtube.com/",
    "m.youtube.com/",
    "youtu.be/",
    "www.youtu.be/",
    "youtube-nocookie.com/",
    "www.youtube-nocookie.com/",
    "music.youtube.com/",
];

/// Markers preceding a video id, tried in order.
const ID_MARKERS: [&str; 6] = ["?v=", "&v=", "youtu.be/", "/embed/", "/shorts/", "/v/"];

/// Check whether a URL points at a recognized YouTube host.
pub fn is_valid_youtube_url(url: &str) -> bool {
    let url = url.trim().to_ascii_lowercase();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(&url);
    YOUTUBE_HOSTS.iter().any(|host| rest.starts_with(host))
}

/// Canonicalize a YouTube URL to `https://www.youtube.com/watch?v=<id>`.
///
/// Returns the input unchanged when no 11-character video id can be
/// extracted. This function never errors.
pub fn clean_youtube_url(url: &str) -> String {
    match extract_video_id(url) {
        Some(id) => format!("https://www.youtube.com/watch?v={id}"),
        None => url.to_string(),
    }
}

/// Extract the 11-character video id from any recognized position.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    for marker in ID_MARKERS {
        if let Some(rest) = after(url, marker) {
            let id = take_id_segment(rest);
            if is_valid_video_id(id) {
                return Some(id.to_string());
            }
        }
    }
    None
}

/// The remainder of `url` after the first occurrence of `marker`.
fn after<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    url.find(marker).map(|pos| &url[pos + marker.len()..])
}

/// Cut a candidate id off at the next URL delimiter.
fn take_id_segment(segment: &str) -> &str {
    let end = segment
        .find(['&', '#', '?', '/'])
        .unwrap_or(segment.len());
    segment[..end].trim()
}

/// YouTube video ids are exactly 11 characters of `[A-Za-z0-9_-]`.
fn is_valid_video_id(id: &str) -> bool {
    id.len() == 11 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
