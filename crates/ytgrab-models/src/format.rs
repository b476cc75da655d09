//! Requested output format types.

use serde::{Deserialize, Serialize};

/// Whether the client asked for a video file or an audio-only extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    #[default]
    Video,
    Audio,
}

impl FormatKind {
    /// Get string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatKind::Video => "video",
            FormatKind::Audio => "audio",
        }
    }
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
