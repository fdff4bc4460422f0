//! Media format enum and submission validation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// File extensions the service recognises as produced media.
///
/// Used by the engine's directory-scan fallback and by the post-processing
/// line pattern in the output parser.
pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mp3"];

/// Requested output form for a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    /// Video in an MP4 container (best video + best audio, merged).
    Mp4,
    /// Audio-only MP3 extraction at maximum quality.
    Mp3,
}

impl MediaFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mp3 => "mp3",
        }
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaFormat {
    type Err = CoreError;

    /// Parse a user-submitted format name. Unknown names are a validation
    /// failure, unlike [`TryFrom<String>`] which is for trusted store values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mp4" => Ok(Self::Mp4),
            "mp3" => Ok(Self::Mp3),
            other => Err(CoreError::Validation(format!(
                "Unsupported format '{other}'; expected one of: mp4, mp3"
            ))),
        }
    }
}

impl TryFrom<String> for MediaFormat {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "mp4" => Ok(Self::Mp4),
            "mp3" => Ok(Self::Mp3),
            other => Err(CoreError::Internal(format!(
                "Unknown media format in store: '{other}'"
            ))),
        }
    }
}

/// Validate a submitted resource locator.
///
/// The downloader itself decides whether the locator is fetchable; the
/// service only rejects submissions that cannot possibly be valid.
pub fn validate_url(url: &str) -> Result<(), CoreError> {
    if url.trim().is_empty() {
        return Err(CoreError::Validation(
            "Download URL must not be empty".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
