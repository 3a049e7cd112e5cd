//! Video identifier parsing and link construction.
//!
//! A [`VideoId`] is the canonical key for all cached artifacts of a video.
//! It is derived once from user input and reused everywhere downstream.

use crate::error::{FinnError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Canonical 11-character YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Matches various YouTube URL formats and bare video IDs
        Regex::new(
            r"(?x)
            (?:
                # Full YouTube URLs
                (?:https?://)?
                (?:www\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            # Bare video ID (11 characters)
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex")
    })
}

impl VideoId {
    /// Parse a video reference: watch URL, short URL, embed URL, or bare ID.
    ///
    /// Parsing is pure; no filesystem or network access happens here.
    pub fn parse(input: &str) -> Result<Self> {
        let caps = video_id_regex()
            .captures(input.trim())
            .ok_or_else(|| FinnError::InvalidVideoReference(input.to_string()))?;

        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| VideoId(m.as_str().to_string()))
            .ok_or_else(|| FinnError::InvalidVideoReference(input.to_string()))
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }

    /// Deep link into the video at a given offset, e.g. `https://youtu.be/ID?t=5s`.
    pub fn url_at(&self, seconds: f64) -> String {
        format!("https://youtu.be/{}?t={}s", self.0, seconds as u64)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_formats() {
        for input in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtube.com/embed/dQw4w9WgXcQ",
            "youtube.com/v/dQw4w9WgXcQ",
            "dQw4w9WgXcQ",
            "  dQw4w9WgXcQ  ",
        ] {
            let id = VideoId::parse(input).unwrap();
            assert_eq!(id.as_str(), "dQw4w9WgXcQ");
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["not-a-valid-id!!", "", "short", "https://example.com/video"] {
            assert!(matches!(
                VideoId::parse(input),
                Err(FinnError::InvalidVideoReference(_))
            ));
        }
    }

    #[test]
    fn test_url_at() {
        let id = VideoId::parse("dQw4w9WgXcQ").unwrap();
        assert_eq!(id.url_at(5.0), "https://youtu.be/dQw4w9WgXcQ?t=5s");
        assert_eq!(id.url_at(5.9), "https://youtu.be/dQw4w9WgXcQ?t=5s");
        assert!(id.watch_url().ends_with("watch?v=dQw4w9WgXcQ"));
    }
}
