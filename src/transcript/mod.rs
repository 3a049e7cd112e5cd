//! Transcript acquisition and data models.
//!
//! A transcript is an ordered sequence of timestamped segments, produced by
//! either platform captions or Whisper speech-to-text. Both sources are
//! normalized into the same [`TranscriptSegment`] shape.

mod acquire;
mod captions;
pub mod format;
mod whisper;

pub use acquire::{TranscriptAcquirer, TranscriptStrategy};
pub use captions::{CaptionStrategy, CaptionTrack};
pub use whisper::WhisperStrategy;

use crate::video::VideoId;
use serde::{Deserialize, Serialize};

/// Where a transcript came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptSource {
    /// Platform-native captions (manual or automatic).
    Captions,
    /// Whisper speech-to-text on downloaded audio.
    Whisper,
}

impl std::fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptSource::Captions => write!(f, "captions"),
            TranscriptSource::Whisper => write!(f, "whisper"),
        }
    }
}

/// A single segment of a transcript with timestamp information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Transcribed text content.
    pub text: String,
    /// Speaker label, if diarization produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

impl TranscriptSegment {
    /// Create a new transcript segment without a speaker label.
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
            speaker: None,
        }
    }

    /// Attach a speaker label.
    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// A complete transcript with segments, ordered by start time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Video this transcript belongs to.
    pub video_id: VideoId,
    /// Individual transcript segments with timestamps.
    pub segments: Vec<TranscriptSegment>,
    /// How this transcript was produced.
    pub source: TranscriptSource,
    /// Language code, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Transcript {
    /// Create a new transcript from segments.
    pub fn new(video_id: VideoId, segments: Vec<TranscriptSegment>, source: TranscriptSource) -> Self {
        Self {
            video_id,
            segments,
            source,
            language: None,
        }
    }

    /// Set the language code.
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    /// Total duration in seconds (end of the last segment).
    pub fn duration_seconds(&self) -> f64 {
        self.segments.last().map(|s| s.end_seconds).unwrap_or(0.0)
    }
}

/// Format seconds as H:MM:SS (hours not zero-padded, matching transcript TXT output).
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{}:{:02}:{:02}", hours, minutes, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_duration() {
        let id = VideoId::parse("dQw4w9WgXcQ").unwrap();
        let segments = vec![
            TranscriptSegment::new(0.0, 5.0, "Hello world"),
            TranscriptSegment::new(5.0, 10.0, "This is a test"),
        ];
        let transcript = Transcript::new(id, segments, TranscriptSource::Captions);
        assert_eq!(transcript.duration_seconds(), 10.0);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "0:00:00");
        assert_eq!(format_timestamp(65.0), "0:01:05");
        assert_eq!(format_timestamp(3665.0), "1:01:05");
    }
}
