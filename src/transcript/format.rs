//! Transcript output formatting (JSON, TXT, SRT).
//!
//! The cache store persists every acquired transcript in all three formats:
//! JSON is the authoritative artifact the pipeline reads back, TXT and SRT
//! are human-readable sidecars.

use super::{format_timestamp, Transcript};

/// Format a transcript as pretty-printed JSON.
pub fn format_json(transcript: &Transcript) -> crate::error::Result<String> {
    Ok(serde_json::to_string_pretty(transcript)?)
}

/// Format a transcript as human-readable text: `[H:MM:SS] Speaker N: text`.
pub fn format_txt(transcript: &Transcript) -> String {
    let mut output = String::new();
    output.push_str(&format!("Video: {}\n", transcript.video_id));
    output.push_str(&format!("Source: {}\n", transcript.source));
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    for segment in &transcript.segments {
        let timestamp = format_timestamp(segment.start_seconds);
        let speaker = segment.speaker.as_deref().unwrap_or("Speaker 1");
        output.push_str(&format!("[{}] {}: {}\n", timestamp, speaker, segment.text.trim()));
    }

    output
}

/// Format a transcript as SRT (SubRip).
pub fn format_srt(transcript: &Transcript) -> String {
    let mut output = String::new();

    for (i, segment) in transcript.segments.iter().enumerate() {
        // Sequence number (1-indexed)
        output.push_str(&format!("{}\n", i + 1));

        // Timestamps: 00:00:00,000 --> 00:00:00,000
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(segment.start_seconds),
            format_srt_timestamp(segment.end_seconds)
        ));

        match &segment.speaker {
            Some(speaker) => output.push_str(&format!("{}: {}", speaker, segment.text.trim())),
            None => output.push_str(segment.text.trim()),
        }
        output.push_str("\n\n");
    }

    output
}

/// Format timestamp for SRT (00:00:00,000).
fn format_srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0) as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{TranscriptSegment, TranscriptSource};
    use crate::video::VideoId;

    fn sample_transcript() -> Transcript {
        Transcript::new(
            VideoId::parse("dQw4w9WgXcQ").unwrap(),
            vec![
                TranscriptSegment::new(0.0, 2.5, "Hello world.").with_speaker("Speaker 1"),
                TranscriptSegment::new(2.5, 5.0, "This is a test.").with_speaker("Speaker 2"),
            ],
            TranscriptSource::Whisper,
        )
    }

    #[test]
    fn test_format_json() {
        let json = format_json(&sample_transcript()).unwrap();
        assert!(json.contains("\"video_id\": \"dQw4w9WgXcQ\""));
        assert!(json.contains("Hello world."));
        assert!(json.contains("\"source\": \"whisper\""));
    }

    #[test]
    fn test_format_txt() {
        let txt = format_txt(&sample_transcript());
        assert!(txt.contains("[0:00:00] Speaker 1: Hello world."));
        assert!(txt.contains("[0:00:02] Speaker 2: This is a test."));
    }

    #[test]
    fn test_format_srt() {
        let srt = format_srt(&sample_transcript());
        assert!(srt.contains("1\n00:00:00,000 --> 00:00:02,500"));
        assert!(srt.contains("Speaker 1: Hello world."));
        assert!(srt.contains("2\n00:00:02,500 --> 00:00:05,000"));
    }

    #[test]
    fn test_srt_timestamp() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(61.5), "00:01:01,500");
        assert_eq!(format_srt_timestamp(3661.123), "01:01:01,123");
    }
}
