//! Transcript chunking.
//!
//! Groups consecutive transcript segments into fixed-size chunks, the unit
//! of similarity search. Chunks never overlap, cover the full segment
//! sequence, and the last chunk may hold fewer segments.

use crate::error::{FinnError, Result};
use crate::transcript::TranscriptSegment;
use crate::video::VideoId;
use serde::{Deserialize, Serialize};

/// A fixed-size group of consecutive transcript segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Video this chunk belongs to.
    pub video_id: VideoId,
    /// Start time of the first segment in seconds.
    pub start_seconds: f64,
    /// End time of the last segment in seconds.
    pub end_seconds: f64,
    /// Whitespace-joined concatenation of the segment texts.
    pub text: String,
    /// Speaker of the first segment in the chunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

impl Chunk {
    /// Duration of this chunk in seconds.
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Partition segments into consecutive groups of `chunk_size`.
///
/// The last group may be smaller but is never dropped. A `chunk_size` of
/// zero is invalid input.
pub fn chunk_segments(
    video_id: &VideoId,
    segments: &[TranscriptSegment],
    chunk_size: usize,
) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(FinnError::Config(
            "chunk_size must be at least 1".to_string(),
        ));
    }

    let chunks = segments
        .chunks(chunk_size)
        .map(|group| {
            let text = group
                .iter()
                .map(|s| s.text.trim())
                .collect::<Vec<_>>()
                .join(" ");

            Chunk {
                video_id: video_id.clone(),
                start_seconds: group[0].start_seconds,
                end_seconds: group[group.len() - 1].end_seconds,
                text,
                speaker: group[0].speaker.clone(),
            }
        })
        .collect();

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(n: usize) -> Vec<TranscriptSegment> {
        (0..n)
            .map(|i| {
                TranscriptSegment::new(i as f64 * 5.0, (i + 1) as f64 * 5.0, format!("seg{}", i))
                    .with_speaker(format!("Speaker {}", i % 2 + 1))
            })
            .collect()
    }

    fn vid() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[test]
    fn test_chunk_count_is_ceil() {
        for (len, size, expected) in [(10, 3, 4), (9, 3, 3), (1, 6, 1), (0, 4, 0), (7, 7, 1)] {
            let chunks = chunk_segments(&vid(), &segments(len), size).unwrap();
            assert_eq!(chunks.len(), expected, "len={} size={}", len, size);
        }
    }

    #[test]
    fn test_concatenation_reproduces_segment_texts() {
        let segs = segments(10);
        let chunks = chunk_segments(&vid(), &segs, 3).unwrap();

        let joined: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.text.split_whitespace())
            .collect();
        let original: Vec<&str> = segs.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, original);
    }

    #[test]
    fn test_chunk_timestamps_and_speaker() {
        let chunks = chunk_segments(&vid(), &segments(7), 3).unwrap();

        assert_eq!(chunks[0].start_seconds, 0.0);
        assert_eq!(chunks[0].end_seconds, 15.0);
        assert_eq!(chunks[0].speaker.as_deref(), Some("Speaker 1"));

        // Last chunk is shorter, never dropped
        assert_eq!(chunks[2].start_seconds, 30.0);
        assert_eq!(chunks[2].end_seconds, 35.0);
        assert_eq!(chunks[2].text, "seg6");
    }

    #[test]
    fn test_zero_chunk_size_is_invalid() {
        assert!(matches!(
            chunk_segments(&vid(), &segments(3), 0),
            Err(FinnError::Config(_))
        ));
    }
}
