//! Whisper speech-to-text fallback.
//!
//! When no captions exist, downloads the video's audio (reusing a cached
//! file when present) and runs the `whisper` CLI. Segments get speaker
//! labels from a conversational-cue heuristic.

use super::{Transcript, TranscriptSegment, TranscriptSource, TranscriptStrategy};
use crate::audio::download_audio;
use crate::config::ModelSize;
use crate::error::{FinnError, Result};
use crate::video::VideoId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, instrument};

/// Words that tend to open a new speaker's turn in conversation.
const SPEAKER_SWITCH_WORDS: &[&str] = &["so", "well", "yeah", "now", "but", "and", "actually"];

/// Transcript strategy backed by audio download and Whisper.
pub struct WhisperStrategy {
    model: ModelSize,
    data_dir: PathBuf,
}

impl WhisperStrategy {
    pub fn new(model: ModelSize, data_dir: PathBuf) -> Self {
        Self { model, data_dir }
    }

    /// Run the whisper CLI on an audio file and parse its JSON output.
    #[instrument(skip(self, audio_path))]
    async fn transcribe(
        &self,
        audio_path: &Path,
        output_dir: &Path,
        language: Option<&str>,
    ) -> Result<(Vec<TranscriptSegment>, Option<String>)> {
        let mut command = Command::new("whisper");
        command
            .arg(audio_path)
            .arg("--model").arg(self.model.to_string())
            .arg("--output_format").arg("json")
            .arg("--output_dir").arg(output_dir)
            .arg("--verbose").arg("False");
        if let Some(lang) = language {
            command.arg("--language").arg(lang);
        }

        let result = command
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FinnError::ToolNotFound("whisper".into()));
            }
            Err(e) => {
                return Err(FinnError::Transcription(format!(
                    "whisper execution failed: {e}"
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FinnError::Transcription(format!("whisper failed: {stderr}")));
        }

        // whisper writes <audio stem>.json next to the requested output dir
        let stem = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let json_path = output_dir.join(format!("{}.json", stem));
        let content = std::fs::read_to_string(&json_path)
            .map_err(|e| FinnError::Transcription(format!("Missing whisper output: {e}")))?;
        let json: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| FinnError::Transcription(format!("Invalid whisper output: {e}")))?;

        let raw = json["segments"]
            .as_array()
            .ok_or_else(|| FinnError::Transcription("No segments in whisper output".into()))?;

        let segments: Vec<TranscriptSegment> = raw
            .iter()
            .filter_map(|s| {
                let text = s["text"].as_str()?.trim().to_string();
                if text.is_empty() {
                    return None;
                }
                Some(TranscriptSegment::new(
                    s["start"].as_f64().unwrap_or(0.0),
                    s["end"].as_f64().unwrap_or(0.0),
                    text,
                ))
            })
            .collect();

        if segments.is_empty() {
            return Err(FinnError::Transcription(
                "Whisper produced no segments".into(),
            ));
        }

        let detected = json["language"].as_str().map(str::to_string);
        Ok((segments, detected))
    }
}

/// Assign alternating speaker labels based on conversational cues.
///
/// A segment opening with a switch word is treated as a turn change between
/// two speakers. Crude, but matches the behavior of the transcript TXT
/// format downstream.
pub fn assign_speakers(segments: Vec<TranscriptSegment>) -> Vec<TranscriptSegment> {
    let mut current = 0usize;

    segments
        .into_iter()
        .enumerate()
        .map(|(i, segment)| {
            let text = segment.text.to_lowercase();
            let opens_with_cue = SPEAKER_SWITCH_WORDS
                .iter()
                .any(|word| text.starts_with(word));
            if i > 0 && opens_with_cue {
                current = (current + 1) % 2;
            }
            segment.with_speaker(format!("Speaker {}", current + 1))
        })
        .collect()
}

#[async_trait]
impl TranscriptStrategy for WhisperStrategy {
    fn name(&self) -> &'static str {
        "whisper"
    }

    async fn fetch(&self, video_id: &VideoId, language: Option<&str>) -> Result<Transcript> {
        let audio_dir = self.data_dir.join(video_id.as_str()).join("audio");
        let audio_path = download_audio(&video_id.watch_url(), video_id.as_str(), &audio_dir).await?;

        info!(model = %self.model, "Transcribing audio");
        let (segments, detected) = self.transcribe(&audio_path, &audio_dir, language).await?;
        let segments = assign_speakers(segments);

        Ok(
            Transcript::new(video_id.clone(), segments, TranscriptSource::Whisper)
                .with_language(language.map(str::to_string).or(detected)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_speakers_alternates_on_cues() {
        let segments = vec![
            TranscriptSegment::new(0.0, 5.0, "Welcome to the show."),
            TranscriptSegment::new(5.0, 10.0, "So what do you think?"),
            TranscriptSegment::new(10.0, 15.0, "Well, it depends."),
            TranscriptSegment::new(15.0, 20.0, "Right, I see."),
        ];

        let labeled = assign_speakers(segments);
        let speakers: Vec<&str> = labeled
            .iter()
            .map(|s| s.speaker.as_deref().unwrap())
            .collect();

        assert_eq!(
            speakers,
            vec!["Speaker 1", "Speaker 2", "Speaker 1", "Speaker 1"]
        );
    }

    #[test]
    fn test_first_segment_never_switches() {
        let segments = vec![TranscriptSegment::new(0.0, 5.0, "So here we go.")];
        let labeled = assign_speakers(segments);
        assert_eq!(labeled[0].speaker.as_deref(), Some("Speaker 1"));
    }
}
