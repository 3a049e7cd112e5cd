//! Platform caption fetching.
//!
//! Uses yt-dlp to enumerate a video's caption tracks, then fetches the
//! selected track in `json3` format and normalizes it into transcript
//! segments. Captions carry no speaker labels.

use super::{Transcript, TranscriptSegment, TranscriptSource, TranscriptStrategy};
use crate::error::{FinnError, Result};
use crate::video::VideoId;
use async_trait::async_trait;
use tracing::{debug, info};

/// An available caption track for a video.
#[derive(Debug, Clone)]
pub struct CaptionTrack {
    /// Language code (e.g. "en", "en-US").
    pub language: String,
    /// Whether this is an auto-generated track.
    pub automatic: bool,
    /// Track URL in json3 format.
    pub url: String,
}

/// Transcript strategy backed by platform-native captions.
pub struct CaptionStrategy {
    client: reqwest::Client,
}

impl CaptionStrategy {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Enumerate caption tracks using yt-dlp metadata.
    pub async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>> {
        let output = tokio::process::Command::new("yt-dlp")
            .args([
                "--dump-json",
                "--no-download",
                "--no-warnings",
                &video_id.watch_url(),
            ])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FinnError::ToolNotFound("yt-dlp".to_string())
                } else {
                    FinnError::CaptionFetch(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FinnError::CaptionFetch(format!(
                "Video {} not found or unavailable: {}",
                video_id, stderr
            )));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        let json: serde_json::Value = serde_json::from_str(&json_str)
            .map_err(|e| FinnError::CaptionFetch(format!("Failed to parse yt-dlp output: {}", e)))?;

        let mut tracks = Vec::new();
        collect_tracks(&json["subtitles"], false, &mut tracks);
        collect_tracks(&json["automatic_captions"], true, &mut tracks);

        debug!(count = tracks.len(), "caption tracks discovered");
        Ok(tracks)
    }

    /// Fetch a json3 caption track and normalize it into segments.
    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<TranscriptSegment>> {
        let body: serde_json::Value = self
            .client
            .get(&track.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let events = body["events"]
            .as_array()
            .ok_or_else(|| FinnError::CaptionFetch("No events in caption track".to_string()))?;

        let mut segments = Vec::new();
        for event in events {
            let Some(segs) = event["segs"].as_array() else {
                continue;
            };

            let text = segs
                .iter()
                .filter_map(|s| s["utf8"].as_str())
                .collect::<String>()
                .trim()
                .to_string();
            if text.is_empty() {
                continue;
            }

            let start_ms = event["tStartMs"].as_f64().unwrap_or(0.0);
            let duration_ms = event["dDurationMs"].as_f64().unwrap_or(0.0);

            segments.push(TranscriptSegment::new(
                start_ms / 1000.0,
                (start_ms + duration_ms) / 1000.0,
                text,
            ));
        }

        if segments.is_empty() {
            return Err(FinnError::CaptionFetch(
                "Caption track contained no text".to_string(),
            ));
        }

        Ok(segments)
    }
}

/// Flatten a yt-dlp caption map, keeping only json3-format entries.
fn collect_tracks(map: &serde_json::Value, automatic: bool, out: &mut Vec<CaptionTrack>) {
    let Some(languages) = map.as_object() else {
        return;
    };

    for (language, formats) in languages {
        let Some(formats) = formats.as_array() else {
            continue;
        };
        if let Some(url) = formats
            .iter()
            .find(|f| f["ext"].as_str() == Some("json3"))
            .and_then(|f| f["url"].as_str())
        {
            out.push(CaptionTrack {
                language: language.clone(),
                automatic,
                url: url.to_string(),
            });
        }
    }
}

/// Pick the best track: requested language if given (manual before auto),
/// otherwise manual English, first manual, auto English, first auto.
fn pick_track<'a>(tracks: &'a [CaptionTrack], language: Option<&str>) -> Option<&'a CaptionTrack> {
    let matches = |track: &CaptionTrack, lang: &str| {
        track.language == lang || track.language.starts_with(&format!("{}-", lang))
    };

    if let Some(lang) = language {
        return tracks
            .iter()
            .find(|t| !t.automatic && matches(t, lang))
            .or_else(|| tracks.iter().find(|t| t.automatic && matches(t, lang)));
    }

    tracks
        .iter()
        .find(|t| !t.automatic && matches(t, "en"))
        .or_else(|| tracks.iter().find(|t| !t.automatic))
        .or_else(|| tracks.iter().find(|t| t.automatic && matches(t, "en")))
        .or_else(|| tracks.first())
}

#[async_trait]
impl TranscriptStrategy for CaptionStrategy {
    fn name(&self) -> &'static str {
        "captions"
    }

    async fn fetch(&self, video_id: &VideoId, language: Option<&str>) -> Result<Transcript> {
        let tracks = self.list_tracks(video_id).await?;

        let track = pick_track(&tracks, language).ok_or_else(|| {
            FinnError::CaptionFetch(match language {
                Some(lang) => format!("No caption track for language '{}'", lang),
                None => "No caption tracks available".to_string(),
            })
        })?;

        info!(
            language = %track.language,
            automatic = track.automatic,
            "Fetching caption track"
        );

        let segments = self.fetch_track(track).await?;

        Ok(
            Transcript::new(video_id.clone(), segments, TranscriptSource::Captions)
                .with_language(Some(track.language.clone())),
        )
    }
}
