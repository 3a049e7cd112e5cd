//! Disk-backed artifact cache.
//!
//! Layout under the root data directory, per video identifier:
//!
//! ```text
//! <id>/audio/<id>.mp3
//! <id>/transcripts/<id>[.<lang>].{json,txt,srt}
//! <id>/vectors/chunks.json
//! <id>/searches/<query-hash>.json
//! ```

use super::{ArtifactKind, CacheStore, SearchRecord};
use crate::chunking::Chunk;
use crate::error::Result;
use crate::transcript::{format, Transcript};
use crate::video::VideoId;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-based cache store rooted at a data directory.
pub struct FsCacheStore {
    root: PathBuf,
}

/// On-disk shape of `vectors/chunks.json`.
#[derive(Serialize, Deserialize)]
struct ChunkFile {
    video_id: VideoId,
    chunk_size: usize,
    chunk_count: usize,
    chunks: Vec<Chunk>,
}

impl FsCacheStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Location of an artifact on disk.
    pub fn path_for(&self, video_id: &VideoId, kind: &ArtifactKind) -> PathBuf {
        let video_dir = self.root.join(video_id.as_str());
        match kind {
            ArtifactKind::Audio => video_dir
                .join("audio")
                .join(format!("{}.mp3", video_id)),
            ArtifactKind::Transcript { language } => {
                let name = match language {
                    Some(lang) => format!("{}.{}.json", video_id, lang),
                    None => format!("{}.json", video_id),
                };
                video_dir.join("transcripts").join(name)
            }
            ArtifactKind::Chunks => video_dir.join("vectors").join("chunks.json"),
            ArtifactKind::SearchResults { query } => video_dir
                .join("searches")
                .join(format!("{}.json", query_hash(query))),
        }
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(value)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Stable filename-safe hash of a query string.
fn query_hash(query: &str) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    query.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

impl CacheStore for FsCacheStore {
    fn has(&self, video_id: &VideoId, kind: &ArtifactKind) -> bool {
        self.path_for(video_id, kind).exists()
    }

    fn load_transcript(
        &self,
        video_id: &VideoId,
        language: Option<&str>,
    ) -> Result<Option<Transcript>> {
        let path = self.path_for(
            video_id,
            &ArtifactKind::Transcript {
                language: language.map(str::to_string),
            },
        );
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let transcript: Transcript = serde_json::from_str(&content)?;
        debug!(video_id = %video_id, "loaded cached transcript");
        Ok(Some(transcript))
    }

    fn save_transcript(&self, transcript: &Transcript, language: Option<&str>) -> Result<()> {
        let kind = ArtifactKind::Transcript {
            language: language.map(str::to_string),
        };
        let json_path = self.path_for(&transcript.video_id, &kind);
        self.write_json(&json_path, transcript)?;

        // Human-readable sidecars; failures here don't lose the transcript.
        let txt_path = json_path.with_extension("txt");
        if let Err(e) = std::fs::write(&txt_path, format::format_txt(transcript)) {
            warn!("Failed to write transcript TXT: {}", e);
        }
        let srt_path = json_path.with_extension("srt");
        if let Err(e) = std::fs::write(&srt_path, format::format_srt(transcript)) {
            warn!("Failed to write transcript SRT: {}", e);
        }

        Ok(())
    }

    fn load_chunks(&self, video_id: &VideoId, chunk_size: usize) -> Result<Option<Vec<Chunk>>> {
        let path = self.path_for(video_id, &ArtifactKind::Chunks);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let file: ChunkFile = serde_json::from_str(&content)?;

        // Chunks built with a different size are recomputed, not reused.
        if file.chunk_size != chunk_size {
            debug!(
                video_id = %video_id,
                cached = file.chunk_size,
                requested = chunk_size,
                "cached chunks have a different chunk size"
            );
            return Ok(None);
        }

        Ok(Some(file.chunks))
    }

    fn save_chunks(&self, video_id: &VideoId, chunk_size: usize, chunks: &[Chunk]) -> Result<()> {
        let path = self.path_for(video_id, &ArtifactKind::Chunks);
        self.write_json(
            &path,
            &ChunkFile {
                video_id: video_id.clone(),
                chunk_size,
                chunk_count: chunks.len(),
                chunks: chunks.to_vec(),
            },
        )
    }

    fn save_search(&self, record: &SearchRecord) -> Result<()> {
        let path = self.path_for(
            &record.video_id,
            &ArtifactKind::SearchResults {
                query: record.query.clone(),
            },
        );
        self.write_json(&path, record)
    }

    fn audio_dir(&self, video_id: &VideoId) -> Option<PathBuf> {
        Some(self.root.join(video_id.as_str()).join("audio"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{TranscriptSegment, TranscriptSource};

    fn vid() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    fn sample_transcript() -> Transcript {
        Transcript::new(
            vid(),
            vec![
                TranscriptSegment::new(0.0, 5.0, "intro").with_speaker("Speaker 1"),
                TranscriptSegment::new(5.0, 10.0, "main topic").with_speaker("Speaker 2"),
            ],
            TranscriptSource::Captions,
        )
    }

    #[test]
    fn test_transcript_round_trip_with_sidecars() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(dir.path()).unwrap();

        assert!(!store.has(&vid(), &ArtifactKind::Transcript { language: None }));
        store.save_transcript(&sample_transcript(), None).unwrap();
        assert!(store.has(&vid(), &ArtifactKind::Transcript { language: None }));

        let loaded = store.load_transcript(&vid(), None).unwrap().unwrap();
        assert_eq!(loaded.segments.len(), 2);
        assert_eq!(loaded.segments[1].text, "main topic");

        // TXT and SRT sidecars land next to the JSON
        let transcripts = dir.path().join("dQw4w9WgXcQ").join("transcripts");
        assert!(transcripts.join("dQw4w9WgXcQ.txt").exists());
        assert!(transcripts.join("dQw4w9WgXcQ.srt").exists());
    }

    #[test]
    fn test_language_keyed_transcripts_are_separate() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(dir.path()).unwrap();

        store.save_transcript(&sample_transcript(), Some("en")).unwrap();
        assert!(store.load_transcript(&vid(), None).unwrap().is_none());
        assert!(store.load_transcript(&vid(), Some("en")).unwrap().is_some());
    }

    #[test]
    fn test_chunks_invalidated_by_chunk_size() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(dir.path()).unwrap();

        let chunks = crate::chunking::chunk_segments(
            &vid(),
            &sample_transcript().segments,
            2,
        )
        .unwrap();
        store.save_chunks(&vid(), 2, &chunks).unwrap();

        assert!(store.load_chunks(&vid(), 2).unwrap().is_some());
        assert!(store.load_chunks(&vid(), 3).unwrap().is_none());
    }

    #[test]
    fn test_search_record_path_is_query_hashed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCacheStore::new(dir.path()).unwrap();

        let record = SearchRecord {
            query: "machine learning".to_string(),
            video_id: vid(),
            timestamp: chrono::Utc::now(),
            results: Vec::new(),
        };
        store.save_search(&record).unwrap();

        assert!(store.has(
            &vid(),
            &ArtifactKind::SearchResults {
                query: "machine learning".to_string()
            }
        ));
        let searches = dir.path().join("dQw4w9WgXcQ").join("searches");
        assert_eq!(std::fs::read_dir(searches).unwrap().count(), 1);
    }
}
