//! Artifact cache abstraction.
//!
//! Every pipeline stage checks the cache before doing external work. The
//! store is an explicit object injected into the orchestrator so tests can
//! substitute [`MemoryCacheStore`]. Artifacts persist until manually
//! deleted; staleness is never checked, which is an accepted limitation.

mod fs;
mod memory;

pub use fs::FsCacheStore;
pub use memory::MemoryCacheStore;

use crate::chunking::Chunk;
use crate::error::Result;
use crate::search::SearchResult;
use crate::transcript::Transcript;
use crate::video::VideoId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The kinds of artifacts cached per video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Downloaded audio (MP3).
    Audio,
    /// Transcript for an optional language.
    Transcript { language: Option<String> },
    /// Chunked transcript ready for indexing.
    Chunks,
    /// Persisted results of a past query.
    SearchResults { query: String },
}

/// A persisted search, kept as per-video history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    /// The query that produced these results.
    pub query: String,
    /// Video the results belong to.
    pub video_id: VideoId,
    /// When the search ran.
    pub timestamp: DateTime<Utc>,
    /// Results for this video, ordered by score.
    pub results: Vec<SearchResult>,
}

/// Store for per-video pipeline artifacts.
pub trait CacheStore: Send + Sync {
    /// Whether an artifact is present for a video.
    fn has(&self, video_id: &VideoId, kind: &ArtifactKind) -> bool;

    /// Load a cached transcript, if present.
    fn load_transcript(
        &self,
        video_id: &VideoId,
        language: Option<&str>,
    ) -> Result<Option<Transcript>>;

    /// Persist a transcript under the given language key.
    fn save_transcript(&self, transcript: &Transcript, language: Option<&str>) -> Result<()>;

    /// Load cached chunks, if present and built with the same chunk size.
    fn load_chunks(&self, video_id: &VideoId, chunk_size: usize) -> Result<Option<Vec<Chunk>>>;

    /// Persist chunks along with the chunk size that produced them.
    fn save_chunks(&self, video_id: &VideoId, chunk_size: usize, chunks: &[Chunk]) -> Result<()>;

    /// Persist the results of a query for a video.
    fn save_search(&self, record: &SearchRecord) -> Result<()>;

    /// Directory for downloaded audio, if this store is disk-backed.
    fn audio_dir(&self, _video_id: &VideoId) -> Option<PathBuf> {
        None
    }
}
