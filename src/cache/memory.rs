//! In-memory cache store for tests.

use super::{ArtifactKind, CacheStore, SearchRecord};
use crate::chunking::Chunk;
use crate::error::Result;
use crate::transcript::Transcript;
use crate::video::VideoId;
use std::collections::HashMap;
use std::sync::Mutex;

/// HashMap-backed store with the same contract as the filesystem store.
#[derive(Default)]
pub struct MemoryCacheStore {
    transcripts: Mutex<HashMap<(VideoId, Option<String>), Transcript>>,
    chunks: Mutex<HashMap<VideoId, (usize, Vec<Chunk>)>>,
    searches: Mutex<Vec<SearchRecord>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All persisted search records, in save order.
    pub fn search_records(&self) -> Vec<SearchRecord> {
        self.searches.lock().unwrap().clone()
    }
}

impl CacheStore for MemoryCacheStore {
    fn has(&self, video_id: &VideoId, kind: &ArtifactKind) -> bool {
        match kind {
            ArtifactKind::Audio => false,
            ArtifactKind::Transcript { language } => self
                .transcripts
                .lock()
                .unwrap()
                .contains_key(&(video_id.clone(), language.clone())),
            ArtifactKind::Chunks => self.chunks.lock().unwrap().contains_key(video_id),
            ArtifactKind::SearchResults { query } => self
                .searches
                .lock()
                .unwrap()
                .iter()
                .any(|r| &r.video_id == video_id && &r.query == query),
        }
    }

    fn load_transcript(
        &self,
        video_id: &VideoId,
        language: Option<&str>,
    ) -> Result<Option<Transcript>> {
        Ok(self
            .transcripts
            .lock()
            .unwrap()
            .get(&(video_id.clone(), language.map(str::to_string)))
            .cloned())
    }

    fn save_transcript(&self, transcript: &Transcript, language: Option<&str>) -> Result<()> {
        self.transcripts.lock().unwrap().insert(
            (transcript.video_id.clone(), language.map(str::to_string)),
            transcript.clone(),
        );
        Ok(())
    }

    fn load_chunks(&self, video_id: &VideoId, chunk_size: usize) -> Result<Option<Vec<Chunk>>> {
        Ok(self
            .chunks
            .lock()
            .unwrap()
            .get(video_id)
            .filter(|(size, _)| *size == chunk_size)
            .map(|(_, chunks)| chunks.clone()))
    }

    fn save_chunks(&self, video_id: &VideoId, chunk_size: usize, chunks: &[Chunk]) -> Result<()> {
        self.chunks
            .lock()
            .unwrap()
            .insert(video_id.clone(), (chunk_size, chunks.to_vec()));
        Ok(())
    }

    fn save_search(&self, record: &SearchRecord) -> Result<()> {
        self.searches.lock().unwrap().push(record.clone());
        Ok(())
    }
}
