//! Retrieval orchestration.
//!
//! Drives the full pipeline for a search request: resolve references,
//! acquire transcripts (cache, captions, then Whisper), chunk, build one
//! TF-IDF corpus over all requested videos, score the query, and persist
//! per-video results. Acquisition failures are recorded per video and the
//! search proceeds with whatever remains.

use crate::cache::{CacheStore, FsCacheStore, SearchRecord};
use crate::chunking::{chunk_segments, Chunk};
use crate::config::Settings;
use crate::error::{FinnError, Result};
use crate::search::{QueryOptions, SearchResult, TfIdfIndex};
use crate::transcript::{CaptionStrategy, TranscriptAcquirer, TranscriptStrategy, WhisperStrategy};
use crate::video::VideoId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Per-request tuning for the pipeline.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of consecutive segments per chunk.
    pub chunk_size: usize,
    /// Maximum number of results overall.
    pub top_k: usize,
    /// Minimum cosine similarity for a result to pass the filter.
    pub similarity_threshold: f64,
    /// Minimum results guaranteed per video.
    pub min_results_per_video: usize,
    /// Preferred caption/transcription language.
    pub language: Option<String>,
}

impl SearchConfig {
    /// Build a config from settings defaults.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            chunk_size: settings.search.chunk_size,
            top_k: settings.search.top_k,
            similarity_threshold: settings.search.similarity_threshold,
            min_results_per_video: settings.search.min_results_per_video,
            language: settings.transcription.language.clone(),
        }
    }

    /// Reject invalid parameters before any external call happens.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(FinnError::Config(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        self.query_options().validate()
    }

    fn query_options(&self) -> QueryOptions {
        QueryOptions {
            top_k: self.top_k,
            similarity_threshold: self.similarity_threshold,
            min_results_per_video: self.min_results_per_video,
        }
    }
}

/// Pipeline progress, relayed by the web layer to subscribed clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Acquisition started for one video.
    VideoStarted {
        video_id: String,
        index: usize,
        total: usize,
    },
    /// A video's chunks are ready for indexing.
    VideoReady {
        video_id: String,
        chunk_count: usize,
    },
    /// One video failed and was skipped.
    VideoFailed { reference: String, error: String },
    /// The whole search finished.
    Completed { result_count: usize },
}

/// A per-video failure recorded during a multi-video search.
#[derive(Debug, Clone, Serialize)]
pub struct VideoFailure {
    /// The reference as the caller passed it.
    pub reference: String,
    /// Why it was skipped.
    pub error: String,
}

/// The outcome of a search: ordered results plus any skipped videos.
#[derive(Debug)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub failures: Vec<VideoFailure>,
}

/// The main orchestrator for the Finn pipeline.
pub struct Retriever {
    settings: Settings,
    store: Arc<dyn CacheStore>,
    acquirer: TranscriptAcquirer,
    /// Per-identifier locks so concurrent callers for the same uncached
    /// video await one in-flight acquisition instead of duplicating it.
    locks: Mutex<HashMap<VideoId, Arc<Mutex<()>>>>,
}

impl Retriever {
    /// Create a retriever with the default filesystem store and the
    /// captions-then-whisper strategy chain.
    pub fn new(settings: Settings) -> Result<Self> {
        let store: Arc<dyn CacheStore> = Arc::new(FsCacheStore::new(settings.data_dir())?);

        let strategies: Vec<Box<dyn TranscriptStrategy>> = vec![
            Box::new(CaptionStrategy::new(reqwest::Client::new())),
            Box::new(WhisperStrategy::new(
                settings.transcription.model,
                settings.data_dir(),
            )),
        ];

        Ok(Self::with_components(settings, store, strategies))
    }

    /// Create a retriever with injected components (used by tests).
    pub fn with_components(
        settings: Settings,
        store: Arc<dyn CacheStore>,
        strategies: Vec<Box<dyn TranscriptStrategy>>,
    ) -> Self {
        let acquirer = TranscriptAcquirer::new(store.clone(), strategies);
        Self {
            settings,
            store,
            acquirer,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The settings this retriever was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The cache store backing this retriever.
    pub fn store(&self) -> Arc<dyn CacheStore> {
        self.store.clone()
    }

    /// Search one or more videos for a query.
    pub async fn search(
        &self,
        references: &[String],
        query: &str,
        config: &SearchConfig,
    ) -> Result<SearchOutcome> {
        self.search_with_progress(references, query, config, |_| {})
            .await
    }

    /// Search with a progress callback invoked per pipeline stage.
    #[instrument(skip(self, references, config, progress), fields(videos = references.len()))]
    pub async fn search_with_progress(
        &self,
        references: &[String],
        query: &str,
        config: &SearchConfig,
        progress: impl Fn(ProgressEvent) + Send,
    ) -> Result<SearchOutcome> {
        config.validate()?;
        if query.trim().is_empty() {
            return Err(FinnError::InvalidQuery("query text is empty".to_string()));
        }
        if references.is_empty() {
            return Err(FinnError::Config(
                "at least one video reference is required".to_string(),
            ));
        }

        // Resolve every reference before touching disk or network.
        let mut resolved: Vec<VideoId> = Vec::new();
        let mut failures: Vec<VideoFailure> = Vec::new();
        let mut first_invalid: Option<FinnError> = None;

        for reference in references {
            match VideoId::parse(reference) {
                Ok(id) => resolved.push(id),
                Err(e) => {
                    if first_invalid.is_none() {
                        first_invalid = Some(FinnError::InvalidVideoReference(reference.clone()));
                    }
                    failures.push(VideoFailure {
                        reference: reference.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if resolved.is_empty() {
            // Every reference was malformed; nothing was attempted.
            return Err(first_invalid.unwrap_or(FinnError::NoTranscriptsAvailable));
        }

        // Acquire and chunk per video, skipping failures.
        let total = resolved.len();
        let mut corpus: Vec<Chunk> = Vec::new();
        let mut succeeded: Vec<VideoId> = Vec::new();

        for (index, video_id) in resolved.iter().enumerate() {
            progress(ProgressEvent::VideoStarted {
                video_id: video_id.to_string(),
                index,
                total,
            });

            match self.chunks_for(video_id, config).await {
                Ok(chunks) => {
                    progress(ProgressEvent::VideoReady {
                        video_id: video_id.to_string(),
                        chunk_count: chunks.len(),
                    });
                    corpus.extend(chunks);
                    succeeded.push(video_id.clone());
                }
                Err(e) => {
                    warn!("Skipping video {}: {}", video_id, e);
                    progress(ProgressEvent::VideoFailed {
                        reference: video_id.to_string(),
                        error: e.to_string(),
                    });
                    failures.push(VideoFailure {
                        reference: video_id.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if succeeded.is_empty() {
            return Err(FinnError::NoTranscriptsAvailable);
        }

        info!(
            chunks = corpus.len(),
            videos = succeeded.len(),
            "Scoring query against corpus"
        );
        let index = TfIdfIndex::build(corpus);
        let results = index.query(query, &config.query_options())?;

        self.record_search(&succeeded, query, &results);

        progress(ProgressEvent::Completed {
            result_count: results.len(),
        });

        Ok(SearchOutcome { results, failures })
    }

    /// Single-video programmatic API.
    ///
    /// Resolves the reference, runs the pipeline for that one video, and
    /// returns the top `top_k` results.
    pub async fn search_video(
        &self,
        reference: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let video_id = VideoId::parse(reference)?;

        let mut config = SearchConfig::from_settings(&self.settings);
        config.top_k = top_k;
        config.validate()?;
        if query.trim().is_empty() {
            return Err(FinnError::InvalidQuery("query text is empty".to_string()));
        }

        let chunks = self.chunks_for(&video_id, &config).await?;
        let index = TfIdfIndex::build(chunks);
        let results = index.query(query, &config.query_options())?;

        self.record_search(std::slice::from_ref(&video_id), query, &results);

        Ok(results)
    }

    /// Cached chunks for a video, acquiring and chunking on a miss.
    ///
    /// Holds the per-identifier lock across the cache check and the
    /// acquisition so concurrent callers don't duplicate work.
    async fn chunks_for(&self, video_id: &VideoId, config: &SearchConfig) -> Result<Vec<Chunk>> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(video_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = lock.lock().await;

        if let Some(chunks) = self.store.load_chunks(video_id, config.chunk_size)? {
            info!(video_id = %video_id, "Using cached chunks");
            return Ok(chunks);
        }

        let transcript = self
            .acquirer
            .acquire(video_id, config.language.as_deref())
            .await?;
        let chunks = chunk_segments(video_id, &transcript.segments, config.chunk_size)?;
        self.store.save_chunks(video_id, config.chunk_size, &chunks)?;

        Ok(chunks)
    }

    /// Persist per-video search history. Failures here don't fail the search.
    fn record_search(&self, videos: &[VideoId], query: &str, results: &[SearchResult]) {
        let timestamp = chrono::Utc::now();
        for video_id in videos {
            let record = SearchRecord {
                query: query.to_string(),
                video_id: video_id.clone(),
                timestamp,
                results: results
                    .iter()
                    .filter(|r| &r.video_id == video_id)
                    .cloned()
                    .collect(),
            };
            if let Err(e) = self.store.save_search(&record) {
                warn!("Failed to persist search results for {}: {}", video_id, e);
            }
        }
    }
}
