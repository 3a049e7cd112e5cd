//! Transcript acquisition with ordered fallback strategies.
//!
//! Strategies are tried in sequence, short-circuiting on the first success:
//! platform captions first, then audio download plus Whisper transcription.
//! A cached transcript skips the chain entirely.

use super::Transcript;
use crate::cache::CacheStore;
use crate::error::{FinnError, Result};
use crate::video::VideoId;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One way of producing a transcript for a video.
#[async_trait]
pub trait TranscriptStrategy: Send + Sync {
    /// Short name used in logs and error causes.
    fn name(&self) -> &'static str;

    /// Produce a transcript, or fail so the next strategy can try.
    async fn fetch(&self, video_id: &VideoId, language: Option<&str>) -> Result<Transcript>;
}

/// Runs the strategy chain and persists whatever it produces.
pub struct TranscriptAcquirer {
    store: Arc<dyn CacheStore>,
    strategies: Vec<Box<dyn TranscriptStrategy>>,
}

impl TranscriptAcquirer {
    /// Create an acquirer over an ordered strategy list.
    pub fn new(store: Arc<dyn CacheStore>, strategies: Vec<Box<dyn TranscriptStrategy>>) -> Self {
        Self { store, strategies }
    }

    /// Obtain a transcript for a video, from cache or by running strategies.
    ///
    /// On success the transcript is persisted under the requested language
    /// key. If every strategy fails, the error carries the last cause.
    #[instrument(skip(self), fields(video_id = %video_id))]
    pub async fn acquire(&self, video_id: &VideoId, language: Option<&str>) -> Result<Transcript> {
        if let Some(transcript) = self.store.load_transcript(video_id, language)? {
            info!("Using cached transcript");
            return Ok(transcript);
        }

        let mut last_cause = "no transcript strategies configured".to_string();

        for strategy in &self.strategies {
            info!("Trying transcript source: {}", strategy.name());
            match strategy.fetch(video_id, language).await {
                Ok(transcript) => {
                    self.store.save_transcript(&transcript, language)?;
                    info!(
                        segments = transcript.segments.len(),
                        source = %transcript.source,
                        "Transcript acquired"
                    );
                    return Ok(transcript);
                }
                Err(e) => {
                    warn!("{} failed: {}", strategy.name(), e);
                    last_cause = format!("{}: {}", strategy.name(), e);
                }
            }
        }

        Err(FinnError::TranscriptUnavailable {
            video_id: video_id.to_string(),
            cause: last_cause,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::transcript::{TranscriptSegment, TranscriptSource};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingStrategy {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TranscriptStrategy for FailingStrategy {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(&self, _video_id: &VideoId, _language: Option<&str>) -> Result<Transcript> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FinnError::CaptionFetch("no captions".to_string()))
        }
    }

    struct FixedStrategy {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TranscriptStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self, video_id: &VideoId, _language: Option<&str>) -> Result<Transcript> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Transcript::new(
                video_id.clone(),
                vec![TranscriptSegment::new(0.0, 5.0, "hello")],
                TranscriptSource::Whisper,
            ))
        }
    }

    fn vid() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[tokio::test]
    async fn test_fallback_then_persist() {
        let store = Arc::new(MemoryCacheStore::new());
        let failing_calls = Arc::new(AtomicUsize::new(0));
        let fixed_calls = Arc::new(AtomicUsize::new(0));

        let acquirer = TranscriptAcquirer::new(
            store.clone(),
            vec![
                Box::new(FailingStrategy {
                    calls: failing_calls.clone(),
                }),
                Box::new(FixedStrategy {
                    calls: fixed_calls.clone(),
                }),
            ],
        );

        let transcript = acquirer.acquire(&vid(), None).await.unwrap();
        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fixed_calls.load(Ordering::SeqCst), 1);

        // Second acquisition is served from cache, no strategy runs
        acquirer.acquire(&vid(), None).await.unwrap();
        assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fixed_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_strategies_failing_is_unavailable() {
        let store = Arc::new(MemoryCacheStore::new());
        let acquirer = TranscriptAcquirer::new(
            store,
            vec![Box::new(FailingStrategy {
                calls: Arc::new(AtomicUsize::new(0)),
            })],
        );

        let err = acquirer.acquire(&vid(), None).await.unwrap_err();
        match err {
            FinnError::TranscriptUnavailable { video_id, cause } => {
                assert_eq!(video_id, "dQw4w9WgXcQ");
                assert!(cause.contains("no captions"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
