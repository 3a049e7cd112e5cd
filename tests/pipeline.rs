//! End-to-end pipeline tests with an in-memory store and fake transcript
//! strategies, so no network or external tools are involved.

use async_trait::async_trait;
use finn::cache::MemoryCacheStore;
use finn::config::Settings;
use finn::error::{FinnError, Result};
use finn::orchestrator::{Retriever, SearchConfig};
use finn::transcript::{Transcript, TranscriptSegment, TranscriptSource, TranscriptStrategy};
use finn::video::VideoId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const GOOD_ID: &str = "dQw4w9WgXcQ";
const OTHER_ID: &str = "jNQXAC9IVRw";

/// Serves a fixed three-segment transcript for [`GOOD_ID`] and fails for
/// everything else, counting every invocation.
struct ScriptedStrategy {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TranscriptStrategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(&self, video_id: &VideoId, _language: Option<&str>) -> Result<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if video_id.as_str() != GOOD_ID {
            return Err(FinnError::CaptionFetch(format!(
                "no captions for {}",
                video_id
            )));
        }
        Ok(Transcript::new(
            video_id.clone(),
            vec![
                TranscriptSegment::new(0.0, 5.0, "welcome to the show today we cook pasta")
                    .with_speaker("Speaker 1"),
                TranscriptSegment::new(5.0, 10.0, "machine learning is transforming software")
                    .with_speaker("Speaker 1"),
                TranscriptSegment::new(10.0, 15.0, "thanks for watching and goodbye")
                    .with_speaker("Speaker 2"),
            ],
            TranscriptSource::Captions,
        ))
    }
}

fn retriever_with_counter() -> (Retriever, Arc<AtomicUsize>, Arc<MemoryCacheStore>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(MemoryCacheStore::new());
    let retriever = Retriever::with_components(
        Settings::default(),
        store.clone(),
        vec![Box::new(ScriptedStrategy {
            calls: calls.clone(),
        })],
    );
    (retriever, calls, store)
}

fn config(chunk_size: usize, top_k: usize) -> SearchConfig {
    let mut config = SearchConfig::from_settings(&Settings::default());
    config.chunk_size = chunk_size;
    config.top_k = top_k;
    config
}

#[tokio::test]
async fn test_top_result_carries_timestamped_link() {
    let (retriever, _, _) = retriever_with_counter();

    let outcome = retriever
        .search(
            &[GOOD_ID.to_string()],
            "machine learning",
            &config(1, 3),
        )
        .await
        .unwrap();

    assert!(!outcome.results.is_empty());
    let top = &outcome.results[0];
    assert!(top.text.contains("machine learning"));
    assert_eq!(top.start_seconds, 5.0);
    assert_eq!(top.url, format!("https://youtu.be/{}?t=5s", GOOD_ID));
    assert!(top.score > 0.0 && top.score <= 1.0 + 1e-9);
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn test_repeat_search_is_deterministic_and_cached() {
    let (retriever, calls, store) = retriever_with_counter();
    let config = config(1, 5);

    let first = retriever
        .search(&[GOOD_ID.to_string()], "machine learning", &config)
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let second = retriever
        .search(&[GOOD_ID.to_string()], "machine learning", &config)
        .await
        .unwrap();

    // Cached chunks mean no second acquisition.
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let first_json = serde_json::to_value(&first.results).unwrap();
    let second_json = serde_json::to_value(&second.results).unwrap();
    assert_eq!(first_json, second_json);

    // Both runs leave a search record behind for the video.
    let records = store.search_records();
    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .all(|r| r.query == "machine learning" && r.video_id.as_str() == GOOD_ID));
}

#[tokio::test]
async fn test_malformed_reference_fails_before_any_fetch() {
    let (retriever, calls, _) = retriever_with_counter();

    let err = retriever
        .search_video("not-a-valid-id!!", "anything", 5)
        .await
        .unwrap_err();
    assert!(matches!(err, FinnError::InvalidVideoReference(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let err = retriever
        .search(&["also bad".to_string()], "anything", &config(1, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, FinnError::InvalidVideoReference(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_partial_failure_skips_video_and_records_it() {
    let (retriever, _, _) = retriever_with_counter();

    let outcome = retriever
        .search(
            &[GOOD_ID.to_string(), OTHER_ID.to_string()],
            "machine learning",
            &config(1, 5),
        )
        .await
        .unwrap();

    assert!(!outcome.results.is_empty());
    assert!(outcome
        .results
        .iter()
        .all(|r| r.video_id.as_str() == GOOD_ID));
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].reference, OTHER_ID);
    assert!(outcome.failures[0].error.contains("no captions"));
}

#[tokio::test]
async fn test_all_videos_failing_is_an_error() {
    let (retriever, _, _) = retriever_with_counter();

    let err = retriever
        .search(&[OTHER_ID.to_string()], "anything", &config(1, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, FinnError::NoTranscriptsAvailable));
}

#[tokio::test]
async fn test_blank_query_is_rejected() {
    let (retriever, calls, _) = retriever_with_counter();

    let err = retriever
        .search(&[GOOD_ID.to_string()], "   ", &config(1, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, FinnError::InvalidQuery(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_min_results_backfills_below_threshold() {
    let (retriever, _, _) = retriever_with_counter();

    let mut config = config(1, 5);
    config.similarity_threshold = 0.9;
    config.min_results_per_video = 2;

    let outcome = retriever
        .search(&[GOOD_ID.to_string()], "machine learning", &config)
        .await
        .unwrap();

    // Only the matching chunk clears 0.9, but the guarantee keeps the
    // next-best chunk for the video too.
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results[0].text.contains("machine learning"));
    assert!(outcome.results[0].score >= outcome.results[1].score);
}
