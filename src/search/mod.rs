//! TF-IDF similarity search over transcript chunks.
//!
//! The index is built per query set over exactly the chunks being searched;
//! there is no persistent vocabulary.

mod tfidf;

pub use tfidf::TfIdfIndex;

use crate::error::{FinnError, Result};
use crate::video::VideoId;
use serde::{Deserialize, Serialize};

/// Tuning knobs for a similarity query.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Maximum number of results overall.
    pub top_k: usize,
    /// Minimum cosine similarity for a result to pass the filter (0.0-1.0).
    pub similarity_threshold: f64,
    /// Minimum results guaranteed per video, regardless of threshold.
    pub min_results_per_video: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: 0.1,
            min_results_per_video: 1,
        }
    }
}

impl QueryOptions {
    /// Validate option ranges before any work happens.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(FinnError::Config("top_k must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(FinnError::Config(format!(
                "similarity_threshold must be between 0.0 and 1.0, got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

/// A single scored search hit with its timestamped deep link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Video the matched chunk belongs to.
    pub video_id: VideoId,
    /// Deep link into the video at the chunk's start time.
    pub url: String,
    /// Chunk text.
    pub text: String,
    /// Chunk start time in seconds.
    pub start_seconds: f64,
    /// Chunk end time in seconds.
    pub end_seconds: f64,
    /// Speaker of the chunk's first segment, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Cosine similarity to the query, in [0, 1].
    pub score: f64,
}
