//! TF-IDF vector space and cosine similarity scoring.

use super::{QueryOptions, SearchResult};
use crate::chunking::Chunk;
use crate::error::{FinnError, Result};
use crate::video::VideoId;
use std::collections::HashMap;
use tracing::debug;

/// Common English stop words excluded from the vocabulary.
const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "do", "for",
    "from", "had", "has", "have", "he", "her", "here", "his", "how", "if", "in", "is", "it",
    "its", "just", "me", "more", "my", "no", "not", "of", "on", "or", "our", "out", "she", "so",
    "some", "than", "that", "the", "their", "them", "then", "there", "they", "this", "to", "too",
    "up", "was", "we", "were", "what", "when", "which", "who", "will", "with", "would", "you",
    "your",
];

/// Lowercase alphanumeric tokens of length >= 2, stop words removed.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2 && !STOP_WORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// A TF-IDF vector space over one corpus of chunks.
///
/// Chunk order is significant: ties in similarity are broken by position in
/// the corpus, so callers should append chunks in (video order, chunk order).
pub struct TfIdfIndex {
    chunks: Vec<Chunk>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    /// L2-normalized sparse rows, one per chunk, as (term index, weight).
    rows: Vec<Vec<(usize, f64)>>,
}

impl TfIdfIndex {
    /// Build the vector space over exactly these chunks.
    pub fn build(chunks: Vec<Chunk>) -> Self {
        let tokenized: Vec<Vec<String>> = chunks.iter().map(|c| tokenize(&c.text)).collect();

        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_freq: Vec<usize> = Vec::new();

        for tokens in &tokenized {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokens {
                let next_index = vocabulary.len();
                let index = *vocabulary.entry(token.clone()).or_insert_with(|| {
                    document_freq.push(0);
                    next_index
                });
                if !seen.contains(&index) {
                    document_freq[index] += 1;
                    seen.push(index);
                }
            }
        }

        // Smoothed inverse document frequency: ln((1 + n) / (1 + df)) + 1
        let n = chunks.len() as f64;
        let idf: Vec<f64> = document_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let rows: Vec<Vec<(usize, f64)>> = tokenized
            .iter()
            .map(|tokens| weighted_vector(tokens, &vocabulary, &idf))
            .collect();

        debug!(
            chunks = chunks.len(),
            vocabulary = vocabulary.len(),
            "built tf-idf index"
        );

        Self {
            chunks,
            vocabulary,
            idf,
            rows,
        }
    }

    /// Number of chunks in the corpus.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Score a query against every chunk and return the top results.
    ///
    /// Results pass the similarity threshold, except those back-filled so
    /// that every video keeps at least `min_results_per_video` hits (a video
    /// with fewer chunks than the minimum contributes all of them). Order is
    /// score descending with stable tie-break by corpus position.
    pub fn query(&self, text: &str, opts: &QueryOptions) -> Result<Vec<SearchResult>> {
        opts.validate()?;

        if text.trim().is_empty() {
            return Err(FinnError::InvalidQuery(
                "query text is empty".to_string(),
            ));
        }

        if self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = weighted_vector(&tokenize(text), &self.vocabulary, &self.idf);

        let scores: Vec<f64> = self.rows.iter().map(|row| sparse_dot(&query_vec, row)).collect();

        // Stable sort keeps corpus order for equal scores.
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut selected = vec![false; scores.len()];
        for &i in &order {
            if scores[i] >= opts.similarity_threshold {
                selected[i] = true;
            }
        }

        // Relaxation: back-fill each under-represented video with its
        // highest-scoring chunks, threshold notwithstanding.
        if opts.min_results_per_video > 0 {
            let mut per_video: HashMap<&VideoId, usize> = HashMap::new();
            for (i, chunk) in self.chunks.iter().enumerate() {
                if selected[i] {
                    *per_video.entry(&chunk.video_id).or_default() += 1;
                }
            }

            let videos: Vec<&VideoId> = {
                let mut seen: Vec<&VideoId> = Vec::new();
                for chunk in &self.chunks {
                    if !seen.contains(&&chunk.video_id) {
                        seen.push(&chunk.video_id);
                    }
                }
                seen
            };

            for video in videos {
                let mut count = per_video.get(video).copied().unwrap_or(0);
                if count >= opts.min_results_per_video {
                    continue;
                }
                for &i in &order {
                    if !selected[i] && &self.chunks[i].video_id == video {
                        selected[i] = true;
                        count += 1;
                        if count >= opts.min_results_per_video {
                            break;
                        }
                    }
                }
            }
        }

        let results = order
            .iter()
            .filter(|&&i| selected[i])
            .take(opts.top_k)
            .map(|&i| {
                let chunk = &self.chunks[i];
                SearchResult {
                    video_id: chunk.video_id.clone(),
                    url: chunk.video_id.url_at(chunk.start_seconds),
                    text: chunk.text.clone(),
                    start_seconds: chunk.start_seconds,
                    end_seconds: chunk.end_seconds,
                    speaker: chunk.speaker.clone(),
                    score: scores[i],
                }
            })
            .collect();

        Ok(results)
    }
}

/// Term-frequency counts weighted by IDF and L2-normalized.
fn weighted_vector(
    tokens: &[String],
    vocabulary: &HashMap<String, usize>,
    idf: &[f64],
) -> Vec<(usize, f64)> {
    let mut counts: HashMap<usize, f64> = HashMap::new();
    for token in tokens {
        // Terms absent from the corpus vocabulary contribute zero weight.
        if let Some(&index) = vocabulary.get(token) {
            *counts.entry(index).or_default() += 1.0;
        }
    }

    let mut vector: Vec<(usize, f64)> = counts
        .into_iter()
        .map(|(index, count)| (index, count * idf[index]))
        .collect();
    vector.sort_by_key(|&(index, _)| index);

    let norm: f64 = vector.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for entry in &mut vector {
            entry.1 /= norm;
        }
    }

    vector
}

/// Dot product of two sparse vectors sorted by term index.
fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let mut sum = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(video: &str, start: f64, text: &str) -> Chunk {
        Chunk {
            video_id: VideoId::parse(video).unwrap(),
            start_seconds: start,
            end_seconds: start + 5.0,
            text: text.to_string(),
            speaker: None,
        }
    }

    const VID_A: &str = "aaaaaaaaaaa";
    const VID_B: &str = "bbbbbbbbbbb";

    #[test]
    fn test_tokenize_drops_stop_words_and_short_tokens() {
        let tokens = tokenize("The cat, a dog and I saw it!");
        assert_eq!(tokens, vec!["cat", "dog", "saw"]);
    }

    #[test]
    fn test_exact_chunk_text_scores_one_and_ranks_first() {
        let index = TfIdfIndex::build(vec![
            chunk(VID_A, 0.0, "intro and welcome"),
            chunk(VID_A, 5.0, "machine learning basics"),
            chunk(VID_A, 10.0, "thanks for watching"),
        ]);

        let results = index
            .query("machine learning basics", &QueryOptions::default())
            .unwrap();

        assert_eq!(results[0].start_seconds, 5.0);
        assert!((results[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_filters_unless_backfilled() {
        let index = TfIdfIndex::build(vec![
            chunk(VID_A, 0.0, "rust ownership and borrowing"),
            chunk(VID_A, 5.0, "cooking pasta tonight"),
            chunk(VID_B, 0.0, "gardening tips for spring"),
        ]);

        let opts = QueryOptions {
            top_k: 10,
            similarity_threshold: 0.5,
            min_results_per_video: 1,
        };
        let results = index.query("rust ownership", &opts).unwrap();

        // One real match plus one back-filled hit for the other video.
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= 0.5);
        assert_eq!(results[0].video_id.as_str(), VID_A);
        assert_eq!(results[1].video_id.as_str(), VID_B);
        for r in &results {
            assert!(r.score >= 0.5 || r.video_id.as_str() == VID_B);
        }
    }

    #[test]
    fn test_min_results_with_fewer_chunks_than_minimum() {
        let index = TfIdfIndex::build(vec![
            chunk(VID_A, 0.0, "first topic"),
            chunk(VID_A, 5.0, "second topic"),
            chunk(VID_A, 10.0, "third topic"),
            chunk(VID_B, 0.0, "only chunk here"),
        ]);

        let opts = QueryOptions {
            top_k: 10,
            similarity_threshold: 0.9,
            min_results_per_video: 2,
        };
        let results = index.query("first topic", &opts).unwrap();

        // Video B has a single chunk total; it contributes exactly that one.
        let b_hits = results
            .iter()
            .filter(|r| r.video_id.as_str() == VID_B)
            .count();
        assert_eq!(b_hits, 1);

        let a_hits = results
            .iter()
            .filter(|r| r.video_id.as_str() == VID_A)
            .count();
        assert_eq!(a_hits, 2);
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let index = TfIdfIndex::build(vec![
            chunk(VID_A, 0.0, "alpha beta"),
            chunk(VID_A, 5.0, "alpha beta"),
            chunk(VID_B, 0.0, "alpha beta"),
        ]);

        let opts = QueryOptions {
            top_k: 3,
            similarity_threshold: 0.0,
            min_results_per_video: 0,
        };
        let results = index.query("alpha beta", &opts).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].video_id.as_str(), VID_A);
        assert_eq!(results[0].start_seconds, 0.0);
        assert_eq!(results[1].start_seconds, 5.0);
        assert_eq!(results[2].video_id.as_str(), VID_B);
    }

    #[test]
    fn test_empty_query_is_an_error() {
        let index = TfIdfIndex::build(vec![chunk(VID_A, 0.0, "content")]);
        assert!(matches!(
            index.query("   ", &QueryOptions::default()),
            Err(FinnError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_empty_corpus_returns_no_results() {
        let index = TfIdfIndex::build(Vec::new());
        let results = index.query("anything", &QueryOptions::default()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let index = TfIdfIndex::build(vec![chunk(VID_A, 0.0, "content")]);

        let bad_threshold = QueryOptions {
            similarity_threshold: 1.5,
            ..QueryOptions::default()
        };
        assert!(matches!(
            index.query("content", &bad_threshold),
            Err(FinnError::Config(_))
        ));

        let bad_top_k = QueryOptions {
            top_k: 0,
            ..QueryOptions::default()
        };
        assert!(matches!(
            index.query("content", &bad_top_k),
            Err(FinnError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_query_terms_contribute_nothing() {
        let index = TfIdfIndex::build(vec![chunk(VID_A, 0.0, "machine learning")]);

        let opts = QueryOptions {
            top_k: 5,
            similarity_threshold: 0.0,
            min_results_per_video: 0,
        };
        let results = index.query("quantum chromodynamics", &opts).unwrap();
        assert!(results.is_empty() || results[0].score == 0.0);
    }
}
