//! Finn - Timestamped Video Search
//!
//! A local-first tool for searching inside videos and jumping straight to
//! the moment a topic comes up.
//!
//! The name "Finn" comes from the Norwegian word for "find."
//!
//! # Overview
//!
//! Finn allows you to:
//! - Obtain transcripts from YouTube captions, falling back to Whisper
//!   speech-to-text when captions are unavailable
//! - Search transcripts semantically with TF-IDF and cosine similarity
//! - Get timestamped deep links straight to the matching moment
//! - Cache every artifact on disk so repeated searches do no external work
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `video` - Video identifier parsing and deep links
//! - `cache` - Per-video artifact store (audio, transcripts, chunks, searches)
//! - `audio` - Audio download via yt-dlp/ffmpeg
//! - `transcript` - Caption fetching, Whisper fallback, and formats
//! - `chunking` - Segment grouping into searchable chunks
//! - `search` - TF-IDF index and cosine similarity scoring
//! - `orchestrator` - Pipeline coordination
//! - `session` - Web-layer search history
//!
//! # Example
//!
//! ```rust,no_run
//! use finn::config::Settings;
//! use finn::orchestrator::Retriever;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let retriever = Retriever::new(settings)?;
//!
//!     let results = retriever
//!         .search_video("dQw4w9WgXcQ", "never gonna give", 5)
//!         .await?;
//!     for result in results {
//!         println!("{:.3} {} {}", result.score, result.url, result.text);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cache;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod search;
pub mod session;
pub mod transcript;
pub mod video;

pub use error::{FinnError, Result};
