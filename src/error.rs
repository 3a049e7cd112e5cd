//! Error types for Finn.

use thiserror::Error;

/// Library-level error type for Finn operations.
#[derive(Error, Debug)]
pub enum FinnError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid video reference: {0}")]
    InvalidVideoReference(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("No transcript available for {video_id}: {cause}")]
    TranscriptUnavailable { video_id: String, cause: String },

    #[error("No transcripts available for any of the requested videos")]
    NoTranscriptsAvailable,

    #[error("Caption fetch failed: {0}")]
    CaptionFetch(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Cache store error: {0}")]
    CacheStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),
}

/// Result type alias for Finn operations.
pub type Result<T> = std::result::Result<T, FinnError>;
