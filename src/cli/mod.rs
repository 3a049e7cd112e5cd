//! CLI module for Finn.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Finn - Timestamped Video Search
///
/// Search inside videos and jump straight to the moment a topic comes up.
/// The name "Finn" comes from the Norwegian word for "find."
#[derive(Parser, Debug)]
#[command(name = "finn")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search a video and print timestamped links to the matching moments
    Search {
        /// YouTube URL or video ID
        video: String,

        /// Search query
        query: String,

        /// Number of results to return
        #[arg(short, long, default_value = "5")]
        top_k: usize,

        /// Transcript segments per chunk
        #[arg(long, default_value = "6")]
        chunk_size: usize,

        /// Preferred caption/transcription language (e.g. "en")
        #[arg(short, long)]
        language: Option<String>,

        /// Whisper model size used when captions are unavailable
        #[arg(short, long)]
        model: Option<String>,

        /// List available caption tracks and exit
        #[arg(long)]
        list_transcripts: bool,
    },

    /// Check that required external tools are installed
    Doctor,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
