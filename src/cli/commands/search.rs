//! Search command implementation.

use crate::cli::{preflight, Output};
use crate::config::{ModelSize, Settings};
use crate::orchestrator::Retriever;
use crate::transcript::{format_timestamp, CaptionStrategy};
use crate::video::VideoId;
use anyhow::Result;

/// Run the search command.
#[allow(clippy::too_many_arguments)]
pub async fn run_search(
    video: &str,
    query: &str,
    top_k: usize,
    chunk_size: usize,
    language: Option<String>,
    model: Option<String>,
    list_transcripts: bool,
    mut settings: Settings,
) -> Result<()> {
    if list_transcripts {
        return list_caption_tracks(video).await;
    }

    // Per-invocation overrides
    settings.search.chunk_size = chunk_size;
    if language.is_some() {
        settings.transcription.language = language;
    }
    if let Some(model) = model {
        settings.transcription.model = model
            .parse::<ModelSize>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }

    preflight::check(preflight::Operation::Search)?;

    let retriever = Retriever::new(settings)?;

    let spinner = Output::spinner("Searching...");
    let results = retriever.search_video(video, query, top_k).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results for '{}'", results.len(), query));

                for (rank, result) in results.iter().enumerate() {
                    Output::search_result(
                        rank + 1,
                        &format_timestamp(result.start_seconds),
                        result.score,
                        result.speaker.as_deref(),
                        &result.text,
                        &result.url,
                    );
                }
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            Err(anyhow::anyhow!("{}", e))
        }
    }
}

/// List the caption tracks available for a video.
async fn list_caption_tracks(video: &str) -> Result<()> {
    let video_id = VideoId::parse(video)?;
    let strategy = CaptionStrategy::new(reqwest::Client::new());

    let spinner = Output::spinner("Fetching caption tracks...");
    let tracks = strategy.list_tracks(&video_id).await;
    spinner.finish_and_clear();

    let tracks = tracks?;
    if tracks.is_empty() {
        Output::warning(&format!(
            "No caption tracks for {}; search would fall back to Whisper.",
            video_id
        ));
        return Ok(());
    }

    Output::header(&format!("Caption tracks for {}", video_id));
    for track in tracks {
        let kind = if track.automatic { "auto" } else { "manual" };
        Output::list_item(&format!("{} ({})", track.language, kind));
    }

    Ok(())
}
