//! HTTP API server exposing the search pipeline.
//!
//! REST endpoints for multi-video search, per-session history, and a
//! server-sent-events stream of pipeline progress so a UI can show which
//! video is being transcribed while a search runs.

use crate::cache::ArtifactKind;
use crate::cli::Output;
use crate::config::{ModelSize, Settings};
use crate::error::FinnError;
use crate::orchestrator::{ProgressEvent, Retriever, SearchConfig};
use crate::session::{SessionRegistry, SessionSearch};
use crate::video::VideoId;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

/// Shared application state.
struct AppState {
    retriever: Retriever,
    settings: Settings,
    sessions: SessionRegistry,
    /// Per-session progress channels for the SSE endpoint.
    channels: Mutex<HashMap<String, broadcast::Sender<ProgressEvent>>>,
}

impl AppState {
    /// Sender for a session's progress channel, creating it on first use.
    fn channel(&self, session_id: &str) -> broadcast::Sender<ProgressEvent> {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(session_id.to_string())
            .or_insert_with(|| broadcast::channel(64).0)
            .clone()
    }
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let retriever = Retriever::new(settings.clone())?;

    let state = Arc::new(AppState {
        retriever,
        settings,
        sessions: SessionRegistry::new(),
        channels: Mutex::new(HashMap::new()),
    });

    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/config", get(get_config))
        .route("/api/search", post(search))
        .route("/api/session", post(create_session))
        .route("/api/session/{session_id}/history", get(session_history))
        .route("/api/session/{session_id}/events", get(session_events))
        .route("/api/video/{video_id}/info", get(video_info))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Finn API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Config", "GET  /api/config");
    Output::kv("Search", "POST /api/search");
    Output::kv("New Session", "POST /api/session");
    Output::kv("History", "GET  /api/session/:session_id/history");
    Output::kv("Progress (SSE)", "GET  /api/session/:session_id/events");
    Output::kv("Video Info", "GET  /api/video/:video_id/info");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SearchApiRequest {
    /// YouTube URLs or bare video ids.
    video_urls: Vec<String>,
    query: String,
    top_k: Option<usize>,
    chunk_size: Option<usize>,
    similarity_threshold: Option<f64>,
    min_results_per_video: Option<usize>,
    language: Option<String>,
    /// Whisper model size for this request only.
    model: Option<String>,
    /// Session to record the search under and stream progress to.
    session_id: Option<String>,
}

#[derive(Serialize)]
struct SearchApiResponse {
    search_id: Uuid,
    session_id: String,
    query: String,
    video_count: usize,
    successful_count: usize,
    results: Vec<crate::search::SearchResult>,
    failures: Vec<crate::orchestrator::VideoFailure>,
}

#[derive(Serialize)]
struct SessionCreatedResponse {
    session_id: String,
}

#[derive(Serialize)]
struct VideoInfoResponse {
    video_id: String,
    url: String,
    audio_cached: bool,
    transcript_cached: bool,
    chunks_cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    segment_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
}

#[derive(Serialize)]
struct ConfigResponse {
    chunk_size: usize,
    top_k: usize,
    similarity_threshold: f64,
    min_results_per_video: usize,
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, msg: impl Into<String>) -> axum::response::Response {
    (status, Json(ErrorResponse { error: msg.into() })).into_response()
}

/// Map pipeline errors onto HTTP statuses.
fn status_for(error: &FinnError) -> StatusCode {
    match error {
        FinnError::Config(_) | FinnError::InvalidQuery(_) | FinnError::InvalidVideoReference(_) => {
            StatusCode::BAD_REQUEST
        }
        FinnError::NoTranscriptsAvailable | FinnError::TranscriptUnavailable { .. } => {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let s = &state.settings;
    Json(ConfigResponse {
        chunk_size: s.search.chunk_size,
        top_k: s.search.top_k,
        similarity_threshold: s.search.similarity_threshold,
        min_results_per_video: s.search.min_results_per_video,
        model: s.transcription.model.to_string(),
        language: s.transcription.language.clone(),
    })
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(SessionCreatedResponse {
        session_id: state.sessions.create(),
    })
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchApiRequest>,
) -> axum::response::Response {
    let mut config = SearchConfig::from_settings(&state.settings);

    if let Some(top_k) = req.top_k {
        if !(1..=50).contains(&top_k) {
            return error_response(StatusCode::BAD_REQUEST, "top_k must be between 1 and 50");
        }
        config.top_k = top_k;
    }
    if let Some(chunk_size) = req.chunk_size {
        if !(1..=20).contains(&chunk_size) {
            return error_response(
                StatusCode::BAD_REQUEST,
                "chunk_size must be between 1 and 20",
            );
        }
        config.chunk_size = chunk_size;
    }
    if let Some(threshold) = req.similarity_threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return error_response(
                StatusCode::BAD_REQUEST,
                "similarity_threshold must be between 0.0 and 1.0",
            );
        }
        config.similarity_threshold = threshold;
    }
    if let Some(min_results) = req.min_results_per_video {
        if min_results > 10 {
            return error_response(
                StatusCode::BAD_REQUEST,
                "min_results_per_video must be between 0 and 10",
            );
        }
        config.min_results_per_video = min_results;
    }
    if req.language.is_some() {
        config.language = req.language.clone();
    }

    // A per-request model override builds a request-scoped retriever so
    // concurrent requests with different models don't interfere. Whisper
    // runs as a subprocess, so construction is cheap.
    let request_retriever;
    let retriever = match &req.model {
        Some(name) if name.parse::<ModelSize>() != Ok(state.settings.transcription.model) => {
            let model = match name.parse::<ModelSize>() {
                Ok(m) => m,
                Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
            };
            let mut settings = state.settings.clone();
            settings.transcription.model = model;
            match Retriever::new(settings) {
                Ok(r) => {
                    request_retriever = r;
                    &request_retriever
                }
                Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            }
        }
        _ => &state.retriever,
    };

    let session_id = req
        .session_id
        .clone()
        .unwrap_or_else(|| state.sessions.create());
    let events = state.channel(&session_id);

    let outcome = retriever
        .search_with_progress(&req.video_urls, &req.query, &config, |event| {
            // Nobody listening is fine.
            let _ = events.send(event);
        })
        .await;

    match outcome {
        Ok(outcome) => {
            let search = SessionSearch {
                id: Uuid::new_v4(),
                query: req.query.clone(),
                video_count: req.video_urls.len(),
                successful_count: req.video_urls.len() - outcome.failures.len(),
                timestamp: chrono::Utc::now(),
                results: outcome.results.clone(),
                failures: outcome.failures.clone(),
            };
            state.sessions.record(&session_id, search.clone());

            Json(SearchApiResponse {
                search_id: search.id,
                session_id,
                query: search.query,
                video_count: search.video_count,
                successful_count: search.successful_count,
                results: outcome.results,
                failures: outcome.failures,
            })
            .into_response()
        }
        Err(e) => {
            warn!("Search request failed: {}", e);
            error_response(status_for(&e), e.to_string())
        }
    }
}

async fn session_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> axum::response::Response {
    match state.sessions.history(&session_id) {
        Some(session) => Json(session).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Session not found: {}", session_id),
        ),
    }
}

async fn session_events(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.channel(&session_id).subscribe();

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match Event::default().json_data(&event) {
                    Ok(sse) => return Some((Ok(sse), rx)),
                    Err(e) => {
                        warn!("Failed to serialize progress event: {}", e);
                        continue;
                    }
                },
                // A slow client missed events; keep streaming the rest.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn video_info(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> axum::response::Response {
    let video_id = match VideoId::parse(&video_id) {
        Ok(id) => id,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let store = state.retriever.store();
    let language = state.settings.transcription.language.as_deref();

    let transcript = match store.load_transcript(&video_id, language) {
        Ok(t) => t,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    Json(VideoInfoResponse {
        url: video_id.watch_url(),
        audio_cached: store.has(&video_id, &ArtifactKind::Audio),
        transcript_cached: transcript.is_some(),
        chunks_cached: store.has(&video_id, &ArtifactKind::Chunks),
        segment_count: transcript.as_ref().map(|t| t.segments.len()),
        duration_seconds: transcript.as_ref().map(|t| t.duration_seconds()),
        language: transcript.and_then(|t| t.language),
        video_id: video_id.to_string(),
    })
    .into_response()
}
