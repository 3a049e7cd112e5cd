//! Search session bookkeeping for the web layer.
//!
//! A session groups the searches a client has run so the UI can show
//! history. The session identifier is an opaque correlation token; the core
//! pipeline knows nothing about it.

use crate::orchestrator::VideoFailure;
use crate::search::SearchResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// One recorded search within a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSearch {
    /// Unique id for this search.
    pub id: Uuid,
    /// The query text.
    pub query: String,
    /// How many videos were requested.
    pub video_count: usize,
    /// How many videos contributed results.
    pub successful_count: usize,
    /// When the search ran.
    pub timestamp: DateTime<Utc>,
    /// Ordered results.
    pub results: Vec<SearchResult>,
    /// Videos that were skipped, with reasons.
    pub failures: Vec<VideoFailure>,
}

/// A client's accumulated search history.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub searches: Vec<SessionSearch>,
    /// Distinct video ids touched by this session, in first-seen order.
    pub videos: Vec<String>,
}

impl SearchSession {
    fn new(id: String) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            searches: Vec::new(),
            videos: Vec::new(),
        }
    }
}

/// In-memory registry of active sessions.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SearchSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh session and return its id.
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions
            .lock()
            .unwrap()
            .insert(id.clone(), SearchSession::new(id.clone()));
        id
    }

    /// Record a search under a session, creating the session if needed.
    pub fn record(&self, session_id: &str, search: SessionSearch) {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SearchSession::new(session_id.to_string()));

        for result in &search.results {
            let video_id = result.video_id.to_string();
            if !session.videos.contains(&video_id) {
                session.videos.push(video_id);
            }
        }
        session.searches.push(search);
    }

    /// Snapshot of a session's history.
    pub fn history(&self, session_id: &str) -> Option<SearchSession> {
        self.sessions.lock().unwrap().get(session_id).cloned()
    }
}
