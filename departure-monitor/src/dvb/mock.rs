//! Scripted upstream for testing without network access.
//!
//! Responses are queued per stop and handed out in order, as if they were
//! successive live widget answers.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::error::FetchError;
use super::upstream::{RawResponse, Upstream};

/// A fetch the mock has seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    pub stop: String,
    pub modified_since: Option<DateTime<Utc>>,
}

/// Upstream that replays queued outcomes per stop.
///
/// A stop with nothing queued answers with a network error.
pub struct ScriptedUpstream {
    source_name: String,
    latency: Duration,
    scripts: Mutex<HashMap<String, VecDeque<Result<RawResponse, FetchError>>>>,
    fetches: Mutex<Vec<RecordedFetch>>,
}

impl ScriptedUpstream {
    /// Create an empty script for the named source.
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            latency: Duration::ZERO,
            scripts: Mutex::new(HashMap::new()),
            fetches: Mutex::new(Vec::new()),
        }
    }

    /// Delay every answer by `latency`, so that overlapping fetches really
    /// are in flight at the same time.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue a successful response for `stop`.
    pub fn respond(&self, stop: &str, body: impl Into<String>, fetched_at: DateTime<Utc>) {
        self.push(stop, Ok(RawResponse::new(body, fetched_at)));
    }

    /// Queue a failed fetch for `stop`.
    pub fn fail(&self, stop: &str, err: FetchError) {
        self.push(stop, Err(err));
    }

    fn push(&self, stop: &str, outcome: Result<RawResponse, FetchError>) {
        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        scripts.entry(stop.to_string()).or_default().push_back(outcome);
    }

    /// Every fetch made so far, in order.
    pub fn fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of fetches made so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Upstream for ScriptedUpstream {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    async fn fetch(
        &self,
        stop: &str,
        modified_since: Option<DateTime<Utc>>,
    ) -> Result<RawResponse, FetchError> {
        self.fetches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedFetch {
                stop: stop.to_string(),
                modified_since,
            });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        scripts
            .get_mut(stop)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(FetchError::Network(format!("no scripted response for {stop}"))))
    }
}
