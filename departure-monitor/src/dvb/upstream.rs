//! The seam between the monitor and the departure widget.

use std::future::Future;

use chrono::{DateTime, Utc};

use super::error::FetchError;

/// A successfully fetched response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Undecoded widget body.
    pub body: String,

    /// When the response was received.
    pub fetched_at: DateTime<Utc>,
}

impl RawResponse {
    /// Create a response received at `fetched_at`.
    pub fn new(body: impl Into<String>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            body: body.into(),
            fetched_at,
        }
    }
}

/// Source of raw departure boards, one request per stop.
///
/// This abstraction allows the monitor to be tested with scripted responses.
pub trait Upstream: Send + Sync {
    /// Human-readable name of the data provider, used in error messages.
    fn source_name(&self) -> &str;

    /// Fetch the raw departure board for `stop`.
    ///
    /// `modified_since` is the timestamp of the board the caller already
    /// holds, if any. Implementations may use it for a conditional request,
    /// in which case they report [`FetchError::NotModified`] when the board
    /// has not changed.
    fn fetch(
        &self,
        stop: &str,
        modified_since: Option<DateTime<Utc>>,
    ) -> impl Future<Output = Result<RawResponse, FetchError>> + Send;
}
