//! Upstream fetch outcomes other than success.

/// Why a fetch from the departure widget did not produce a body.
///
/// The monitor only cares about this classification, not about transport
/// details: [`NotModified`](FetchError::NotModified) reuses the cached board,
/// everything else falls back to cached data if there is any.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The server answered 304 to a conditional request.
    #[error("not modified")]
    NotModified,

    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connection, URL, protocol or body-decoding failure.
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout;
        }
        match err.status() {
            Some(status) if status == reqwest::StatusCode::NOT_MODIFIED => FetchError::NotModified,
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Network(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(FetchError::Timeout.to_string(), "request timed out");
        assert_eq!(FetchError::NotModified.to_string(), "not modified");
        assert_eq!(FetchError::Status(503).to_string(), "HTTP status 503");
        assert_eq!(
            FetchError::Network("connection refused".into()).to_string(),
            "network error: connection refused"
        );
    }
}
