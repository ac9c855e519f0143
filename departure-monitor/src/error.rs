//! Errors surfaced to callers of the departure monitor.

/// Errors from fetching departures for the configured stops.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DepartureError {
    /// The upstream body is not a well-formed departure list.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A stop has neither fresh nor stale data to serve.
    ///
    /// Carries the name of the upstream source.
    #[error("service not available: {0}")]
    ServiceUnavailable(String),
}

impl From<crate::dvb::ParseError> for DepartureError {
    fn from(err: crate::dvb::ParseError) -> Self {
        DepartureError::MalformedResponse(err.to_string())
    }
}
