//! Data transfer objects for web responses.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::Departure;
use crate::monitor::{Served, StopDepartures};

/// A departure in API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartureResult {
    /// Route identifier (e.g., "76")
    pub route: String,

    /// Destination name
    pub destination: String,

    /// Minutes until departure
    pub minutes: u32,
}

impl From<&Departure> for DepartureResult {
    fn from(dep: &Departure) -> Self {
        Self {
            route: dep.route.clone(),
            destination: dep.destination.clone(),
            minutes: dep.minutes,
        }
    }
}

/// Merged departures for all configured stops.
#[derive(Debug, Serialize)]
pub struct DeparturesResponse {
    pub departures: Vec<DepartureResult>,
}

/// Departures for a single stop.
#[derive(Debug, Serialize)]
pub struct StopDeparturesResponse {
    /// Stop name
    pub stop: String,

    /// How the board was obtained: "fresh", "fetched", "not_modified" or "stale"
    pub served: &'static str,

    /// When the board was fetched from upstream
    pub fetched_at: DateTime<Utc>,

    pub departures: Vec<DepartureResult>,
}

impl StopDeparturesResponse {
    /// Build the response for `stop` from the monitor's result.
    pub fn new(stop: &str, result: &StopDepartures) -> Self {
        Self {
            stop: stop.to_string(),
            served: served_label(result.served),
            fetched_at: result.fetched_at,
            departures: result.departures.iter().map(DepartureResult::from).collect(),
        }
    }
}

/// Configured stops.
#[derive(Debug, Serialize)]
pub struct StopsResponse {
    pub stops: Vec<String>,
}

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn served_label(served: Served) -> &'static str {
    match served {
        Served::Fresh => "fresh",
        Served::Fetched => "fetched",
        Served::NotModified => "not_modified",
        Served::Stale => "stale",
    }
}
