//! Departure monitor: cache-and-fetch per stop, merged across stops.
//!
//! For each stop the monitor serves the cached board while it is younger
//! than `max_age`, and otherwise fetches a new one. Transient upstream
//! failures fall back to the cached board regardless of its age; only a stop
//! with no cached board at all fails, and that failure aborts the whole
//! aggregation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::cache::StopCache;
use crate::domain::{Departure, Stop};
use crate::dvb::{FetchError, Upstream, parse_departures};
use crate::error::DepartureError;

/// How long a cached board is served without refetching.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30);

/// Configuration for the monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Maximum age of a cached board that is served without a fetch.
    pub max_age: Duration,
}

impl MonitorConfig {
    /// Set the freshness window.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

/// How a stop's board was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    /// Cached board within the freshness window; no fetch was made.
    Fresh,
    /// Fetched, parsed and filtered just now.
    Fetched,
    /// Upstream said the cached board is unchanged.
    NotModified,
    /// Upstream failed; the cached board is served as-is.
    Stale,
}

/// One stop's board together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopDepartures {
    pub departures: Arc<Vec<Departure>>,
    pub served: Served,
    /// When the served board was fetched.
    pub fetched_at: DateTime<Utc>,
}

/// Fetches, caches and merges departures for a fixed list of stops.
pub struct DepartureMonitor<U> {
    upstream: U,
    stops: Vec<Stop>,
    cache: StopCache,
    config: MonitorConfig,
}

impl<U: Upstream> DepartureMonitor<U> {
    /// Create a monitor for `stops`, with an empty cache.
    pub fn new(upstream: U, stops: Vec<Stop>, config: MonitorConfig) -> Self {
        Self {
            upstream,
            stops,
            cache: StopCache::new(),
            config,
        }
    }

    /// The configured stops, in order.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Look up a configured stop by name.
    pub fn stop(&self, name: &str) -> Option<&Stop> {
        self.stops.iter().find(|s| s.name() == name)
    }

    /// The per-stop cache.
    pub fn cache(&self) -> &StopCache {
        &self.cache
    }

    /// The upstream departures are fetched from.
    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    fn unavailable(&self) -> DepartureError {
        DepartureError::ServiceUnavailable(self.upstream.source_name().to_string())
    }

    /// Get the best available board for one stop at `now`.
    ///
    /// Returns the cached board without network access while it is fresh.
    /// Otherwise fetches; a successful fetch replaces the cache record. A
    /// not-modified answer or a failed fetch serves the cached board, or
    /// fails with [`DepartureError::ServiceUnavailable`] if there is none.
    pub async fn stop_departures(
        &self,
        stop: &Stop,
        now: DateTime<Utc>,
    ) -> Result<StopDepartures, DepartureError> {
        let name = stop.name();
        let cached = self.cache.get(name).await;

        if let Some(record) = &cached
            && record.is_fresh(now, self.config.max_age)
        {
            debug!(stop = name, age = ?record.age(now), "serving fresh cached departures");
            return Ok(StopDepartures {
                departures: record.departures.clone(),
                served: Served::Fresh,
                fetched_at: record.fetched_at,
            });
        }

        let modified_since = cached.as_ref().map(|r| r.fetched_at);

        match self.upstream.fetch(name, modified_since).await {
            Ok(response) => {
                let departures = stop.filter().filter(parse_departures(&response.body)?);
                debug!(stop = name, count = departures.len(), "fetched departures");

                let record = self.cache.put(name, departures, response.fetched_at).await;
                Ok(StopDepartures {
                    departures: record.departures.clone(),
                    served: Served::Fetched,
                    fetched_at: record.fetched_at,
                })
            }
            Err(FetchError::NotModified) => match cached {
                Some(record) => {
                    debug!(stop = name, "departures not modified");
                    Ok(StopDepartures {
                        departures: record.departures.clone(),
                        served: Served::NotModified,
                        fetched_at: record.fetched_at,
                    })
                }
                None => {
                    warn!(stop = name, "not modified, but nothing cached");
                    Err(self.unavailable())
                }
            },
            Err(err) => match cached {
                Some(record) => {
                    warn!(
                        stop = name,
                        error = %err,
                        age = ?record.age(now),
                        "temporarily not available, serving stale departures"
                    );
                    Ok(StopDepartures {
                        departures: record.departures.clone(),
                        served: Served::Stale,
                        fetched_at: record.fetched_at,
                    })
                }
                None => {
                    warn!(stop = name, error = %err, "temporarily not available");
                    Err(self.unavailable())
                }
            },
        }
    }

    /// Merged departures for all stops at `now`, soonest first.
    ///
    /// Distinct stops are fetched concurrently. A stop name listed more than
    /// once is fetched only by its first entry; later entries run after that
    /// and see its cache record, exactly as if the stops had been visited one
    /// by one. Boards are concatenated in stop order and then stably sorted
    /// by minutes, so ties keep that order. The first stop without any usable
    /// board aborts the whole call.
    pub async fn departures_at(&self, now: DateTime<Utc>) -> Result<Vec<Departure>, DepartureError> {
        let mut seen = HashSet::new();
        let (leading, repeated): (Vec<usize>, Vec<usize>) =
            (0..self.stops.len()).partition(|&i| seen.insert(self.stops[i].name()));

        let mut boards: Vec<Option<StopDepartures>> = vec![None; self.stops.len()];

        let fetched = try_join_all(
            leading
                .iter()
                .map(|&i| self.stop_departures(&self.stops[i], now)),
        )
        .await?;
        for (i, board) in leading.into_iter().zip(fetched) {
            boards[i] = Some(board);
        }

        for i in repeated {
            boards[i] = Some(self.stop_departures(&self.stops[i], now).await?);
        }

        let mut merged: Vec<Departure> = boards
            .iter()
            .flatten()
            .flat_map(|board| board.departures.iter().cloned())
            .collect();
        merged.sort_by_key(|d| d.minutes);

        Ok(merged)
    }

    /// Merged departures for all stops, soonest first.
    pub async fn departures(&self) -> Result<Vec<Departure>, DepartureError> {
        self.departures_at(Utc::now()).await
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
