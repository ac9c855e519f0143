//! Per-stop cache of filtered departure boards.
//!
//! Each stop has at most one record: the filtered result of its latest
//! successful fetch plus the time it was fetched. Records are replaced
//! wholesale, never merged, and never expire on their own. Whether a record
//! is fresh enough to serve without a fetch is decided by the caller from
//! `fetched_at`, so a stale record stays available as a fallback for as long
//! as the upstream is down.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache as MokaCache;

use crate::domain::Departure;

/// The latest filtered board for one stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    /// Filtered departures, in upstream order.
    pub departures: Arc<Vec<Departure>>,

    /// When the board was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl CacheRecord {
    /// How old the record is at `now`. Zero if `fetched_at` lies in the future.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the record may be served without refetching.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) <= max_age
    }
}

/// Cache of departure boards keyed by stop name.
///
/// Safe to share between concurrent aggregations; concurrent writes for the
/// same stop resolve to whichever lands last.
#[derive(Clone)]
pub struct StopCache {
    records: MokaCache<String, Arc<CacheRecord>>,
}

impl StopCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            records: MokaCache::builder().build(),
        }
    }

    /// Get the record for `stop`, if one was ever stored.
    pub async fn get(&self, stop: &str) -> Option<Arc<CacheRecord>> {
        self.records.get(stop).await
    }

    /// Store `departures` as the record for `stop`, replacing any previous one.
    pub async fn put(
        &self,
        stop: &str,
        departures: Vec<Departure>,
        fetched_at: DateTime<Utc>,
    ) -> Arc<CacheRecord> {
        let record = Arc::new(CacheRecord {
            departures: Arc::new(departures),
            fetched_at,
        });
        self.records.insert(stop.to_string(), record.clone()).await;
        record
    }

    /// Approximate number of cached stops (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.records.entry_count()
    }
}

impl Default for StopCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn missing_stop_is_absent() {
        let cache = StopCache::new();
        assert!(cache.get("Postplatz").await.is_none());
    }

    #[tokio::test]
    async fn put_then_get() {
        let cache = StopCache::new();
        let deps = vec![Departure::new("1", "Prohlis", 3)];

        cache.put("Postplatz", deps.clone(), at(0)).await;

        let record = cache.get("Postplatz").await.unwrap();
        assert_eq!(*record.departures, deps);
        assert_eq!(record.fetched_at, at(0));
    }

    #[tokio::test]
    async fn put_overwrites_wholesale() {
        let cache = StopCache::new();
        cache
            .put(
                "Postplatz",
                vec![Departure::new("1", "Prohlis", 3), Departure::new("2", "Gorbitz", 4)],
                at(0),
            )
            .await;
        cache
            .put("Postplatz", vec![Departure::new("4", "Laubegast", 7)], at(40))
            .await;

        let record = cache.get("Postplatz").await.unwrap();
        assert_eq!(*record.departures, vec![Departure::new("4", "Laubegast", 7)]);
        assert_eq!(record.fetched_at, at(40));
    }

    #[tokio::test]
    async fn stops_are_independent() {
        let cache = StopCache::new();
        cache.put("Postplatz", vec![Departure::new("1", "Prohlis", 3)], at(0)).await;
        cache.put("Albertplatz", Vec::new(), at(10)).await;

        assert_eq!(cache.get("Postplatz").await.unwrap().departures.len(), 1);
        assert!(cache.get("Albertplatz").await.unwrap().departures.is_empty());
    }

    #[tokio::test]
    async fn entry_count_counts_stops_once() {
        let cache = StopCache::new();
        assert_eq!(cache.entry_count(), 0);

        cache.put("Postplatz", Vec::new(), at(0)).await;
        cache.put("Postplatz", Vec::new(), at(40)).await;
        cache.put("Albertplatz", Vec::new(), at(0)).await;
        cache.records.run_pending_tasks().await;

        assert_eq!(cache.entry_count(), 2);
    }

    #[test]
    fn freshness_boundary() {
        let record = CacheRecord {
            departures: Arc::new(Vec::new()),
            fetched_at: at(0),
        };
        let max_age = Duration::from_secs(30);

        assert!(record.is_fresh(at(0), max_age));
        assert!(record.is_fresh(at(30), max_age));
        assert!(!record.is_fresh(at(31), max_age));
        assert_eq!(record.age(at(12)), Duration::from_secs(12));
    }

    #[test]
    fn future_timestamp_counts_as_fresh() {
        let record = CacheRecord {
            departures: Arc::new(Vec::new()),
            fetched_at: at(100),
        };
        assert_eq!(record.age(at(0)), Duration::ZERO);
        assert!(record.is_fresh(at(0), Duration::from_secs(30)));
    }
}
