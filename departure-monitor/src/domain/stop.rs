//! Configured stops.

use std::fmt;
use std::sync::Arc;

use crate::filter::{AcceptAll, DepartureFilter};

/// A stop to monitor together with the filter applied to its departures.
///
/// The name is used verbatim both for the upstream lookup and as the cache
/// key, so two entries with the same name share one cache record.
#[derive(Clone)]
pub struct Stop {
    name: String,
    filter: Arc<dyn DepartureFilter>,
}

impl Stop {
    /// Create a stop that keeps departures accepted by `filter`.
    pub fn new(name: impl Into<String>, filter: impl DepartureFilter + 'static) -> Self {
        Self {
            name: name.into(),
            filter: Arc::new(filter),
        }
    }

    /// Create a stop that keeps every departure.
    pub fn unfiltered(name: impl Into<String>) -> Self {
        Self::new(name, AcceptAll)
    }

    /// The stop name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The filter applied to this stop's departures.
    pub fn filter(&self) -> &dyn DepartureFilter {
        self.filter.as_ref()
    }
}

impl fmt::Debug for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stop").field("name", &self.name).finish_non_exhaustive()
    }
}
