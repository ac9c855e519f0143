//! Departure records.

use std::fmt;

/// A single upcoming departure at a stop.
///
/// Values are immutable once parsed from an upstream response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Departure {
    /// Route identifier as shown on the vehicle (e.g. "76", "E3").
    pub route: String,

    /// Destination display name.
    pub destination: String,

    /// Minutes until departure. Zero means "departing now".
    pub minutes: u32,
}

impl Departure {
    /// Create a new departure record.
    pub fn new(route: impl Into<String>, destination: impl Into<String>, minutes: u32) -> Self {
        Self {
            route: route.into(),
            destination: destination.into(),
            minutes,
        }
    }
}

impl fmt::Display for Departure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} in {} min", self.route, self.destination, self.minutes)
    }
}
