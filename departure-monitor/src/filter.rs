//! Departure filters.
//!
//! A filter decides, record by record, which departures of a stop are kept.
//! Filtering never reorders: the output is a subsequence of the input.

use crate::domain::Departure;

/// Decides whether a departure is kept.
///
/// Implementors only provide [`keep`](DepartureFilter::keep); the provided
/// [`filter`](DepartureFilter::filter) applies it to a whole board.
pub trait DepartureFilter: Send + Sync {
    /// Returns true if `departure` should be kept.
    fn keep(&self, departure: &Departure) -> bool;

    /// Keep the departures accepted by this filter, preserving order.
    fn filter(&self, departures: Vec<Departure>) -> Vec<Departure> {
        departures.into_iter().filter(|d| self.keep(d)).collect()
    }
}

/// Keeps every departure.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl DepartureFilter for AcceptAll {
    fn keep(&self, _departure: &Departure) -> bool {
        true
    }
}

/// Keeps departures whose route identifier satisfies a predicate.
pub struct RouteFilter<F> {
    predicate: F,
}

impl<F> RouteFilter<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    /// Create a filter from a predicate over the route identifier.
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl RouteFilter<Box<dyn Fn(&str) -> bool + Send + Sync>> {
    /// Keep only the listed routes.
    pub fn routes<I, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let routes: Vec<String> = routes.into_iter().map(Into::into).collect();
        Self {
            predicate: Box::new(move |route| routes.iter().any(|r| r == route)),
        }
    }
}

impl<F> DepartureFilter for RouteFilter<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn keep(&self, departure: &Departure) -> bool {
        (self.predicate)(&departure.route)
    }
}

/// Keeps departures whose destination satisfies a predicate.
pub struct DestinationFilter<F> {
    predicate: F,
}

impl<F> DestinationFilter<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    /// Create a filter from a predicate over the destination name.
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl DestinationFilter<Box<dyn Fn(&str) -> bool + Send + Sync>> {
    /// Keep only departures heading to one of the listed destinations.
    pub fn destinations<I, S>(destinations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let destinations: Vec<String> = destinations.into_iter().map(Into::into).collect();
        Self {
            predicate: Box::new(move |dest| destinations.iter().any(|d| d == dest)),
        }
    }
}

impl<F> DepartureFilter for DestinationFilter<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn keep(&self, departure: &Departure) -> bool {
        (self.predicate)(&departure.destination)
    }
}

/// Keeps departures accepted by every inner filter.
///
/// An empty `AllOf` keeps everything.
#[derive(Default)]
pub struct AllOf {
    filters: Vec<Box<dyn DepartureFilter>>,
}

impl AllOf {
    /// Create an empty conjunction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add another filter that must also accept.
    pub fn and(mut self, filter: impl DepartureFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl DepartureFilter for AllOf {
    fn keep(&self, departure: &Departure) -> bool {
        self.filters.iter().all(|f| f.keep(departure))
    }
}
