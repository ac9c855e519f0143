//! Application state for the web layer.

use std::sync::Arc;

use crate::monitor::DepartureMonitor;

/// Shared application state.
pub struct AppState<U> {
    /// Departure monitor with its per-stop cache
    pub monitor: Arc<DepartureMonitor<U>>,
}

impl<U> AppState<U> {
    /// Create a new app state.
    pub fn new(monitor: DepartureMonitor<U>) -> Self {
        Self {
            monitor: Arc::new(monitor),
        }
    }

    /// Create an app state around an already shared monitor.
    pub fn from_shared(monitor: Arc<DepartureMonitor<U>>) -> Self {
        Self { monitor }
    }
}

// Manual impl: cloning the state must not require `U: Clone`.
impl<U> Clone for AppState<U> {
    fn clone(&self) -> Self {
        Self {
            monitor: Arc::clone(&self.monitor),
        }
    }
}
