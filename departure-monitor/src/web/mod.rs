//! Web layer for the departure monitor.
//!
//! Provides HTTP endpoints serving the merged departure list and per-stop
//! boards as JSON.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
