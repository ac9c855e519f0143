//! Departure monitor server.
//!
//! Fetches near-real-time departures for a configured set of stops from the
//! DVB widget, caches each stop's board for a short time, serves stale
//! boards while the upstream is unreachable, and merges everything into one
//! list ordered by minutes until departure.

pub mod cache;
pub mod config;
pub mod domain;
pub mod dvb;
pub mod error;
pub mod filter;
pub mod monitor;
pub mod web;
