//! DVB (Dresdner Verkehrsbetriebe) departure widget.
//!
//! This module provides the HTTP client for the widget, the parser for its
//! plaintext answer, and the [`Upstream`] seam the monitor fetches through.
//!
//! Key characteristics of the widget:
//! - One request per stop, addressed by stop name and city
//! - The answer is a literal list of `(route, destination, minutes)` records
//! - Minutes are strings; an empty string means the vehicle is departing now

mod client;
mod error;
mod mock;
mod parse;
mod upstream;

pub use client::{DvbClient, DvbConfig};
pub use error::FetchError;
pub use mock::{RecordedFetch, ScriptedUpstream};
pub use parse::{ParseError, parse_departures};
pub use upstream::{RawResponse, Upstream};
