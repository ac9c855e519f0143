//! Domain types for the departure monitor.
//!
//! A [`Departure`] is one row of an upstream departure board; a [`Stop`]
//! pairs a stop name with the filter that decides which rows are kept.

mod departure;
mod stop;

pub use departure::Departure;
pub use stop::Stop;
