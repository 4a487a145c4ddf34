//! Defines the data structures and models used throughout the application.
//!
//! This includes the AQI classification table, the canonical location record with
//! its normalization, and the payloads of the non-map dashboard endpoints.

mod aqi;
mod dashboard;
mod location;

pub use aqi::*;
pub use dashboard::*;
pub use location::*;
