//! Provides clients and utilities for reaching dashboard data.
//!
//! Includes:
//! - `gateway`: Client for the dashboard backend's JSON endpoints.
//! - `snapshot`: The bundled static snapshot used as a realtime fallback.

mod gateway;
mod snapshot;

#[cfg(test)]
mod gateway_test;

pub use gateway::*;
pub use snapshot::*;
