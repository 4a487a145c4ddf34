//! Defines the application's primary error type `AppError` and a convenience `Result` alias.
//!
//! Uses the `thiserror` crate for ergonomic error definition and provides `From`
//! implementations to convert common external errors into `AppError` variants.
//! Errors that do not implement `Clone` are wrapped in `Arc` to allow `AppError` to be cloneable.

use std::sync::Arc;
use thiserror::Error;

/// The primary error enumeration for all application-specific errors.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// The dashboard backend answered with a non-2xx status, or the transport failed
    /// before any status was received (`status` is `None`).
    #[error("Network Error: {}{reason}", .status.map(|s| format!("{} ", s)).unwrap_or_default())]
    Network { status: Option<u16>, reason: String },

    /// Error originating from the HTTP client (`reqwest`) outside of a status check.
    #[error("API Error: {0}")]
    Api(Arc<reqwest::Error>),

    /// Error during JSON parsing (`serde_json`). Wrapped in Arc as serde_json::Error is not Clone.
    #[error("JSON Parsing Error: {0}")]
    JsonParse(Arc<serde_json::Error>),

    /// A payload whose top-level shape cannot be used at all. Field-level defects are
    /// defaulted during normalization and never surface here.
    #[error("Unexpected payload shape: {0}")]
    DataShape(String),

    /// The user (or platform) refused to share a position.
    #[error("Geolocation unavailable: {0}")]
    GeolocationDenied(String),

    /// The platform lacks a capability (geolocation, fullscreen).
    #[error("{0} is not supported on this platform")]
    UnsupportedCapability(&'static str),

    /// Invalid configuration value (base URL, coordinates, preference file).
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error related to accessing environment variables.
    #[error("Environment Error: {0}")]
    Env(#[from] std::env::VarError),

    /// Error related to standard I/O operations.
    #[error("I/O Error: {0}")]
    Io(Arc<std::io::Error>),

    /// Error specific to CLI logic or argument handling.
    #[error("CLI Error: {0}")]
    Cli(String),

    /// Error originating from user interaction prompts (`dialoguer`).
    #[error("Dialoguer Error: {0}")]
    Dialoguer(Arc<dialoguer::Error>),

    /// Error related to progress bar style templating (`indicatif`).
    #[error("Progress Style Template Error: {0}")]
    Template(Arc<indicatif::style::TemplateError>),
}

/// A specialized `Result` type using the application's `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Builds a `Network` error from a failed `reqwest` call, keeping the status when present.
    pub fn network(err: &reqwest::Error) -> Self {
        let status = err.status();
        AppError::Network {
            status: status.map(|s| s.as_u16()),
            reason: status
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string()),
        }
    }
}

// --- From implementations ---
// These allow easy conversion from external error types into AppError
// using the `?` operator. Arc is used for non-Clone error types.

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Api(Arc::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(Arc::new(err))
    }
}

impl From<dialoguer::Error> for AppError {
    fn from(err: dialoguer::Error) -> Self {
        AppError::Dialoguer(Arc::new(err))
    }
}

impl From<indicatif::style::TemplateError> for AppError {
    fn from(err: indicatif::style::TemplateError) -> Self {
        AppError::Template(Arc::new(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonParse(Arc::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display_includes_status_and_reason() {
        let err = AppError::Network {
            status: Some(503),
            reason: "Service Unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Network Error: 503 Service Unavailable");
    }

    #[test]
    fn test_network_error_display_without_status() {
        let err = AppError::Network {
            status: None,
            reason: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Network Error: connection refused");
    }
}
