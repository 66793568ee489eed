//! Error types for ovh-exporter operations.
//!
//! Defines error types for the subsystems that can fail:
//! - OVH API requests (transport, signing, decoding)
//! - Project discovery at startup
//! - Human-readable size parsing
//! - Scrape endpoint serving and its web configuration file

use thiserror::Error;

/// Errors that can occur while talking to the OVH API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid API endpoint '{0}': expected a URL or one of the known aliases")]
    InvalidEndpoint(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response for '{path}': {reason}")]
    Decode { path: String, reason: String },

    #[error("Failed to synchronise clock with API: {0}")]
    ClockSync(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::RequestFailed(err.to_string())
    }
}

/// Errors that abort project discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to list cloud projects: {0}")]
    ListProjects(#[source] ApiError),

    #[error("Failed to fetch cloud project '{project_id}': {source}")]
    ProjectDetail {
        project_id: String,
        #[source]
        source: ApiError,
    },
}

/// Errors returned when a human-readable size cannot be converted to bytes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizeError {
    #[error("invalid size: '{0}'")]
    Invalid(String),

    #[error("size out of range: '{0}'")]
    OutOfRange(String),
}

/// Errors raised by the scrape endpoint.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors loading the scrape endpoint's web configuration file.
#[derive(Debug, Error)]
pub enum WebConfigError {
    #[error("Failed to read web config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse web config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid web config: {0}")]
    Invalid(String),

    #[error("Failed to load TLS material from '{path}': {reason}")]
    Tls { path: String, reason: String },
}
