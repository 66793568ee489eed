//! ovh-exporter: Prometheus exporter for OVH Public Cloud storage usage.
//!
//! Discovers the cloud projects visible to an OVH API consumer key, polls
//! their current hourly storage usage on a fixed interval, converts every
//! quantity to bytes and exposes the results as labeled gauges.

pub mod cli;
pub mod collectors;
pub mod error;
pub mod metrics;
pub mod ovh;
pub mod server;
pub mod units;

// Re-export commonly used error types
pub use error::{ApiError, DiscoveryError, ServerError, SizeError, WebConfigError};
