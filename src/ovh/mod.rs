//! OVH API access.
//!
//! - `client`: the [`ApiClient`] seam and the signed [`OvhClient`]
//! - `endpoint`: alias to base URL resolution
//! - `types`: response documents for the cloud project endpoints

pub mod client;
pub mod endpoint;
pub mod types;

pub use client::{get_json, ApiClient, Credentials, OvhClient, DEFAULT_API_TIMEOUT};
pub use endpoint::resolve_endpoint;
pub use types::{
    BilledQuantity, CloudProject, CloudProjectUsage, HourlyUsage, Quantity, StorageUsage,
};
