//! Wire types for the OVH cloud project API.

use serde::{Deserialize, Serialize};

/// A public cloud project as returned by `GET /cloud/project/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudProject {
    /// Project identifier.
    #[serde(default)]
    pub project_id: String,
    /// Human readable project name.
    #[serde(rename = "projectName", default)]
    pub project_name: String,
}

/// A magnitude with its human readable unit, e.g. `{ "unit": "GiBh", "value": 2.0 }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Quantity {
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub value: f64,
}

/// A billed quantity and its price.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BilledQuantity {
    #[serde(default)]
    pub quantity: Quantity,
    #[serde(default)]
    pub total_price: f64,
}

/// Storage usage for one bucket over the current hour.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default)]
    pub region: String,
    #[serde(rename = "type", default)]
    pub storage_type: String,
    #[serde(default)]
    pub incoming_bandwidth: BilledQuantity,
    #[serde(default)]
    pub incoming_internal_bandwidth: BilledQuantity,
    #[serde(default)]
    pub outgoing_bandwidth: BilledQuantity,
    #[serde(default)]
    pub outgoing_internal_bandwidth: BilledQuantity,
    #[serde(default)]
    pub stored: BilledQuantity,
}

/// Hourly usage breakdown.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HourlyUsage {
    #[serde(default)]
    pub storage: Vec<StorageUsage>,
}

/// Document returned by `GET /cloud/project/{id}/usage/current`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudProjectUsage {
    #[serde(default)]
    pub hourly_usage: HourlyUsage,
}
