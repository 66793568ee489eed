//! Prometheus metrics for OVH cloud project storage usage.
//!
//! # Example
//!
//! ```ignore
//! use ovh_exporter::metrics::{export_metrics, LabelSet, MeasurementKind, UsageMetrics};
//! use prometheus::Registry;
//!
//! let registry = Registry::new();
//! let metrics = UsageMetrics::new(&registry, "ovh")?;
//!
//! metrics.set(MeasurementKind::Stored, &labels, 2_000_000_000);
//!
//! // Render for a Prometheus scrape
//! let text = export_metrics(&registry)?;
//! ```

pub mod labels;
pub mod prometheus;

#[cfg(test)]
pub(crate) mod testing;

pub use labels::{LabelSet, MeasurementKind, LABEL_NAMES};
pub use self::prometheus::{content_type, export_metrics, UsageMetrics, DEFAULT_NAMESPACE, SUBSYSTEM};
