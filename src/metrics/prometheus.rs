//! Prometheus gauge registration and export.
//!
//! Gauges are owned by a [`UsageMetrics`] handle registered against an
//! explicit [`Registry`]; nothing here lives in global state. The prometheus
//! types are internally synchronised, so the handle can be cloned into the
//! collection task while the scrape endpoint gathers the same registry.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use super::labels::{LabelSet, MeasurementKind, LABEL_NAMES};

/// Default metric namespace.
pub const DEFAULT_NAMESPACE: &str = "ovh";

/// Subsystem shared by all storage usage metrics.
pub const SUBSYSTEM: &str = "cloud_project_usage";

/// The five storage usage gauges.
#[derive(Clone)]
pub struct UsageMetrics {
    gauges: [GaugeVec; 5],
}

impl UsageMetrics {
    /// Create the gauges under `namespace` and register them with `registry`.
    ///
    /// # Errors
    ///
    /// Returns a `prometheus::Error` if the namespace yields an invalid metric
    /// name or the gauges are already registered.
    pub fn new(registry: &Registry, namespace: &str) -> Result<Self, prometheus::Error> {
        let gauges = [
            gauge(namespace, MeasurementKind::IncomingBandwidth)?,
            gauge(namespace, MeasurementKind::IncomingInternalBandwidth)?,
            gauge(namespace, MeasurementKind::OutgoingBandwidth)?,
            gauge(namespace, MeasurementKind::OutgoingInternalBandwidth)?,
            gauge(namespace, MeasurementKind::Stored)?,
        ];

        for gauge in &gauges {
            registry.register(Box::new(gauge.clone()))?;
        }

        tracing::debug!(namespace = namespace, "Registered storage usage gauges");

        Ok(Self { gauges })
    }

    /// Set one measurement for a label combination, creating the series on first use.
    pub fn set(&self, kind: MeasurementKind, labels: &LabelSet, bytes: i64) {
        self.gauges[kind.index()]
            .with_label_values(&labels.values())
            .set(bytes as f64);
    }

    /// Set all five measurements of one label combination, in [`MeasurementKind::ALL`] order.
    pub fn set_all(&self, labels: &LabelSet, bytes: [i64; 5]) {
        for (kind, value) in MeasurementKind::ALL.into_iter().zip(bytes) {
            self.set(kind, labels, value);
        }
    }

    /// Remove a label combination from all five gauges.
    pub fn remove(&self, labels: &LabelSet) {
        for gauge in &self.gauges {
            // Absent series are fine: a bucket may never have been published for every kind.
            let _ = gauge.remove_label_values(&labels.values());
        }
    }
}

fn gauge(namespace: &str, kind: MeasurementKind) -> Result<GaugeVec, prometheus::Error> {
    GaugeVec::new(
        Opts::new(kind.metric_name(), kind.help())
            .namespace(namespace)
            .subsystem(SUBSYSTEM),
        &LABEL_NAMES,
    )
}

/// Encode every metric family in `registry` in the Prometheus text format.
pub fn export_metrics(registry: &Registry) -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;

    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Content type of [`export_metrics`] output.
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::testing::{sample, series_count};

    fn labels(bucket: &str) -> LabelSet {
        LabelSet {
            project_name: "prod".to_string(),
            bucket_name: bucket.to_string(),
            region: "GRA".to_string(),
            storage_type: "storage".to_string(),
        }
    }

    #[test]
    fn test_new_registers_five_families() {
        let registry = Registry::new();
        let metrics = UsageMetrics::new(&registry, DEFAULT_NAMESPACE).expect("should register");

        // Families without series are not gathered, so publish one first.
        for kind in MeasurementKind::ALL {
            metrics.set(kind, &labels("b"), 1);
        }

        let text = export_metrics(&registry).expect("should encode");
        let mut types: Vec<&str> = text
            .lines()
            .filter(|line| line.starts_with("# TYPE"))
            .collect();
        types.sort();
        assert_eq!(
            types,
            vec![
                "# TYPE ovh_cloud_project_usage_storage_incoming_bw gauge",
                "# TYPE ovh_cloud_project_usage_storage_incoming_internal_bw gauge",
                "# TYPE ovh_cloud_project_usage_storage_outgoing_bw gauge",
                "# TYPE ovh_cloud_project_usage_storage_outgoing_internal_bw gauge",
                "# TYPE ovh_cloud_project_usage_storage_stored gauge",
            ]
        );
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = Registry::new();
        UsageMetrics::new(&registry, "ovh").expect("first registration");
        assert!(UsageMetrics::new(&registry, "ovh").is_err());
    }

    #[test]
    fn test_invalid_namespace_fails() {
        let registry = Registry::new();
        assert!(UsageMetrics::new(&registry, "bad-prefix").is_err());
    }

    #[test]
    fn test_set_is_idempotent() {
        let registry = Registry::new();
        let metrics = UsageMetrics::new(&registry, "ovh").expect("should register");
        let labels = labels("backups");

        metrics.set(MeasurementKind::Stored, &labels, 2_000_000_000);
        metrics.set(MeasurementKind::Stored, &labels, 2_000_000_000);

        assert_eq!(series_count(&registry, "ovh", MeasurementKind::Stored), 1);
        assert_eq!(
            sample(&registry, "ovh", MeasurementKind::Stored, &labels),
            Some(2_000_000_000.0)
        );
    }

    #[test]
    fn test_set_overwrites() {
        let registry = Registry::new();
        let metrics = UsageMetrics::new(&registry, "ovh").expect("should register");
        let labels = labels("backups");

        metrics.set(MeasurementKind::OutgoingBandwidth, &labels, 10);
        metrics.set(MeasurementKind::OutgoingBandwidth, &labels, 20);

        assert_eq!(
            series_count(&registry, "ovh", MeasurementKind::OutgoingBandwidth),
            1
        );
        assert_eq!(
            sample(&registry, "ovh", MeasurementKind::OutgoingBandwidth, &labels),
            Some(20.0)
        );
        assert_eq!(
            series_count(&registry, "ovh", MeasurementKind::IncomingBandwidth),
            0
        );
    }

    #[test]
    fn test_set_all_fills_every_gauge() {
        let registry = Registry::new();
        let metrics = UsageMetrics::new(&registry, "ovh").expect("should register");
        let labels = labels("backups");

        metrics.set_all(&labels, [1, 2, 3, 4, 5]);

        let expect = [
            (MeasurementKind::IncomingBandwidth, 1.0),
            (MeasurementKind::IncomingInternalBandwidth, 2.0),
            (MeasurementKind::OutgoingBandwidth, 3.0),
            (MeasurementKind::OutgoingInternalBandwidth, 4.0),
            (MeasurementKind::Stored, 5.0),
        ];
        for (kind, value) in expect {
            assert_eq!(sample(&registry, "ovh", kind, &labels), Some(value), "{kind:?}");
        }
    }

    #[test]
    fn test_remove_drops_all_kinds() {
        let registry = Registry::new();
        let metrics = UsageMetrics::new(&registry, "ovh").expect("should register");
        let keep = labels("keep");
        let gone = labels("gone");

        for kind in MeasurementKind::ALL {
            metrics.set(kind, &keep, 1);
            metrics.set(kind, &gone, 1);
        }
        metrics.remove(&gone);
        // Removing twice is harmless.
        metrics.remove(&gone);

        for kind in MeasurementKind::ALL {
            assert_eq!(series_count(&registry, "ovh", kind), 1);
            assert_eq!(sample(&registry, "ovh", kind, &gone), None);
            assert_eq!(sample(&registry, "ovh", kind, &keep), Some(1.0));
        }
    }

    #[test]
    fn test_export_metrics_text_format() {
        let registry = Registry::new();
        let metrics = UsageMetrics::new(&registry, "acme").expect("should register");
        metrics.set(MeasurementKind::Stored, &labels("backups"), 42);

        let text = export_metrics(&registry).expect("should encode");
        assert!(text.contains("# HELP acme_cloud_project_usage_storage_stored"));
        assert!(text.contains("# TYPE acme_cloud_project_usage_storage_stored gauge"));
        assert!(text.contains(
            r#"acme_cloud_project_usage_storage_stored{bucket_name="backups",project_name="prod",region="GRA",type="storage"} 42"#
        ));
    }

    #[test]
    fn test_content_type() {
        assert!(content_type().starts_with("text/plain"));
    }
}
