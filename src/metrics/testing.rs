//! Test helpers reading gauges back from the text exposition.

use prometheus::Registry;

use super::labels::{LabelSet, MeasurementKind};
use super::prometheus::{export_metrics, SUBSYSTEM};

fn family_name(namespace: &str, kind: MeasurementKind) -> String {
    format!("{}_{}_{}", namespace, SUBSYSTEM, kind.metric_name())
}

fn sample_lines(registry: &Registry) -> Vec<String> {
    export_metrics(registry)
        .expect("metrics should encode")
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Number of series exported for a measurement kind.
pub fn series_count(registry: &Registry, namespace: &str, kind: MeasurementKind) -> usize {
    let prefix = format!("{}{{", family_name(namespace, kind));
    sample_lines(registry)
        .iter()
        .filter(|line| line.starts_with(&prefix))
        .count()
}

/// Exported value of one series, if present.
pub fn sample(
    registry: &Registry,
    namespace: &str,
    kind: MeasurementKind,
    labels: &LabelSet,
) -> Option<f64> {
    let series = format!(
        r#"{}{{bucket_name="{}",project_name="{}",region="{}",type="{}"}} "#,
        family_name(namespace, kind),
        labels.bucket_name,
        labels.project_name,
        labels.region,
        labels.storage_type
    );
    sample_lines(registry)
        .iter()
        .find_map(|line| line.strip_prefix(&series).map(|v| v.trim().to_string()))
        .map(|v| v.parse().expect("sample value should be numeric"))
}
