//! Periodic storage usage collection.
//!
//! A single background task walks the discovered projects in order, fetches
//! each project's current usage, normalizes every quantity and publishes the
//! result into the [`UsageMetrics`] gauges.
//!
//! # Failure handling
//!
//! - A failed usage fetch is logged and the cycle moves on to the next
//!   project. The previous values for that project stay exported.
//! - A quantity that cannot be normalized is exported as zero and counted
//!   as degraded; the bucket's other measurements are unaffected.
//! - After a successful fetch, buckets published last cycle but missing from
//!   the response are removed from every gauge, unless another project with
//!   the same name still publishes the same label set.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::usage::fetch_usage;
use crate::metrics::{LabelSet, MeasurementKind, UsageMetrics};
use crate::ovh::{ApiClient, CloudProject, StorageUsage};
use crate::units::normalize;

/// Default period between two collection cycles.
pub const DEFAULT_COLLECT_INTERVAL: Duration = Duration::from_secs(60);

/// Outcome of one collection cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Projects whose usage was fetched and published.
    pub projects_ok: usize,
    /// Projects whose usage fetch failed.
    pub projects_failed: usize,
    /// Individual gauge values set.
    pub series_published: usize,
    /// Quantities that could not be parsed and were exported as zero.
    pub degraded_quantities: usize,
    /// Bucket label sets removed because they vanished from the usage data.
    pub series_removed: usize,
}

/// Collects storage usage for a fixed set of projects.
pub struct UsageCollector {
    client: Arc<dyn ApiClient>,
    metrics: UsageMetrics,
    projects: Vec<CloudProject>,
    interval: Duration,
    /// Label sets published during the last successful fetch, per project id.
    published: HashMap<String, HashSet<LabelSet>>,
}

impl UsageCollector {
    /// Create a collector for the given projects.
    pub fn new(
        client: Arc<dyn ApiClient>,
        metrics: UsageMetrics,
        projects: Vec<CloudProject>,
    ) -> Self {
        Self {
            client,
            metrics,
            projects,
            interval: DEFAULT_COLLECT_INTERVAL,
            published: HashMap::new(),
        }
    }

    /// Set the period between cycles. Zero is raised to one second.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_secs(1));
        self
    }

    /// Get the configured projects.
    pub fn projects(&self) -> &[CloudProject] {
        &self.projects
    }

    /// Get the period between cycles.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one collection cycle over every project.
    pub async fn collect_once(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        for project in &self.projects {
            let buckets = match fetch_usage(self.client.as_ref(), &project.project_id).await {
                Ok(buckets) => buckets,
                Err(e) => {
                    warn!(
                        project_id = %project.project_id,
                        project_name = %project.project_name,
                        error = %e,
                        "Failed to fetch project usage"
                    );
                    report.projects_failed += 1;
                    continue;
                }
            };

            let seen = publish_buckets(&self.metrics, project, &buckets, &mut report);

            let previous = self
                .published
                .remove(&project.project_id)
                .unwrap_or_default();
            for stale in previous.difference(&seen) {
                // Projects may share a display name, so the series can still belong to another one.
                if self.published.values().any(|other| other.contains(stale)) {
                    debug!(series = %stale, "Keeping series still published by another project");
                    continue;
                }
                debug!(series = %stale, "Removing series for vanished bucket");
                self.metrics.remove(stale);
                report.series_removed += 1;
            }
            self.published.insert(project.project_id.clone(), seen);

            report.projects_ok += 1;
        }

        report
    }

    /// Run collection cycles until `shutdown` fires or its sender is dropped.
    ///
    /// The first cycle starts immediately. Shutdown is observed between
    /// cycles, so an in-flight cycle always completes.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            projects = self.projects.len(),
            interval_secs = self.interval.as_secs(),
            "Usage collector started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {}
            }

            let report = self.collect_once().await;
            info!(
                projects_ok = report.projects_ok,
                projects_failed = report.projects_failed,
                series_published = report.series_published,
                degraded_quantities = report.degraded_quantities,
                series_removed = report.series_removed,
                "Collection cycle complete"
            );
        }

        info!("Usage collector stopped");
    }

    /// Spawn [`run`](Self::run) onto the tokio runtime.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

/// Publish the five measurements of each bucket and return the label sets written.
fn publish_buckets(
    metrics: &UsageMetrics,
    project: &CloudProject,
    buckets: &[StorageUsage],
    report: &mut CycleReport,
) -> HashSet<LabelSet> {
    let mut seen = HashSet::with_capacity(buckets.len());

    for storage in buckets {
        let labels = LabelSet::new(project, storage);

        let bytes = MeasurementKind::ALL.map(|kind| {
            let normalized = normalize(kind.quantity(storage));
            if normalized.degraded {
                report.degraded_quantities += 1;
            }
            normalized.bytes
        });
        metrics.set_all(&labels, bytes);
        report.series_published += bytes.len();

        seen.insert(labels);
    }

    seen
}
