//! Label schema shared by all storage usage gauges.

use std::fmt;

use crate::ovh::{CloudProject, Quantity, StorageUsage};

/// Label names, in the order their values are passed to the gauges.
pub const LABEL_NAMES: [&str; 4] = ["project_name", "bucket_name", "region", "type"];

/// Identity of one storage bucket series within a measurement kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet {
    pub project_name: String,
    pub bucket_name: String,
    pub region: String,
    pub storage_type: String,
}

impl LabelSet {
    /// Build the label set for a bucket of a project.
    pub fn new(project: &CloudProject, storage: &StorageUsage) -> Self {
        Self {
            project_name: project.project_name.clone(),
            bucket_name: storage.bucket_name.clone(),
            region: storage.region.clone(),
            storage_type: storage.storage_type.clone(),
        }
    }

    /// Label values in [`LABEL_NAMES`] order.
    pub fn values(&self) -> [&str; 4] {
        [
            self.project_name.as_str(),
            self.bucket_name.as_str(),
            self.region.as_str(),
            self.storage_type.as_str(),
        ]
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({}, {})",
            self.project_name, self.bucket_name, self.region, self.storage_type
        )
    }
}

/// The five storage measurements exported per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementKind {
    IncomingBandwidth,
    IncomingInternalBandwidth,
    OutgoingBandwidth,
    OutgoingInternalBandwidth,
    Stored,
}

impl MeasurementKind {
    /// All kinds, in registration order.
    pub const ALL: [MeasurementKind; 5] = [
        MeasurementKind::IncomingBandwidth,
        MeasurementKind::IncomingInternalBandwidth,
        MeasurementKind::OutgoingBandwidth,
        MeasurementKind::OutgoingInternalBandwidth,
        MeasurementKind::Stored,
    ];

    /// Metric name below the `cloud_project_usage` subsystem.
    pub fn metric_name(self) -> &'static str {
        match self {
            MeasurementKind::IncomingBandwidth => "storage_incoming_bw",
            MeasurementKind::IncomingInternalBandwidth => "storage_incoming_internal_bw",
            MeasurementKind::OutgoingBandwidth => "storage_outgoing_bw",
            MeasurementKind::OutgoingInternalBandwidth => "storage_outgoing_internal_bw",
            MeasurementKind::Stored => "storage_stored",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            MeasurementKind::IncomingBandwidth => {
                "Incoming bandwidth for OVH Cloud Project storage"
            }
            MeasurementKind::IncomingInternalBandwidth => {
                "Incoming internal bandwidth for OVH Cloud Project storage"
            }
            MeasurementKind::OutgoingBandwidth => {
                "Outgoing bandwidth for OVH Cloud Project storage"
            }
            MeasurementKind::OutgoingInternalBandwidth => {
                "Outgoing internal bandwidth for OVH Cloud Project storage"
            }
            MeasurementKind::Stored => "Stored Data for OVH Cloud Project storage",
        }
    }

    /// Pick the quantity for this kind out of a usage entry.
    pub fn quantity(self, storage: &StorageUsage) -> &Quantity {
        match self {
            MeasurementKind::IncomingBandwidth => &storage.incoming_bandwidth.quantity,
            MeasurementKind::IncomingInternalBandwidth => {
                &storage.incoming_internal_bandwidth.quantity
            }
            MeasurementKind::OutgoingBandwidth => &storage.outgoing_bandwidth.quantity,
            MeasurementKind::OutgoingInternalBandwidth => {
                &storage.outgoing_internal_bandwidth.quantity
            }
            MeasurementKind::Stored => &storage.stored.quantity,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}
