//! Usage collection pipeline.
//!
//! - `discovery`: enumerate cloud projects once at startup (fail-fast)
//! - `usage`: fetch the current hourly storage usage of one project
//! - `collector`: the periodic fetch, normalize and publish loop

pub mod collector;
pub mod discovery;
pub mod usage;

#[cfg(test)]
pub(crate) mod mock;

pub use collector::{CycleReport, UsageCollector, DEFAULT_COLLECT_INTERVAL};
pub use discovery::discover_projects;
pub use usage::fetch_usage;
