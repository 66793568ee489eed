//! Current hourly storage usage for a project.

use crate::error::ApiError;
use crate::ovh::{get_json, ApiClient, CloudProjectUsage, StorageUsage};

/// Fetch the current hourly storage usage of a project.
///
/// Entries without a bucket name are placeholders rather than measured
/// buckets and are dropped.
pub async fn fetch_usage(
    client: &dyn ApiClient,
    project_id: &str,
) -> Result<Vec<StorageUsage>, ApiError> {
    let path = format!(
        "/cloud/project/{}/usage/current",
        urlencoding::encode(project_id)
    );
    let usage: CloudProjectUsage = get_json(client, &path).await?;

    let total = usage.hourly_usage.storage.len();
    let buckets: Vec<StorageUsage> = usage
        .hourly_usage
        .storage
        .into_iter()
        .filter(|storage| !storage.bucket_name.is_empty())
        .collect();

    tracing::debug!(
        project_id = project_id,
        buckets = buckets.len(),
        skipped = total - buckets.len(),
        "Fetched current storage usage"
    );

    Ok(buckets)
}
