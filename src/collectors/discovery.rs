//! Cloud project discovery.

use crate::error::DiscoveryError;
use crate::ovh::{get_json, ApiClient, CloudProject};

/// List every public cloud project visible to the consumer key.
///
/// Project identifiers are fetched first, then each project's details.
/// Any failed request aborts discovery: the exporter must not start serving
/// from a partial project list.
pub async fn discover_projects(
    client: &dyn ApiClient,
) -> Result<Vec<CloudProject>, DiscoveryError> {
    let project_ids: Vec<String> = get_json(client, "/cloud/project")
        .await
        .map_err(DiscoveryError::ListProjects)?;

    tracing::debug!(count = project_ids.len(), "Listed cloud project identifiers");

    let mut projects = Vec::with_capacity(project_ids.len());
    for project_id in project_ids {
        let path = format!("/cloud/project/{}", urlencoding::encode(&project_id));
        let mut project: CloudProject = get_json(client, &path).await.map_err(|source| {
            DiscoveryError::ProjectDetail {
                project_id: project_id.clone(),
                source,
            }
        })?;
        if project.project_id.is_empty() {
            project.project_id = project_id;
        }

        tracing::info!(
            project_id = %project.project_id,
            project_name = %project.project_name,
            "Discovered cloud project"
        );
        projects.push(project);
    }

    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::mock::MockApiClient;
    use serde_json::json;

    #[tokio::test]
    async fn test_discover_projects_in_api_order() {
        let client = MockApiClient::new()
            .with_response("/cloud/project", json!(["p2", "p1"]))
            .with_response(
                "/cloud/project/p2",
                json!({"project_id": "p2", "projectName": "staging"}),
            )
            .with_response(
                "/cloud/project/p1",
                json!({"project_id": "p1", "projectName": "production"}),
            );

        let projects = discover_projects(&client).await.expect("should discover");

        assert_eq!(
            projects,
            vec![
                CloudProject {
                    project_id: "p2".to_string(),
                    project_name: "staging".to_string(),
                },
                CloudProject {
                    project_id: "p1".to_string(),
                    project_name: "production".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_detail_without_id_uses_listed_id() {
        let client = MockApiClient::new()
            .with_response("/cloud/project", json!(["p1"]))
            .with_response("/cloud/project/p1", json!({"projectName": "production"}));

        let projects = discover_projects(&client).await.expect("should discover");

        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].project_id, "p1");
        assert_eq!(projects[0].project_name, "production");
    }

    #[tokio::test]
    async fn test_discover_no_projects() {
        let client = MockApiClient::new().with_response("/cloud/project", json!([]));
        let projects = discover_projects(&client).await.expect("should discover");
        assert!(projects.is_empty());
    }

    #[tokio::test]
    async fn test_detail_failure_aborts_discovery() {
        let client = MockApiClient::new()
            .with_response("/cloud/project", json!(["p1", "p2"]))
            .with_failure("/cloud/project/p1", 403, "This call has not been granted")
            .with_response(
                "/cloud/project/p2",
                json!({"project_id": "p2", "projectName": "staging"}),
            );

        let result = discover_projects(&client).await;

        match result {
            Err(DiscoveryError::ProjectDetail { project_id, .. }) => assert_eq!(project_id, "p1"),
            other => panic!("Expected ProjectDetail error, got {:?}", other),
        }
        // Fail-fast: p2 is never requested.
        assert_eq!(client.calls(), vec!["/cloud/project", "/cloud/project/p1"]);
    }

    #[tokio::test]
    async fn test_list_failure() {
        let client = MockApiClient::new().with_failure("/cloud/project", 500, "boom");
        let result = discover_projects(&client).await;
        assert!(matches!(result, Err(DiscoveryError::ListProjects(_))));
    }

    #[tokio::test]
    async fn test_malformed_list_is_an_error() {
        let client =
            MockApiClient::new().with_response("/cloud/project", json!({"unexpected": true}));
        let result = discover_projects(&client).await;
        assert!(matches!(result, Err(DiscoveryError::ListProjects(_))));
    }
}
