//! Deployment operations.

use crate::models::{
    CreateDeploymentInput, Deployment, DeploymentCredentials, DeploymentList,
    UpdateDeploymentInput,
};
use crate::{ignore_not_found, Result};
use hush_core::query::QueryParams;
use hush_core::Client;
use tracing::info;

const DEPLOYMENTS: &str = "/v1/deployments";

fn deployment_path(id: &str) -> String {
    format!("{DEPLOYMENTS}/{id}")
}

/// Create a deployment.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn create_deployment(client: &Client, input: &CreateDeploymentInput) -> Result<Deployment> {
    create_deployment_with_credentials(client, input)
        .await
        .map(|created| created.deployment)
}

/// Create a deployment and keep the one-time agent credentials from the response.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn create_deployment_with_credentials(
    client: &Client,
    input: &CreateDeploymentInput,
) -> Result<DeploymentCredentials> {
    let created: DeploymentCredentials = client.post(DEPLOYMENTS, input).await?;
    info!(id = ?created.deployment.id, name = %input.name, "created deployment");
    Ok(created)
}

/// Fetch a deployment by id.
///
/// # Errors
///
/// Returns any error from the request dispatcher; a missing deployment satisfies
/// [`hush_core::Error::is_not_found`].
pub async fn get_deployment(client: &Client, id: &str) -> Result<Deployment> {
    client.get(&deployment_path(id)).await
}

/// Apply a partial update to a deployment.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn update_deployment(
    client: &Client,
    id: &str,
    input: &UpdateDeploymentInput,
) -> Result<Deployment> {
    client.patch(&deployment_path(id), input).await
}

/// Delete a deployment. Deleting one that no longer exists succeeds.
///
/// # Errors
///
/// Returns any error from the request dispatcher other than not-found.
pub async fn delete_deployment(client: &Client, id: &str) -> Result<()> {
    ignore_not_found(client.delete(&deployment_path(id)).await)
}

/// List deployments whose name matches `name` exactly.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn list_deployments_by_name(client: &Client, name: &str) -> Result<Vec<Deployment>> {
    let mut params = QueryParams::new();
    params.push("name", name);
    let page: DeploymentList = client.get_with_query(DEPLOYMENTS, params.as_pairs()).await?;
    Ok(page.items)
}
