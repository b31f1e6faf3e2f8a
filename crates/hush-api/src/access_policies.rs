//! Access policy operations.

use crate::models::{AccessPolicy, AccessPolicyList, CreateAccessPolicyInput, UpdateAccessPolicyInput};
use crate::{ignore_not_found, Result};
use hush_core::Client;
use tracing::info;

const ACCESS_POLICIES: &str = "/v1/access_policies";

fn policy_path(id: &str) -> String {
    format!("{ACCESS_POLICIES}/{id}")
}

/// Create an access policy.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn create_access_policy(
    client: &Client,
    input: &CreateAccessPolicyInput,
) -> Result<AccessPolicy> {
    let created: AccessPolicy = client.post(ACCESS_POLICIES, input).await?;
    info!(id = ?created.id, name = %created.name, "created access policy");
    Ok(created)
}

/// Fetch an access policy by id.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn get_access_policy(client: &Client, id: &str) -> Result<AccessPolicy> {
    client.get(&policy_path(id)).await
}

/// Apply a partial update to an access policy.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn update_access_policy(
    client: &Client,
    id: &str,
    input: &UpdateAccessPolicyInput,
) -> Result<AccessPolicy> {
    client.patch(&policy_path(id), input).await
}

/// Delete an access policy. Deleting one that no longer exists succeeds.
///
/// # Errors
///
/// Returns any error from the request dispatcher other than not-found.
pub async fn delete_access_policy(client: &Client, id: &str) -> Result<()> {
    ignore_not_found(client.delete(&policy_path(id)).await)
}

/// List access policies.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn list_access_policies(client: &Client) -> Result<AccessPolicyList> {
    client.get(ACCESS_POLICIES).await
}
