//! Static access credentials (plaintext and key/value).
//!
//! These are stored as-is by the backend and are usable as soon as the create call returns.
//! Reads and updates go through the type-specific path; deletes and listing share the common
//! collection.

use crate::models::{
    AccessCredential, AccessCredentialList, AccessCredentialType, CreateKvCredentialInput,
    CreatePlaintextCredentialInput, UpdateAccessCredentialInput,
};
use crate::{ignore_not_found, Result};
use hush_core::query::QueryParams;
use hush_core::Client;
use tracing::info;

pub(crate) const ACCESS_CREDENTIALS: &str = "/v1/access_credentials";

fn typed_path(credential_type: AccessCredentialType, id: &str) -> String {
    format!("{ACCESS_CREDENTIALS}/{credential_type}/{id}")
}

/// Create a plaintext credential.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn create_plaintext_credential(
    client: &Client,
    input: &CreatePlaintextCredentialInput,
) -> Result<AccessCredential> {
    let created: AccessCredential = client
        .post(&format!("{ACCESS_CREDENTIALS}/plaintext"), input)
        .await?;
    info!(id = ?created.id, name = %created.name, "created plaintext credential");
    Ok(created)
}

/// Create a key/value credential.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn create_kv_credential(
    client: &Client,
    input: &CreateKvCredentialInput,
) -> Result<AccessCredential> {
    let created: AccessCredential = client
        .post(&format!("{ACCESS_CREDENTIALS}/kv"), input)
        .await?;
    info!(id = ?created.id, name = %created.name, "created kv credential");
    Ok(created)
}

/// Fetch any credential by id through the shared collection.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn get_access_credential(client: &Client, id: &str) -> Result<AccessCredential> {
    client.get(&format!("{ACCESS_CREDENTIALS}/{id}")).await
}

/// Fetch a credential through its type-specific path.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn get_typed_credential(
    client: &Client,
    credential_type: AccessCredentialType,
    id: &str,
) -> Result<AccessCredential> {
    client.get(&typed_path(credential_type, id)).await
}

/// Rename or re-describe a plaintext or KV credential. Secret material cannot be changed.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn update_typed_credential(
    client: &Client,
    credential_type: AccessCredentialType,
    id: &str,
    input: &UpdateAccessCredentialInput,
) -> Result<AccessCredential> {
    client.patch(&typed_path(credential_type, id), input).await
}

/// Delete a credential of any type. Deleting one that no longer exists succeeds.
///
/// # Errors
///
/// Returns any error from the request dispatcher other than not-found.
pub async fn delete_access_credential(client: &Client, id: &str) -> Result<()> {
    ignore_not_found(client.delete(&format!("{ACCESS_CREDENTIALS}/{id}")).await)
}

/// List credentials, optionally restricted to one type.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn list_access_credentials(
    client: &Client,
    credential_type: Option<AccessCredentialType>,
) -> Result<AccessCredentialList> {
    let mut params = QueryParams::new();
    params.push_opt("type", credential_type);
    client
        .get_with_query(ACCESS_CREDENTIALS, params.as_pairs())
        .await
}
