//! `PostgreSQL` access credentials.
//!
//! The backend validates connectivity in the background after a create or update, so both
//! calls wait for the credential to leave `syncing` before returning.

use crate::access_credentials::ACCESS_CREDENTIALS;
use crate::models::{
    CreatePostgresCredentialInput, PostgresAccessCredential, UpdatePostgresCredentialInput,
};
use crate::Result;
use hush_core::poll::wait_for_resource_status;
use hush_core::{CancellationToken, Client, Error, PollConfig};
use tracing::info;

fn postgres_path(id: &str) -> String {
    format!("{ACCESS_CREDENTIALS}/postgres/{id}")
}

async fn fetch(client: Client, id: String) -> Result<PostgresAccessCredential> {
    get_postgres_credential(&client, &id).await
}

/// Create a `PostgreSQL` credential and wait until the backend reports it usable.
///
/// Returns the credential as echoed by the create call.
///
/// # Errors
///
/// Returns any error from the request dispatcher, or a polling error if the credential
/// reaches `warning`/`error`, the deadline passes, or `cancel` fires.
pub async fn create_postgres_credential(
    client: &Client,
    input: &CreatePostgresCredentialInput,
    poll: &PollConfig,
    cancel: &CancellationToken,
) -> Result<PostgresAccessCredential> {
    let created: PostgresAccessCredential = client
        .post(&format!("{ACCESS_CREDENTIALS}/postgres"), input)
        .await?;
    let id = created
        .id
        .clone()
        .ok_or_else(|| Error::Decode("create response is missing the credential id".into()))?;

    info!(%id, name = %created.name, "created postgres credential, waiting for sync");
    wait_for_resource_status(client, poll, cancel, &id, fetch).await?;
    Ok(created)
}

/// Fetch a `PostgreSQL` credential by id.
///
/// # Errors
///
/// Returns any error from the request dispatcher.
pub async fn get_postgres_credential(client: &Client, id: &str) -> Result<PostgresAccessCredential> {
    client.get(&postgres_path(id)).await
}

/// Apply a partial update and wait for the credential to re-sync.
///
/// # Errors
///
/// Same as [`create_postgres_credential`].
pub async fn update_postgres_credential(
    client: &Client,
    id: &str,
    input: &UpdatePostgresCredentialInput,
    poll: &PollConfig,
    cancel: &CancellationToken,
) -> Result<PostgresAccessCredential> {
    let updated: PostgresAccessCredential = client.patch(&postgres_path(id), input).await?;
    wait_for_resource_status(client, poll, cancel, id, fetch).await?;
    Ok(updated)
}
