//! Typed resource operations for the Hush Security management API.
//!
//! Every function here is a thin wrapper over [`hush_core::Client`]: it picks the path and
//! the payload type and lets the core client handle tokens, transport and error
//! classification. Resources the backend provisions asynchronously wait for their status
//! through [`hush_core::poll`].

#![deny(missing_docs)]

pub mod access_credentials;
pub mod access_policies;
pub mod deployments;
pub mod models;
pub mod postgres_credentials;

pub use access_credentials::{
    create_kv_credential, create_plaintext_credential, delete_access_credential,
    get_access_credential, get_typed_credential, list_access_credentials,
    update_typed_credential,
};
pub use access_policies::{
    create_access_policy, delete_access_policy, get_access_policy, list_access_policies,
    update_access_policy,
};
pub use deployments::{
    create_deployment, create_deployment_with_credentials, delete_deployment, get_deployment,
    list_deployments_by_name, update_deployment,
};
pub use postgres_credentials::{
    create_postgres_credential, get_postgres_credential, update_postgres_credential,
};

/// Convenient result alias that reuses the shared Hush error type.
pub type Result<T> = hush_core::Result<T>;

/// Treat a not-found failure as success, for idempotent deletes.
fn ignore_not_found(result: Result<()>) -> Result<()> {
    match result {
        Err(err) if err.is_not_found() => Ok(()),
        other => other,
    }
}
