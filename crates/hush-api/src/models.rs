//! Wire models for Hush resources.
//!
//! Fields the server assigns (ids, status, timestamps) are optional and skipped when absent, so
//! a model read from the API serializes back to the same document.

use hush_core::StatusResource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A registered deployment (cluster, ECS service, serverless environment).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deployment {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Environment type.
    pub env_type: String,
    /// Reported status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Deployment kind (k8s, ecs, serverless).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last modification timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

/// Payload for creating a deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateDeploymentInput {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Environment type.
    pub env_type: String,
    /// Deployment kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Partial update for a deployment. Unset fields are left unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UpdateDeploymentInput {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Environment type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_type: Option<String>,
    /// Deployment kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Create response carrying the one-time agent credentials.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentCredentials {
    /// The created deployment.
    #[serde(flatten)]
    pub deployment: Deployment,
    /// Agent registration token.
    #[serde(default)]
    pub token: String,
    /// Agent password.
    #[serde(default)]
    pub password: String,
    /// Registry pull secret for the agent image.
    #[serde(default)]
    pub image_pull_secret: String,
}

impl fmt::Debug for DeploymentCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentCredentials")
            .field("deployment", &self.deployment)
            .field("token", &"[redacted]")
            .field("password", &"[redacted]")
            .field("image_pull_secret", &"[redacted]")
            .finish()
    }
}

/// Page of deployments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DeploymentList {
    /// Deployments on this page.
    #[serde(default)]
    pub items: Vec<Deployment>,
    /// Cursor for the next page.
    #[serde(default)]
    pub next_cursor: Option<String>,
    /// Whether more pages exist.
    #[serde(default)]
    pub has_more: bool,
}

/// Workload attribute an access policy matches on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AttestationCriterionType {
    /// Kubernetes namespace.
    #[serde(rename = "k8s:ns")]
    K8sNamespace,
    /// Kubernetes service account.
    #[serde(rename = "k8s:sa")]
    K8sServiceAccount,
    /// Kubernetes pod label.
    #[serde(rename = "k8s:pod-label")]
    K8sPodLabel,
    /// Kubernetes pod name.
    #[serde(rename = "k8s:pod-name")]
    K8sPodName,
    /// Container name.
    #[serde(rename = "k8s:container-name")]
    K8sContainerName,
}

/// One attestation match rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttestationCriterion {
    /// Attribute kind.
    #[serde(rename = "type")]
    pub criterion_type: AttestationCriterionType,
    /// Label key, for label criteria.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Value to match.
    pub value: String,
}

/// How a credential reaches the workload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    /// Environment variables.
    #[default]
    Env,
}

/// Mapping of a credential key to a delivered name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryItem {
    /// Credential key.
    pub key: String,
    /// Name exposed to the workload.
    pub name: String,
}

/// Delivery settings of an access policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DeliveryConfig {
    /// Delivery mechanism.
    #[serde(rename = "type")]
    pub delivery_type: DeliveryType,
    /// Delivered items.
    #[serde(default)]
    pub items: Vec<DeliveryItem>,
}

/// Binds a credential to workloads matching attestation criteria.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the policy is active.
    pub enabled: bool,
    /// Credential delivered by this policy.
    pub access_credential_id: String,
    /// Workload match rules.
    #[serde(default)]
    pub attestation_criteria: Vec<AttestationCriterion>,
    /// Deployments the policy applies to.
    #[serde(default)]
    pub deployment_ids: Vec<String>,
    /// Delivery settings.
    pub delivery_config: DeliveryConfig,
}

/// Payload for creating an access policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateAccessPolicyInput {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the policy is active.
    pub enabled: bool,
    /// Credential delivered by this policy.
    pub access_credential_id: String,
    /// Workload match rules.
    pub attestation_criteria: Vec<AttestationCriterion>,
    /// Deployments the policy applies to.
    pub deployment_ids: Vec<String>,
    /// Delivery settings.
    pub delivery_config: DeliveryConfig,
}

/// Partial update for an access policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UpdateAccessPolicyInput {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Enabled flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Credential id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_credential_id: Option<String>,
    /// Workload match rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attestation_criteria: Option<Vec<AttestationCriterion>>,
    /// Deployment ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_ids: Option<Vec<String>>,
    /// Delivery settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_config: Option<DeliveryConfig>,
}

/// Page of access policies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AccessPolicyList {
    /// Policies on this page.
    #[serde(default)]
    pub items: Vec<AccessPolicy>,
    /// Total number of policies.
    #[serde(default)]
    pub total: u64,
    /// Whether more pages exist.
    #[serde(default)]
    pub has_next: bool,
    /// Cursor for the next page.
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Kind of access credential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccessCredentialType {
    /// Single opaque secret.
    Plaintext,
    /// Key/value secret bundle.
    Kv,
    /// `PostgreSQL` database.
    Postgres,
    /// `MongoDB` database.
    Mongodb,
    /// `MySQL` database.
    Mysql,
    /// `MariaDB` database.
    Mariadb,
    /// `OpenAI` API key.
    Openai,
    /// Gemini API key.
    Gemini,
    /// A type this client does not model.
    #[serde(other)]
    Unknown,
}

impl AccessCredentialType {
    /// The wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plaintext => "plaintext",
            Self::Kv => "kv",
            Self::Postgres => "postgres",
            Self::Mongodb => "mongodb",
            Self::Mysql => "mysql",
            Self::Mariadb => "mariadb",
            Self::Openai => "openai",
            Self::Gemini => "gemini",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AccessCredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common view of any access credential. Secret material is never returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessCredential {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Credential kind.
    #[serde(rename = "type")]
    pub credential_type: AccessCredentialType,
    /// Deployments that may receive the credential.
    #[serde(default)]
    pub deployment_ids: Vec<String>,
    /// Key names, for KV credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last modification timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    /// Creator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// One key/value pair of a KV credential.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KvItem {
    /// Key.
    pub key: String,
    /// Secret value.
    pub value: String,
}

impl fmt::Debug for KvItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvItem")
            .field("key", &self.key)
            .field("value", &"[redacted]")
            .finish()
    }
}

/// Payload for creating a plaintext credential.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatePlaintextCredentialInput {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deployments that may receive the credential.
    pub deployment_ids: Vec<String>,
    /// Secret value.
    pub secret: String,
}

impl fmt::Debug for CreatePlaintextCredentialInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatePlaintextCredentialInput")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("deployment_ids", &self.deployment_ids)
            .finish_non_exhaustive()
    }
}

/// Payload for creating a KV credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateKvCredentialInput {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deployments that may receive the credential.
    pub deployment_ids: Vec<String>,
    /// Key/value pairs.
    pub items: Vec<KvItem>,
}

/// Partial update for plaintext and KV credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UpdateAccessCredentialInput {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Page of access credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AccessCredentialList {
    /// Credentials on this page.
    #[serde(default)]
    pub items: Vec<AccessCredential>,
    /// Total number of credentials.
    #[serde(default)]
    pub total: u64,
    /// Whether more pages exist.
    #[serde(default)]
    pub has_next: bool,
    /// Cursor for the next page.
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A `PostgreSQL` credential, provisioned asynchronously.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostgresAccessCredential {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Always `postgres`.
    #[serde(rename = "type")]
    pub credential_type: AccessCredentialType,
    /// Credential kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Deployments that may receive the credential.
    #[serde(default)]
    pub deployment_ids: Vec<String>,
    /// Database name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    /// Database host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Database port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// TLS mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_mode: Option<String>,
    /// CA bundle for TLS verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_ca: Option<String>,
    /// Database user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Reconciliation status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Human-readable detail for the status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
}

impl StatusResource for PostgresAccessCredential {
    fn status_fields(&self) -> (&str, &str) {
        (
            self.status.as_deref().unwrap_or_default(),
            self.status_detail.as_deref().unwrap_or_default(),
        )
    }
}

/// Payload for creating a `PostgreSQL` credential.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatePostgresCredentialInput {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deployments that may receive the credential.
    pub deployment_ids: Vec<String>,
    /// Database name.
    pub db_name: String,
    /// Database host.
    pub host: String,
    /// Database port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// TLS mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_mode: Option<String>,
    /// CA bundle for TLS verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_ca: Option<String>,
    /// Database user.
    pub username: String,
    /// Database password.
    pub password: String,
}

impl fmt::Debug for CreatePostgresCredentialInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreatePostgresCredentialInput")
            .field("name", &self.name)
            .field("db_name", &self.db_name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Partial update for a `PostgreSQL` credential.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UpdatePostgresCredentialInput {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Deployment ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_ids: Option<Vec<String>>,
    /// Database name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    /// Database host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Database port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// TLS mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_mode: Option<String>,
    /// CA bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_ca: Option<String>,
    /// Database user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Database password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl fmt::Debug for UpdatePostgresCredentialInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdatePostgresCredentialInput")
            .field("name", &self.name)
            .field("db_name", &self.db_name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password_changed", &self.password.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deployment_round_trip_keeps_server_fields() {
        let raw = json!({
            "id": "dep-1",
            "name": "prod",
            "env_type": "k8s",
            "status": "active",
            "kind": "k8s",
            "created_at": "2025-01-02T03:04:05Z"
        });
        let deployment: Deployment = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&deployment).unwrap(), raw);
    }

    #[test]
    fn update_input_omits_unset_fields() {
        let input = UpdateDeploymentInput {
            description: Some("moved".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({"description": "moved"})
        );
    }

    #[test]
    fn credentials_response_flattens_deployment() {
        let creds: DeploymentCredentials = serde_json::from_value(json!({
            "id": "dep-1",
            "name": "prod",
            "env_type": "k8s",
            "token": "agent-token",
            "password": "pw",
            "image_pull_secret": "pull"
        }))
        .unwrap();
        assert_eq!(creds.deployment.id.as_deref(), Some("dep-1"));
        assert_eq!(creds.token, "agent-token");
        assert!(!format!("{creds:?}").contains("agent-token"));
    }

    #[test]
    fn attestation_criterion_wire_names() {
        let criterion = AttestationCriterion {
            criterion_type: AttestationCriterionType::K8sPodLabel,
            key: Some("app".into()),
            value: "api".into(),
        };
        assert_eq!(
            serde_json::to_value(&criterion).unwrap(),
            json!({"type": "k8s:pod-label", "key": "app", "value": "api"})
        );
    }

    #[test]
    fn unknown_credential_type_is_tolerated() {
        let cred: AccessCredential = serde_json::from_value(json!({
            "id": "c-1",
            "name": "vault",
            "type": "hashicorp_vault"
        }))
        .unwrap();
        assert_eq!(cred.credential_type, AccessCredentialType::Unknown);
    }

    #[test]
    fn postgres_status_fields_default_to_empty() {
        let cred: PostgresAccessCredential = serde_json::from_value(json!({
            "id": "pg-1",
            "name": "orders",
            "type": "postgres"
        }))
        .unwrap();
        assert_eq!(cred.status_fields(), ("", ""));
    }

    #[test]
    fn secrets_are_not_in_debug_output() {
        let input = CreatePostgresCredentialInput {
            name: "orders".into(),
            description: None,
            deployment_ids: vec!["dep-1".into()],
            db_name: "orders".into(),
            host: "db.internal".into(),
            port: Some(5432),
            ssl_mode: None,
            ssl_ca: None,
            username: "app".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{input:?}").contains("hunter2"));
    }
}
