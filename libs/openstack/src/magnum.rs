//! Typed client for the Magnum (container-infra) API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::auth::X_AUTH_TOKEN;
use crate::error::{error_message, Error, ResourceKind};

const SERVICE: &str = "magnum";

/// Observed state of a Magnum cluster.
///
/// Fetched fresh on every poll; never cached across decisions. Unknown
/// wire fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub uuid: String,
    pub name: String,
    pub cluster_template_id: String,
    pub master_count: u32,
    pub node_count: u32,
    /// Raw status string, e.g. `CREATE_IN_PROGRESS` or `UPDATE_FAILED`.
    pub status: String,
    #[serde(default)]
    pub status_reason: Option<String>,
    /// Per-component fault details reported on failed clusters.
    #[serde(default)]
    pub faults: BTreeMap<String, String>,
    /// Identifier of the Heat stack backing the cluster.
    #[serde(default)]
    pub stack_id: Option<String>,
    #[serde(default)]
    pub keypair: Option<String>,
    #[serde(default)]
    pub health_status: Option<String>,
}

impl Cluster {
    /// Human-readable fault detail for a failed cluster: the per-component
    /// faults when present, the status reason otherwise.
    pub fn fault_detail(&self) -> String {
        if !self.faults.is_empty() {
            self.faults
                .iter()
                .map(|(component, fault)| format!("{component}: {fault}"))
                .collect::<Vec<_>>()
                .join("; ")
        } else {
            self.status_reason
                .clone()
                .unwrap_or_else(|| "no fault detail reported".to_string())
        }
    }
}

/// A Magnum cluster template, looked up by name or UUID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterTemplate {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub coe: Option<String>,
    #[serde(default)]
    pub keypair_id: Option<String>,
}

/// Request body for cluster creation.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterCreate {
    pub name: String,
    pub cluster_template_id: String,
    pub master_count: u32,
    pub node_count: u32,
    pub keypair: String,
}

/// A single field-level correction submitted through the update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOp {
    pub op: String,
    pub path: String,
    pub value: Value,
}

impl PatchOp {
    /// Replace the value at `path`.
    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: "replace".to_string(),
            path: path.into(),
            value: value.into(),
        }
    }
}

/// Typed accessor over the Magnum API.
///
/// Operations never retry or wait internally; waiting belongs to the
/// reconciliation loop. Mutating calls are fire-and-forget: their effect
/// is observable only on a subsequent read.
#[derive(Debug, Clone)]
pub struct MagnumClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl MagnumClient {
    /// Client for a catalog endpoint. Catalog entries may or may not carry
    /// the `/v1` path segment; it is appended when missing.
    pub fn new(http: reqwest::Client, endpoint: &str, token: &str) -> Self {
        let trimmed = endpoint.trim_end_matches('/');
        let base_url = if trimmed.ends_with("/v1") {
            trimmed.to_string()
        } else {
            format!("{trimmed}/v1")
        };
        Self {
            http,
            base_url,
            token: token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success response to an error, folding 404 into
    /// [`Error::NotFound`] for the named resource.
    async fn check(
        response: reqwest::Response,
        kind: ResourceKind,
        name: &str,
    ) -> Result<reqwest::Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::not_found(kind, name));
        }
        Err(Error::Api {
            service: SERVICE,
            status: status.as_u16(),
            message: error_message(response).await,
        })
    }

    /// Fetch a cluster template by name or UUID.
    pub async fn get_template(&self, name: &str) -> Result<ClusterTemplate, Error> {
        debug!(template = %name, "fetching cluster template");
        let response = self
            .http
            .get(self.url(&format!("/clustertemplates/{name}")))
            .header(X_AUTH_TOKEN, &self.token)
            .send()
            .await?;
        let response = Self::check(response, ResourceKind::ClusterTemplate, name).await?;
        Ok(response.json().await?)
    }

    /// Resolve a template name to its stable identifier.
    pub async fn resolve_template(&self, name: &str) -> Result<String, Error> {
        Ok(self.get_template(name).await?.uuid)
    }

    /// Fetch a cluster by name or UUID.
    pub async fn get_cluster(&self, name: &str) -> Result<Cluster, Error> {
        debug!(cluster = %name, "fetching cluster");
        let response = self
            .http
            .get(self.url(&format!("/clusters/{name}")))
            .header(X_AUTH_TOKEN, &self.token)
            .send()
            .await?;
        let response = Self::check(response, ResourceKind::Cluster, name).await?;
        Ok(response.json().await?)
    }

    /// Begin asynchronous cluster provisioning.
    pub async fn create_cluster(&self, create: &ClusterCreate) -> Result<(), Error> {
        debug!(
            cluster = %create.name,
            template_id = %create.cluster_template_id,
            master_count = create.master_count,
            node_count = create.node_count,
            "submitting cluster create"
        );
        let response = self
            .http
            .post(self.url("/clusters"))
            .header(X_AUTH_TOKEN, &self.token)
            .json(create)
            .send()
            .await?;
        Self::check(response, ResourceKind::Cluster, &create.name).await?;
        Ok(())
    }

    /// Submit a batched patch list against a cluster.
    pub async fn update_cluster(&self, uuid: &str, ops: &[PatchOp]) -> Result<(), Error> {
        debug!(cluster = %uuid, ops = ops.len(), "submitting cluster patch");
        let response = self
            .http
            .patch(self.url(&format!("/clusters/{uuid}")))
            .header(X_AUTH_TOKEN, &self.token)
            .json(ops)
            .send()
            .await?;
        Self::check(response, ResourceKind::Cluster, uuid).await?;
        Ok(())
    }

    /// Begin asynchronous cluster deletion.
    pub async fn delete_cluster(&self, uuid: &str) -> Result<(), Error> {
        debug!(cluster = %uuid, "submitting cluster delete");
        let response = self
            .http
            .delete(self.url(&format!("/clusters/{uuid}")))
            .header(X_AUTH_TOKEN, &self.token)
            .send()
            .await?;
        Self::check(response, ResourceKind::Cluster, uuid).await?;
        Ok(())
    }
}
