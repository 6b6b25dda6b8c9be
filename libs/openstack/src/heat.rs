//! Typed client for the Heat (orchestration) API. Read-only.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::X_AUTH_TOKEN;
use crate::error::{error_message, Error, ResourceKind};

const SERVICE: &str = "heat";

/// One link attached to a stack resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub href: String,
    pub rel: String,
}

/// A resource belonging to a stack, normalized from the Heat wire shape.
///
/// `id` mirrors the physical resource identifier; for nested stacks it is
/// the identifier a further resource listing accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackResource {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    pub resource_type: String,
    pub status: String,
    #[serde(default)]
    pub status_reason: Option<String>,
    #[serde(default)]
    pub links: Vec<ResourceLink>,
    #[serde(default)]
    pub required_by: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Raw Heat representation, before field renaming.
#[derive(Debug, Deserialize)]
struct RawResource {
    resource_name: String,
    logical_resource_id: String,
    #[serde(default)]
    physical_resource_id: Option<String>,
    resource_type: String,
    resource_status: String,
    #[serde(default)]
    resource_status_reason: Option<String>,
    #[serde(default)]
    links: Vec<ResourceLink>,
    #[serde(default)]
    required_by: Vec<String>,
    #[serde(default)]
    creation_time: Option<String>,
    #[serde(default)]
    updated_time: Option<String>,
}

impl From<RawResource> for StackResource {
    fn from(raw: RawResource) -> Self {
        Self {
            id: raw.physical_resource_id.clone(),
            name: raw.resource_name,
            logical_resource_id: raw.logical_resource_id,
            physical_resource_id: raw.physical_resource_id,
            resource_type: raw.resource_type,
            status: raw.resource_status,
            status_reason: raw.resource_status_reason,
            links: raw.links,
            required_by: raw.required_by,
            created_at: raw.creation_time,
            updated_at: raw.updated_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResourceListResponse {
    resources: Vec<RawResource>,
}

/// Typed accessor over the Heat resource-listing API.
#[derive(Debug, Clone)]
pub struct HeatClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HeatClient {
    /// Client for a catalog endpoint. Heat catalog URLs already carry the
    /// version and tenant path.
    pub fn new(http: reqwest::Client, endpoint: &str, token: &str) -> Self {
        Self {
            http,
            base_url: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// List resources belonging to a stack, in server listing order.
    ///
    /// `nested_depth` is passed through to the server and flattens that
    /// many levels of nested stacks into the response; `None` lists the
    /// immediate resources only.
    pub async fn list_resources(
        &self,
        stack: &str,
        nested_depth: Option<u32>,
    ) -> Result<Vec<StackResource>, Error> {
        debug!(stack = %stack, nested_depth = ?nested_depth, "listing stack resources");
        let mut request = self
            .http
            .get(self.url(&format!("/stacks/{stack}/resources")))
            .header(X_AUTH_TOKEN, &self.token);
        if let Some(depth) = nested_depth {
            request = request.query(&[("nested_depth", depth)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::not_found(ResourceKind::Stack, stack));
        }
        if !status.is_success() {
            return Err(Error::Api {
                service: SERVICE,
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        let body: ResourceListResponse = response.json().await?;
        Ok(body.resources.into_iter().map(StackResource::from).collect())
    }
}
