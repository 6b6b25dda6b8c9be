//! Keystone v3 password authentication and the service catalog.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::CloudConfig;
use crate::error::{error_message, Error};
use crate::heat::HeatClient;
use crate::magnum::MagnumClient;

/// Catalog service type for Magnum.
pub const CONTAINER_INFRA: &str = "container-infra";

/// Catalog service type for Heat.
pub const ORCHESTRATION: &str = "orchestration";

/// Header carrying the issued token on the auth response and on every
/// subsequent service request.
pub(crate) const X_AUTH_TOKEN: &str = "X-Auth-Token";

const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An authenticated Keystone session.
///
/// Holds the issued token and the service catalog, and hands out typed
/// service clients with the token installed. Tokens are not refreshed;
/// a session is meant to live for one batch invocation.
#[derive(Debug, Clone)]
pub struct Session {
    http: reqwest::Client,
    token: String,
    catalog: Vec<CatalogEntry>,
    interface: String,
    region: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogEndpoint {
    interface: String,
    #[serde(default)]
    region: Option<String>,
    url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Authenticate against Keystone with the password method.
    ///
    /// Fails fast on a non-password `auth_type` without touching the
    /// network. Keystone's own rejection is passed through verbatim.
    pub async fn authenticate(config: &CloudConfig) -> Result<Self, Error> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let url = tokens_url(&config.auth.auth_url);
        debug!(url = %url, username = %config.auth.username, "requesting keystone token");

        let response = http
            .post(&url)
            .json(&auth_payload(config))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(Error::AuthFailed(format!(
                "keystone returned {status}: {message}"
            )));
        }

        let token = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| {
                Error::AuthFailed("keystone response carried no X-Subject-Token header".to_string())
            })?;
        let body: TokenResponse = response.json().await?;

        info!(
            services = body.token.catalog.len(),
            interface = %config.interface,
            "authenticated against keystone"
        );
        Ok(Self {
            http,
            token,
            catalog: body.token.catalog,
            interface: config.interface.clone(),
            region: config.region_name.clone(),
            expires_at: body.token.expires_at,
        })
    }

    /// Select a catalog endpoint URL by service type.
    ///
    /// The configured interface must match; the configured region must
    /// match when one is set.
    pub fn endpoint(&self, service_type: &'static str) -> Result<String, Error> {
        self.catalog
            .iter()
            .filter(|entry| entry.service_type == service_type)
            .flat_map(|entry| entry.endpoints.iter())
            .find(|ep| {
                ep.interface == self.interface
                    && self
                        .region
                        .as_deref()
                        .is_none_or(|r| ep.region.as_deref() == Some(r))
            })
            .map(|ep| ep.url.trim_end_matches('/').to_string())
            .ok_or(Error::MissingEndpoint {
                service: service_type,
                interface: self.interface.clone(),
            })
    }

    /// Typed client for the Magnum API.
    pub fn magnum(&self) -> Result<MagnumClient, Error> {
        let endpoint = self.endpoint(CONTAINER_INFRA)?;
        Ok(MagnumClient::new(self.http.clone(), &endpoint, &self.token))
    }

    /// Typed client for the Heat API.
    pub fn heat(&self) -> Result<HeatClient, Error> {
        let endpoint = self.endpoint(ORCHESTRATION)?;
        Ok(HeatClient::new(self.http.clone(), &endpoint, &self.token))
    }

    /// The raw token, for callers composing their own requests.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Token expiry reported by Keystone, when present.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

/// Token issue URL for an auth endpoint, appending `/v3` when the
/// configured URL stops at the host.
fn tokens_url(auth_url: &str) -> String {
    let trimmed = auth_url.trim_end_matches('/');
    if trimmed.ends_with("/v3") {
        format!("{trimmed}/auth/tokens")
    } else {
        format!("{trimmed}/v3/auth/tokens")
    }
}

/// Scoped (or unscoped, without a project) password auth request body.
fn auth_payload(config: &CloudConfig) -> serde_json::Value {
    let mut auth = json!({
        "identity": {
            "methods": ["password"],
            "password": {
                "user": {
                    "name": config.auth.username,
                    "domain": {"name": config.auth.user_domain_name},
                    "password": config.auth.password,
                }
            }
        }
    });
    if let Some(project) = &config.auth.project_name {
        auth["scope"] = json!({
            "project": {
                "name": project,
                "domain": {"name": config.auth.project_domain_name},
            }
        });
    }
    json!({ "auth": auth })
}
