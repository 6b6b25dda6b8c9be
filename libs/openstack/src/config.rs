//! Cloud configuration resolution.
//!
//! Credentials come from a named cloud in `clouds.yaml` or from `OS_*`
//! environment variables, following the conventional OpenStack client
//! search order. Callers may also construct a [`CloudConfig`] directly.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use serde::Deserialize;
use tracing::debug;

use crate::error::Error;

/// Environment variable naming the clouds.yaml file explicitly.
const CLIENT_CONFIG_FILE_ENV: &str = "OS_CLIENT_CONFIG_FILE";

/// The only auth mode the session provider supports.
const PASSWORD_AUTH: &str = "password";

/// Credentials and endpoint selection for one cloud.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudConfig {
    #[serde(default = "default_auth_type")]
    pub auth_type: String,
    pub auth: AuthInfo,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default = "default_interface")]
    pub interface: String,
}

/// The `auth` block of a cloud entry.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthInfo {
    pub auth_url: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default = "default_domain")]
    pub user_domain_name: String,
    #[serde(default = "default_domain")]
    pub project_domain_name: String,
}

fn default_auth_type() -> String {
    PASSWORD_AUTH.to_string()
}

fn default_interface() -> String {
    "public".to_string()
}

fn default_domain() -> String {
    "Default".to_string()
}

/// Top-level clouds.yaml document.
#[derive(Debug, Deserialize)]
struct CloudsFile {
    clouds: BTreeMap<String, CloudConfig>,
}

impl CloudConfig {
    /// Resolve configuration for a named cloud, falling back to `OS_CLOUD`
    /// and then to the bare `OS_*` environment variables.
    pub fn resolve(cloud: Option<&str>) -> Result<Self, Error> {
        let selector = cloud
            .map(str::to_owned)
            .or_else(|| std::env::var("OS_CLOUD").ok());
        match selector {
            Some(name) => Self::from_clouds_yaml(&name),
            None => Self::from_env(),
        }
    }

    /// Look a named cloud up in clouds.yaml.
    pub fn from_clouds_yaml(name: &str) -> Result<Self, Error> {
        let path = clouds_yaml_path().ok_or_else(|| {
            Error::Config(
                "no clouds.yaml found (searched $OS_CLIENT_CONFIG_FILE, ./clouds.yaml, \
                 ~/.config/openstack, /etc/openstack)"
                    .to_string(),
            )
        })?;
        debug!(path = %path.display(), cloud = %name, "loading cloud config");
        let contents = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_yaml_str(&contents, name)
            .map_err(|e| Error::Config(format!("{} in {}", e, path.display())))
    }

    /// Parse a clouds.yaml document and select one cloud from it.
    fn from_yaml_str(contents: &str, name: &str) -> Result<Self, String> {
        let file: CloudsFile =
            serde_yaml::from_str(contents).map_err(|e| format!("invalid clouds.yaml: {e}"))?;
        file.clouds
            .get(name)
            .cloned()
            .ok_or_else(|| format!("cloud `{name}` is not defined"))
    }

    /// Build configuration from `OS_*` environment variables.
    pub fn from_env() -> Result<Self, Error> {
        let require = |var: &'static str| {
            std::env::var(var).map_err(|_| Error::Config(format!("{var} is not set")))
        };
        Ok(Self {
            auth_type: std::env::var("OS_AUTH_TYPE").unwrap_or_else(|_| default_auth_type()),
            auth: AuthInfo {
                auth_url: require("OS_AUTH_URL")?,
                username: require("OS_USERNAME")?,
                password: require("OS_PASSWORD")?,
                project_name: std::env::var("OS_PROJECT_NAME").ok(),
                user_domain_name: std::env::var("OS_USER_DOMAIN_NAME")
                    .unwrap_or_else(|_| default_domain()),
                project_domain_name: std::env::var("OS_PROJECT_DOMAIN_NAME")
                    .unwrap_or_else(|_| default_domain()),
            },
            region_name: std::env::var("OS_REGION_NAME").ok(),
            interface: std::env::var("OS_INTERFACE").unwrap_or_else(|_| default_interface()),
        })
    }

    /// Reject auth modes other than password before any network traffic.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.auth_type != PASSWORD_AUTH {
            return Err(Error::UnsupportedAuthType(self.auth_type.clone()));
        }
        Ok(())
    }
}

/// Locate clouds.yaml following the conventional search order.
fn clouds_yaml_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CLIENT_CONFIG_FILE_ENV) {
        let path = PathBuf::from(explicit);
        if path.exists() {
            return Some(path);
        }
    }
    let mut candidates = vec![PathBuf::from("clouds.yaml")];
    if let Some(dirs) = BaseDirs::new() {
        candidates.push(dirs.config_dir().join("openstack").join("clouds.yaml"));
    }
    candidates.push(PathBuf::from("/etc/openstack/clouds.yaml"));
    candidates.into_iter().find(|p| p.exists())
}
