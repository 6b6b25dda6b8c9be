//! Error types for the OpenStack API layer.

use thiserror::Error;

/// Kinds of remote resources a lookup can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Cluster,
    ClusterTemplate,
    Stack,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Cluster => "cluster",
            Self::ClusterTemplate => "cluster template",
            Self::Stack => "stack",
        };
        f.write_str(label)
    }
}

/// Errors produced by the session provider and the API clients.
#[derive(Debug, Error)]
pub enum Error {
    /// The cloud config asks for an auth mode the session provider
    /// cannot drive.
    #[error("unsupported auth_type `{0}`: only `password` is supported")]
    UnsupportedAuthType(String),

    /// Cloud configuration could not be resolved or parsed.
    #[error("cloud config error: {0}")]
    Config(String),

    /// Keystone rejected the credentials or returned a malformed token.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The service catalog has no endpoint matching the selection.
    #[error("no `{service}` endpoint in the service catalog (interface `{interface}`)")]
    MissingEndpoint {
        service: &'static str,
        interface: String,
    },

    /// A named remote resource does not exist.
    #[error("{kind} `{name}` not found")]
    NotFound { kind: ResourceKind, name: String },

    /// The remote API answered with a non-success status.
    #[error("{service} request failed with status {status}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Transport-level failure.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Not-found error for a named resource.
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// True when the error is a remote 404 for a named resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Keystone and Heat nest the message under `error.message`, Magnum under
/// `errors[0].detail`; older services use a bare `faultstring`. Falls back
/// to the raw body.
pub(crate) async fn error_message(response: reqwest::Response) -> String {
    let raw = response.text().await.unwrap_or_default();
    if raw.is_empty() {
        return "no response body".to_string();
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) {
        let probes = [
            value.pointer("/error/message"),
            value.pointer("/errors/0/detail"),
            value.get("faultstring"),
        ];
        for probe in probes.into_iter().flatten() {
            if let Some(message) = probe.as_str() {
                return message.to_string();
            }
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found(ResourceKind::ClusterTemplate, "k8s-calico");
        assert_eq!(err.to_string(), "cluster template `k8s-calico` not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_api_error_is_not_not_found() {
        let err = Error::Api {
            service: "magnum",
            status: 503,
            message: "maintenance".to_string(),
        };
        assert!(!err.is_not_found());
    }
}
