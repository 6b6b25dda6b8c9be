//! # coe-openstack
//!
//! Thin typed access to the OpenStack APIs the reconciler consumes:
//!
//! - Keystone v3 password authentication and service-catalog endpoint
//!   selection ([`Session`])
//! - the Magnum container-infra cluster gateway ([`MagnumClient`])
//! - Heat stack resource listing ([`HeatClient`])
//!
//! ## Design principles
//!
//! - **Wire fidelity**: types mirror the remote payloads; unknown fields
//!   are ignored
//! - **No hidden retries**: operations fail on the first error; waiting
//!   and re-polling belong to the reconciliation loop
//! - **Fire-and-forget mutations**: create, patch, and delete return as
//!   soon as the control plane accepts them; their effect is observable
//!   only on a subsequent read

mod auth;
mod config;
mod error;
mod heat;
mod magnum;

pub use auth::{Session, CONTAINER_INFRA, ORCHESTRATION};
pub use config::{AuthInfo, CloudConfig};
pub use error::{Error, ResourceKind};
pub use heat::{HeatClient, ResourceLink, StackResource};
pub use magnum::{Cluster, ClusterCreate, ClusterTemplate, MagnumClient, PatchOp};
