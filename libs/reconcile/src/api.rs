//! Trait seams over the remote gateways.
//!
//! The engine and walker are generic over these traits so tests can
//! substitute scripted fakes for the HTTP clients.

use async_trait::async_trait;
use coe_openstack::{Cluster, ClusterCreate, Error, HeatClient, MagnumClient, PatchOp, StackResource};

/// Cluster-gateway operations the reconciliation loop drives.
///
/// Mutating operations are fire-and-forget: they return once the control
/// plane accepts the request, and their effect is observable only through
/// a later [`get_cluster`](ClusterApi::get_cluster).
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Resolve a template name to its stable identifier.
    async fn resolve_template(&self, name: &str) -> Result<String, Error>;

    /// Fetch a fresh cluster snapshot.
    async fn get_cluster(&self, name: &str) -> Result<Cluster, Error>;

    /// Begin asynchronous provisioning.
    async fn create_cluster(&self, create: &ClusterCreate) -> Result<(), Error>;

    /// Submit a batched patch list.
    async fn update_cluster(&self, uuid: &str, ops: &[PatchOp]) -> Result<(), Error>;

    /// Begin asynchronous deletion.
    async fn delete_cluster(&self, uuid: &str) -> Result<(), Error>;
}

#[async_trait]
impl ClusterApi for MagnumClient {
    async fn resolve_template(&self, name: &str) -> Result<String, Error> {
        MagnumClient::resolve_template(self, name).await
    }

    async fn get_cluster(&self, name: &str) -> Result<Cluster, Error> {
        MagnumClient::get_cluster(self, name).await
    }

    async fn create_cluster(&self, create: &ClusterCreate) -> Result<(), Error> {
        MagnumClient::create_cluster(self, create).await
    }

    async fn update_cluster(&self, uuid: &str, ops: &[PatchOp]) -> Result<(), Error> {
        MagnumClient::update_cluster(self, uuid, ops).await
    }

    async fn delete_cluster(&self, uuid: &str) -> Result<(), Error> {
        MagnumClient::delete_cluster(self, uuid).await
    }
}

/// Read-only listing of a stack's immediate resources.
#[async_trait]
pub trait ResourceLister: Send + Sync {
    /// List the resources directly owned by `stack`, in listing order.
    async fn list_children(&self, stack: &str) -> Result<Vec<StackResource>, Error>;
}

#[async_trait]
impl ResourceLister for HeatClient {
    async fn list_children(&self, stack: &str) -> Result<Vec<StackResource>, Error> {
        self.list_resources(stack, None).await
    }
}
