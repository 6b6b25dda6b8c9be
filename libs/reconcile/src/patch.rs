//! Diff computation between desired and observed cluster attributes.

use coe_openstack::{Cluster, PatchOp};

use crate::engine::ClusterSpec;

/// Patch path for the master node count.
pub const MASTER_COUNT_PATH: &str = "/master_count";

/// Patch path for the worker node count.
pub const NODE_COUNT_PATH: &str = "/node_count";

/// Compute the patch list turning `observed` into `spec`.
///
/// One `replace` op per mismatched field, master count first. An empty
/// list means the cluster already matches and no update call should be
/// issued.
pub fn diff(spec: &ClusterSpec, observed: &Cluster) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    if spec.master_count != observed.master_count {
        ops.push(PatchOp::replace(MASTER_COUNT_PATH, spec.master_count));
    }
    if spec.node_count != observed.node_count {
        ops.push(PatchOp::replace(NODE_COUNT_PATH, spec.node_count));
    }
    ops
}
