//! The reconciliation loop.
//!
//! One call drives a single Magnum cluster toward a desired state: observe
//! a fresh snapshot, classify its status, issue at most one corrective
//! operation, and wait out asynchronous transitions under a bounded
//! budget. The call returns only in a terminal state, converged or failed.

use std::time::Duration;

use coe_openstack::{Cluster, ClusterCreate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::ClusterApi;
use crate::clock::{Clock, SystemClock};
use crate::error::ReconcileError;
use crate::patch::diff;
use crate::status::StatusClass;

/// Default pause between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default cap on total wait time.
pub const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(3600);

/// Requested terminal state for a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredState {
    /// The cluster exists with the requested attributes.
    Present,
    /// The cluster does not exist.
    Absent,
    /// Observe only; never mutate.
    Query,
}

/// Caller-declared desired state, immutable for one reconciliation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Cluster name or UUID.
    pub name: String,
    /// Template name or UUID, resolved once at the start of every call.
    pub template: String,
    pub master_count: u32,
    pub node_count: u32,
    /// Keypair for node access; only consulted at creation time.
    pub keypair: String,
    pub state: DesiredState,
}

/// Wait budget for one reconciliation call.
///
/// Checked only at the points where the loop would otherwise sleep and
/// re-poll, never mid-operation: a poll that comes back actionable is
/// acted on even if the budget expired during the preceding sleep.
#[derive(Debug, Clone)]
pub struct WaitBudget {
    /// Pause between polls.
    pub poll_interval: Duration,
    /// Cap on total wall-clock wait; `None` disables the elapsed check.
    pub max_elapsed: Option<Duration>,
    /// Cap on poll count; `None` disables the attempt check.
    pub max_polls: Option<u32>,
}

impl Default for WaitBudget {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_elapsed: Some(DEFAULT_MAX_ELAPSED),
            max_polls: None,
        }
    }
}

impl WaitBudget {
    /// True once either cap is exceeded.
    fn exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        if let Some(max) = self.max_elapsed {
            if elapsed > max {
                return true;
            }
        }
        if let Some(max) = self.max_polls {
            if attempts >= max {
                return true;
            }
        }
        false
    }
}

/// Terminal result of a converged reconciliation call.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    /// True iff at least one create, patch, or delete was issued.
    pub changed: bool,
    /// Final snapshot; `None` marks a converged-absent cluster.
    pub cluster: Option<Cluster>,
}

/// Outcome of one poll iteration.
enum Step {
    /// The cluster converged, or its absence was confirmed.
    Converged(Option<Cluster>),
    /// Re-poll after the budget-checked sleep; the reason feeds the logs.
    Wait(String),
}

/// Mutable bookkeeping for one reconciliation call.
#[derive(Debug, Default)]
struct LoopState {
    changed: bool,
    attempts: u32,
    /// Set after a create is submitted, cleared on the next successful
    /// observation. While set, a not-found poll means the control plane
    /// has not exposed the cluster yet, not that creation is needed.
    awaiting_create: bool,
    last_status: Option<String>,
}

impl LoopState {
    fn last_status_label(&self) -> String {
        self.last_status
            .clone()
            .unwrap_or_else(|| "not yet visible".to_string())
    }
}

/// Drives one cluster toward its desired state.
///
/// Holds no state between calls: every poll re-fetches a fresh snapshot.
/// Concurrent calls against the same cluster name from independent
/// processes can race; the control plane serializes at most one active
/// operation per cluster and the last accepted mutation wins.
pub struct Reconciler<A, C = SystemClock> {
    api: A,
    clock: C,
    budget: WaitBudget,
}

impl<A: ClusterApi> Reconciler<A> {
    /// Engine over the wall clock.
    pub fn new(api: A, budget: WaitBudget) -> Self {
        Self {
            api,
            clock: SystemClock,
            budget,
        }
    }
}

impl<A: ClusterApi, C: Clock> Reconciler<A, C> {
    /// Engine over an injected clock.
    pub fn with_clock(api: A, budget: WaitBudget, clock: C) -> Self {
        Self { api, clock, budget }
    }

    /// Converge the cluster named by `spec` to its desired state.
    ///
    /// Returns the terminal result, or the single fatal error that aborted
    /// the call. An operation left in flight on abort is not cancelled;
    /// only observation stops.
    pub async fn reconcile(&self, spec: &ClusterSpec) -> Result<Reconciliation, ReconcileError> {
        let template_id = self
            .api
            .resolve_template(&spec.template)
            .await
            .map_err(|source| {
                if source.is_not_found() {
                    ReconcileError::TemplateNotFound {
                        name: spec.template.clone(),
                        source,
                    }
                } else {
                    ReconcileError::Api(source)
                }
            })?;
        debug!(template = %spec.template, template_id = %template_id, "resolved cluster template");

        let started = self.clock.now();
        let mut state = LoopState::default();

        loop {
            match self.step(spec, &template_id, &mut state).await? {
                Step::Converged(cluster) => {
                    info!(
                        cluster = %spec.name,
                        changed = state.changed,
                        attempts = state.attempts,
                        "reconciliation converged"
                    );
                    return Ok(Reconciliation {
                        changed: state.changed,
                        cluster,
                    });
                }
                Step::Wait(reason) => {
                    let elapsed = self.clock.now().duration_since(started);
                    if self.budget.exhausted(state.attempts, elapsed) {
                        warn!(
                            cluster = %spec.name,
                            attempts = state.attempts,
                            ?elapsed,
                            "wait budget exhausted"
                        );
                        return Err(ReconcileError::Timeout {
                            cluster: spec.name.clone(),
                            attempts: state.attempts,
                            elapsed,
                            last_status: state.last_status_label(),
                        });
                    }
                    debug!(
                        cluster = %spec.name,
                        reason = %reason,
                        attempts = state.attempts,
                        elapsed_secs = elapsed.as_secs(),
                        "waiting for cluster transition"
                    );
                    self.clock.sleep(self.budget.poll_interval).await;
                    state.attempts += 1;
                }
            }
        }
    }

    /// One poll iteration: observe, classify, act.
    async fn step(
        &self,
        spec: &ClusterSpec,
        template_id: &str,
        state: &mut LoopState,
    ) -> Result<Step, ReconcileError> {
        let observed = match self.api.get_cluster(&spec.name).await {
            Ok(cluster) => cluster,
            Err(err) if err.is_not_found() => {
                return self.on_absent(spec, template_id, state).await;
            }
            Err(err) => return Err(err.into()),
        };
        state.awaiting_create = false;
        state.last_status = Some(observed.status.clone());

        match StatusClass::classify(&observed.status) {
            StatusClass::Failed => Err(ReconcileError::Failed {
                cluster: spec.name.clone(),
                status: observed.status.clone(),
                detail: observed.fault_detail(),
            }),
            StatusClass::InProgress => Ok(Step::Wait(format!("status {}", observed.status))),
            StatusClass::Complete => self.on_complete(spec, template_id, observed, state).await,
            StatusClass::Unknown => Err(ReconcileError::UnexpectedStatus {
                cluster: spec.name.clone(),
                status: observed.status,
            }),
        }
    }

    /// The cluster is not observable remotely.
    async fn on_absent(
        &self,
        spec: &ClusterSpec,
        template_id: &str,
        state: &mut LoopState,
    ) -> Result<Step, ReconcileError> {
        match spec.state {
            DesiredState::Present => {
                if state.awaiting_create {
                    return Ok(Step::Wait("created cluster not yet visible".to_string()));
                }
                let create = ClusterCreate {
                    name: spec.name.clone(),
                    cluster_template_id: template_id.to_string(),
                    master_count: spec.master_count,
                    node_count: spec.node_count,
                    keypair: spec.keypair.clone(),
                };
                info!(
                    cluster = %spec.name,
                    template_id = %template_id,
                    master_count = spec.master_count,
                    node_count = spec.node_count,
                    "creating cluster"
                );
                self.api.create_cluster(&create).await?;
                state.changed = true;
                state.awaiting_create = true;
                Ok(Step::Wait("cluster create submitted".to_string()))
            }
            DesiredState::Absent | DesiredState::Query => Ok(Step::Converged(None)),
        }
    }

    /// The cluster is stable; decide between patch, delete, and done.
    async fn on_complete(
        &self,
        spec: &ClusterSpec,
        template_id: &str,
        observed: Cluster,
        state: &mut LoopState,
    ) -> Result<Step, ReconcileError> {
        match spec.state {
            DesiredState::Query => {
                if !diff(spec, &observed).is_empty() {
                    info!(
                        cluster = %spec.name,
                        "cluster attributes differ from the requested values; query takes no action"
                    );
                }
                Ok(Step::Converged(Some(observed)))
            }
            DesiredState::Present => {
                check_template(spec, template_id, &observed)?;
                let ops = diff(spec, &observed);
                if ops.is_empty() {
                    return Ok(Step::Converged(Some(observed)));
                }
                info!(cluster = %spec.name, ops = ops.len(), "patching cluster");
                self.api.update_cluster(&observed.uuid, &ops).await?;
                state.changed = true;
                Ok(Step::Wait(format!("patch of {} field(s) submitted", ops.len())))
            }
            DesiredState::Absent => {
                check_template(spec, template_id, &observed)?;
                info!(cluster = %spec.name, uuid = %observed.uuid, "deleting cluster");
                self.api.delete_cluster(&observed.uuid).await?;
                state.changed = true;
                Ok(Step::Wait("cluster delete submitted".to_string()))
            }
        }
    }
}

/// A cluster cannot move between templates in place; a mismatch is a
/// configuration error, never a diffable attribute.
fn check_template(
    spec: &ClusterSpec,
    template_id: &str,
    observed: &Cluster,
) -> Result<(), ReconcileError> {
    if observed.cluster_template_id != template_id {
        return Err(ReconcileError::TemplateMismatch {
            cluster: spec.name.clone(),
            desired: template_id.to_string(),
            observed: observed.cluster_template_id.clone(),
        });
    }
    Ok(())
}
