//! Fatal reconciliation outcomes.

use std::time::Duration;

use thiserror::Error;

/// Errors aborting a reconciliation call.
///
/// Transient remote states never surface here: an in-progress operation or
/// a just-created cluster that is not yet visible drives the wait loop
/// instead, until the budget runs out.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The requested template does not exist; no cluster action was taken.
    #[error("cluster template `{name}` could not be resolved: {source}")]
    TemplateNotFound {
        name: String,
        #[source]
        source: coe_openstack::Error,
    },

    /// The existing cluster was built from a different template. Magnum
    /// cannot change a cluster's template in place.
    #[error(
        "cluster `{cluster}` uses template `{observed}` but `{desired}` was requested; \
         templates cannot be changed in place"
    )]
    TemplateMismatch {
        cluster: String,
        desired: String,
        observed: String,
    },

    /// The remote operation failed; detail is passed through verbatim.
    #[error("cluster `{cluster}` is in {status}: {detail}")]
    Failed {
        cluster: String,
        status: String,
        detail: String,
    },

    /// The wait budget ran out before the cluster reached a stable state.
    #[error(
        "timed out waiting for cluster `{cluster}` after {attempts} polls over {elapsed:?} \
         (last status: {last_status})"
    )]
    Timeout {
        cluster: String,
        attempts: u32,
        elapsed: Duration,
        last_status: String,
    },

    /// A status string outside the known vocabulary. Guessing at its
    /// meaning could mutate a cluster in an unexpected state, so the call
    /// aborts instead.
    #[error("cluster `{cluster}` reports unrecognized status `{status}`")]
    UnexpectedStatus { cluster: String, status: String },

    /// Gateway or transport failure.
    #[error(transparent)]
    Api(#[from] coe_openstack::Error),
}
