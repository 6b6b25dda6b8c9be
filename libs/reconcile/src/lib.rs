//! # coe-reconcile
//!
//! Reconciliation engine for Magnum container infrastructure. One call
//! drives one cluster from whatever state the control plane reports
//! toward the caller's desired state, then reports whether anything had
//! to change.
//!
//! ## Design principles
//!
//! - **Fresh observation**: every poll re-fetches the cluster; nothing is
//!   cached across decisions
//! - **One operation in flight**: a new create, patch, or delete is only
//!   issued from a stable observation, never on top of a running one
//! - **Bounded waiting**: the budget is checked exactly where the loop
//!   would otherwise sleep, and a timeout carries the last observed
//!   status for diagnosis
//! - **Tagged outcomes**: transient conditions drive the loop; only
//!   terminal outcomes surface, as [`Reconciliation`] or
//!   [`ReconcileError`]
//!
//! The crate also carries the client-side stack walker ([`walk`]) used to
//! inventory the Heat resource tree behind a cluster.

mod api;
mod clock;
mod engine;
mod error;
mod patch;
mod status;
mod walker;

pub use api::{ClusterApi, ResourceLister};
pub use clock::{Clock, SystemClock};
pub use engine::{
    ClusterSpec, DesiredState, Reconciler, Reconciliation, WaitBudget, DEFAULT_MAX_ELAPSED,
    DEFAULT_POLL_INTERVAL,
};
pub use error::ReconcileError;
pub use patch::{diff, MASTER_COUNT_PATH, NODE_COUNT_PATH};
pub use status::StatusClass;
pub use walker::{walk, ResourceFilter};
