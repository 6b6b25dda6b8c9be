//! Cluster reconciliation commands.

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};
use coe_openstack::Cluster;
use coe_reconcile::{ClusterSpec, DesiredState, Reconciler, WaitBudget};
use tabled::Tabled;

use crate::error::CliError;
use crate::output::{print_json, print_success, print_table, OutputFormat};

use super::CommandContext;

/// Cluster commands.
#[derive(Debug, Args)]
pub struct ClusterCommand {
    #[command(subcommand)]
    command: ClusterSubcommand,
}

#[derive(Debug, Subcommand)]
enum ClusterSubcommand {
    /// Create or resize a cluster until it matches the requested shape.
    Apply(ApplyArgs),

    /// Delete a cluster and wait until it is gone.
    Delete(DeleteArgs),

    /// Fetch a cluster's stable state without mutating it.
    Get(GetArgs),
}

#[derive(Debug, Args)]
struct ApplyArgs {
    /// Cluster name or UUID.
    name: String,

    /// Cluster template name or UUID.
    #[arg(long)]
    template: String,

    /// Number of master nodes.
    #[arg(long, default_value_t = 1)]
    masters: u32,

    /// Number of worker nodes.
    #[arg(long, default_value_t = 1)]
    nodes: u32,

    /// Keypair installed on the nodes.
    #[arg(long)]
    keypair: String,

    #[command(flatten)]
    budget: BudgetArgs,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    /// Cluster name or UUID.
    name: String,

    /// Cluster template name or UUID (verified before deleting).
    #[arg(long)]
    template: String,

    #[command(flatten)]
    budget: BudgetArgs,
}

#[derive(Debug, Args)]
struct GetArgs {
    /// Cluster name or UUID.
    name: String,

    /// Cluster template name or UUID.
    #[arg(long)]
    template: String,

    /// Expected master count, compared against the snapshot.
    #[arg(long, default_value_t = 1)]
    masters: u32,

    /// Expected worker count, compared against the snapshot.
    #[arg(long, default_value_t = 1)]
    nodes: u32,

    #[command(flatten)]
    budget: BudgetArgs,
}

/// Wait-budget flags shared by the cluster subcommands.
#[derive(Debug, Args)]
struct BudgetArgs {
    /// Overall wait budget in seconds.
    #[arg(long, default_value_t = 3600)]
    timeout: u64,

    /// Pause between polls in seconds.
    #[arg(long, default_value_t = 10)]
    poll_interval: u64,

    /// Cap on poll count (unlimited when omitted).
    #[arg(long)]
    max_polls: Option<u32>,
}

impl BudgetArgs {
    fn to_budget(&self) -> WaitBudget {
        WaitBudget {
            poll_interval: Duration::from_secs(self.poll_interval),
            max_elapsed: Some(Duration::from_secs(self.timeout)),
            max_polls: self.max_polls,
        }
    }
}

/// Table row for a cluster snapshot.
#[derive(Debug, Tabled)]
struct ClusterRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Masters")]
    masters: u32,
    #[tabled(rename = "Nodes")]
    nodes: u32,
    #[tabled(rename = "Keypair")]
    keypair: String,
    #[tabled(rename = "UUID")]
    uuid: String,
}

impl From<&Cluster> for ClusterRow {
    fn from(cluster: &Cluster) -> Self {
        Self {
            name: cluster.name.clone(),
            status: cluster.status.clone(),
            masters: cluster.master_count,
            nodes: cluster.node_count,
            keypair: cluster.keypair.clone().unwrap_or_else(|| "-".to_string()),
            uuid: cluster.uuid.clone(),
        }
    }
}

impl ClusterCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let (spec, budget) = match self.command {
            ClusterSubcommand::Apply(args) => (
                ClusterSpec {
                    name: args.name,
                    template: args.template,
                    master_count: args.masters,
                    node_count: args.nodes,
                    keypair: args.keypair,
                    state: DesiredState::Present,
                },
                args.budget.to_budget(),
            ),
            ClusterSubcommand::Delete(args) => (
                ClusterSpec {
                    name: args.name,
                    template: args.template,
                    master_count: 1,
                    node_count: 1,
                    keypair: String::new(),
                    state: DesiredState::Absent,
                },
                args.budget.to_budget(),
            ),
            ClusterSubcommand::Get(args) => (
                ClusterSpec {
                    name: args.name,
                    template: args.template,
                    master_count: args.masters,
                    node_count: args.nodes,
                    keypair: String::new(),
                    state: DesiredState::Query,
                },
                args.budget.to_budget(),
            ),
        };

        let session = ctx.session().await?;
        let magnum = session.magnum().map_err(CliError::from)?;
        let engine = Reconciler::new(magnum, budget);

        let outcome = engine.reconcile(&spec).await.map_err(CliError::from)?;

        match ctx.format {
            OutputFormat::Json => print_json(&outcome),
            OutputFormat::Table => match &outcome.cluster {
                Some(cluster) => {
                    print_success(&format!(
                        "Cluster {} is {} (changed: {})",
                        cluster.name, cluster.status, outcome.changed
                    ));
                    print_table(&[ClusterRow::from(cluster)]);
                }
                None => {
                    print_success(&format!(
                        "Cluster {} is absent (changed: {})",
                        spec.name, outcome.changed
                    ));
                }
            },
        }

        Ok(())
    }
}
