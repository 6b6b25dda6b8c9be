//! CLI commands.

mod cluster;
mod stack;

use anyhow::Result;
use clap::{Parser, Subcommand};
use coe_openstack::{CloudConfig, Session};
use tracing::debug;

use crate::error::CliError;
use crate::output::OutputFormat;

/// coe CLI - Declaratively manage Magnum clusters and inspect their stacks.
#[derive(Debug, Parser)]
#[command(name = "coe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Named cloud from clouds.yaml. Falls back to OS_* environment
    /// variables when unset.
    #[arg(long = "os-cloud", global = true, env = "OS_CLOUD")]
    os_cloud: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Reconcile a cluster to a desired state.
    Cluster(cluster::ClusterCommand),

    /// Inspect the Heat stack behind a cluster.
    Stack(stack::StackCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let ctx = CommandContext {
            os_cloud: self.os_cloud,
            format: OutputFormat::parse(&self.format),
        };

        match self.command {
            Commands::Cluster(cmd) => cmd.run(ctx).await,
            Commands::Stack(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("coe {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub os_cloud: Option<String>,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Resolve cloud credentials and authenticate against Keystone.
    pub async fn session(&self) -> Result<Session> {
        debug!(
            cloud = self.os_cloud.as_deref().unwrap_or("<environment>"),
            "resolving cloud credentials"
        );
        let config = CloudConfig::resolve(self.os_cloud.as_deref()).map_err(CliError::from)?;
        let session = Session::authenticate(&config)
            .await
            .map_err(CliError::from)?;
        Ok(session)
    }
}
