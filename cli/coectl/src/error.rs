//! Error handling and display for the CLI.

use coe_openstack::Error as OpenStackError;
use coe_reconcile::ReconcileError;
use colored::Colorize;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    OpenStack(#[from] OpenStackError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    // Check for specific error types and provide hints
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        match cli_err {
            CliError::OpenStack(OpenStackError::Config(_)) => {
                eprintln!(
                    "\n{}",
                    "Hint: Pass --os-cloud for a cloud defined in clouds.yaml, or export \
                     OS_AUTH_URL, OS_USERNAME and OS_PASSWORD."
                        .yellow()
                );
            }
            CliError::OpenStack(OpenStackError::UnsupportedAuthType(_)) => {
                eprintln!(
                    "\n{}",
                    "Hint: Only password authentication is supported. Set `auth_type: password` \
                     for this cloud."
                        .yellow()
                );
            }
            CliError::OpenStack(OpenStackError::AuthFailed(_)) => {
                eprintln!(
                    "\n{}",
                    "Hint: Check the credentials for the selected cloud.".yellow()
                );
            }
            CliError::OpenStack(OpenStackError::Http(_)) => {
                eprintln!(
                    "\n{}",
                    "Hint: Check your network connection and the auth_url endpoint.".yellow()
                );
            }
            CliError::Reconcile(ReconcileError::Timeout { .. }) => {
                eprintln!(
                    "\n{}",
                    "Hint: The remote operation may still be running. Re-run to keep watching, \
                     or raise --timeout."
                        .yellow()
                );
            }
            CliError::Reconcile(ReconcileError::TemplateMismatch { .. }) => {
                eprintln!(
                    "\n{}",
                    "Hint: A cluster cannot move between templates. Delete it and apply again \
                     with the new template."
                        .yellow()
                );
            }
            _ => {}
        }
    }
}
