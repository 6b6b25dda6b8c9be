//! Stack inspection commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use coe_openstack::StackResource;
use coe_reconcile::{walk, ResourceFilter};
use serde::Serialize;
use tabled::Tabled;

use crate::error::CliError;
use crate::output::{print_json, print_table, OutputFormat};

use super::CommandContext;

/// Stack commands.
#[derive(Debug, Args)]
pub struct StackCommand {
    #[command(subcommand)]
    command: StackSubcommand,
}

#[derive(Debug, Subcommand)]
enum StackSubcommand {
    /// Walk the stack's resource tree, recursing into nested stacks.
    Resources(ResourcesArgs),

    /// Flat resource listing with server-side nesting expansion.
    Facts(FactsArgs),
}

#[derive(Debug, Args)]
struct ResourcesArgs {
    /// Stack name or UUID.
    stack: String,

    /// Recursion depth below the root's immediate resources.
    #[arg(long, default_value_t = 2)]
    max_depth: u32,

    /// Resource filter in format FIELD=VALUE (e.g.
    /// resource_type=OS::Nova::Server). Can be specified multiple times;
    /// all must match.
    #[arg(long = "filter", value_name = "FIELD=VALUE")]
    filters: Vec<String>,
}

#[derive(Debug, Args)]
struct FactsArgs {
    /// Stack name or UUID.
    stack: String,

    /// Levels of nested stacks the server expands into the listing.
    #[arg(long, default_value_t = 1)]
    nested_depth: u32,

    /// Resource filter in format FIELD=VALUE. Can be specified multiple
    /// times; all must match.
    #[arg(long = "filter", value_name = "FIELD=VALUE")]
    filters: Vec<String>,
}

/// Table row for a stack resource.
#[derive(Debug, Tabled)]
struct ResourceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    resource_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Physical ID")]
    physical_id: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&StackResource> for ResourceRow {
    fn from(resource: &StackResource) -> Self {
        Self {
            name: resource.name.clone(),
            resource_type: resource.resource_type.clone(),
            status: resource.status.clone(),
            physical_id: resource
                .physical_resource_id
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            updated: resource.updated_at.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

impl StackCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            StackSubcommand::Resources(args) => {
                let filter = parse_filters(&args.filters)?;
                let session = ctx.session().await?;
                let heat = session.heat().map_err(CliError::from)?;

                let resources = walk(&heat, &args.stack, args.max_depth, &filter)
                    .await
                    .map_err(CliError::from)?;
                print_resources(&ctx, &resources);
            }
            StackSubcommand::Facts(args) => {
                let filter = parse_filters(&args.filters)?;
                let session = ctx.session().await?;
                let heat = session.heat().map_err(CliError::from)?;

                let listed = heat
                    .list_resources(&args.stack, Some(args.nested_depth))
                    .await
                    .map_err(CliError::from)?;
                let resources: Vec<StackResource> = listed
                    .into_iter()
                    .filter(|resource| filter.matches(resource))
                    .collect();
                print_resources(&ctx, &resources);
            }
        }

        Ok(())
    }
}

/// Parse repeated FIELD=VALUE flags into a filter.
fn parse_filters(raw: &[String]) -> Result<ResourceFilter> {
    let mut filter = ResourceFilter::new();
    for spec in raw {
        let Some((field_raw, value)) = spec.split_once('=') else {
            return Err(anyhow::anyhow!(
                "Invalid filter '{}'. Use format FIELD=VALUE (e.g. resource_type=OS::Nova::Server)",
                spec
            ));
        };

        let field = field_raw.trim();
        if field.is_empty() {
            return Err(anyhow::anyhow!(
                "Invalid filter '{}'. Field name cannot be empty.",
                spec
            ));
        }
        filter = filter.with(field, value);
    }
    Ok(filter)
}

fn print_resources(ctx: &CommandContext, resources: &[StackResource]) {
    match ctx.format {
        OutputFormat::Json => print_json(&ResourceReport {
            changed: false,
            resources,
        }),
        OutputFormat::Table => {
            let rows: Vec<ResourceRow> = resources.iter().map(ResourceRow::from).collect();
            print_table(&rows);
        }
    }
}

/// JSON envelope for resource listings.
#[derive(Debug, Serialize)]
struct ResourceReport<'a> {
    /// Always false; inspection never mutates.
    changed: bool,
    resources: &'a [StackResource],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource_with_type(resource_type: &str) -> StackResource {
        StackResource {
            id: Some("phys-1".to_string()),
            name: "api_server".to_string(),
            logical_resource_id: "api_server".to_string(),
            physical_resource_id: Some("phys-1".to_string()),
            resource_type: resource_type.to_string(),
            status: "CREATE_COMPLETE".to_string(),
            status_reason: None,
            links: Vec::new(),
            required_by: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_parse_filters_value_keeps_double_colons() {
        let filter = parse_filters(&["resource_type=OS::Nova::Server".to_string()]).unwrap();
        assert!(filter.matches(&resource_with_type("OS::Nova::Server")));
        assert!(!filter.matches(&resource_with_type("OS::Cinder::Volume")));
    }

    #[test]
    fn test_parse_filters_rejects_missing_separator() {
        let err = parse_filters(&["resource_type".to_string()]).unwrap_err();
        assert!(err.to_string().contains("FIELD=VALUE"));
    }

    #[test]
    fn test_parse_filters_rejects_empty_field() {
        assert!(parse_filters(&["=OS::Nova::Server".to_string()]).is_err());
    }

    #[test]
    fn test_parse_filters_empty_input_matches_all() {
        let filter = parse_filters(&[]).unwrap();
        assert!(filter.is_empty());
        assert!(filter.matches(&resource_with_type("anything")));
    }
}
