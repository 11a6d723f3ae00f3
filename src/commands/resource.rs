//! Resource structure and ancestry commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use archive_core::error::AppError;
use archive_core::types::{AccessRightId, ResourceId};
use archive_engine::{AncestryEngine, RequestContext};
use archive_entity::category::CategorySlug;
use archive_entity::resource::NewResource;

use crate::output::{self, AncestorRow, OutputFormat};

/// Arguments for resource commands
#[derive(Debug, Args)]
pub struct ResourceArgs {
    /// Resource subcommand
    #[command(subcommand)]
    pub command: ResourceCommand,
}

/// Resource subcommands
#[derive(Debug, Subcommand)]
pub enum ResourceCommand {
    /// Show a stored resource
    Show {
        /// Resource ID
        id: ResourceId,
    },
    /// Create a resource under the given parents
    Create {
        /// Category slug
        #[arg(short, long)]
        category: String,
        /// Parent resource ID (repeatable)
        #[arg(short, long = "parent")]
        parents: Vec<ResourceId>,
        /// Explicit access-right option
        #[arg(short, long)]
        access_right: Option<AccessRightId>,
    },
    /// Replace a resource's direct parents and cascade
    SetParents {
        /// Resource ID
        id: ResourceId,
        /// Parent resource ID (repeatable, omit to make a root)
        #[arg(short, long = "parent")]
        parents: Vec<ResourceId>,
    },
    /// Validate proposed parents without writing
    Validate {
        /// Category slug of the child
        #[arg(short, long)]
        category: String,
        /// Existing resource the parents are proposed for
        #[arg(short, long)]
        id: Option<ResourceId>,
        /// Parent resource ID (repeatable)
        #[arg(short, long = "parent")]
        parents: Vec<ResourceId>,
    },
    /// Resolve the ancestor closure
    Ancestors {
        /// Resource ID
        id: ResourceId,
    },
    /// List every resource below this one, breadth-first
    Descendants {
        /// Resource ID
        id: ResourceId,
    },
}

/// Resource summary row
#[derive(Debug, Serialize, Tabled)]
struct ResourceRow {
    /// Resource ID
    id: String,
    /// Category
    category: String,
    /// Direct parents
    parents: usize,
    /// Ancestors
    ancestors: usize,
    /// Attached file records
    files: usize,
    /// Status
    status: String,
}

/// Execute resource commands
pub async fn execute(
    args: &ResourceArgs,
    engine: &AncestryEngine,
    ctx: &RequestContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ResourceCommand::Show { id } => {
            let resource = engine.get_resource(*id).await?;
            output::print_item(&resource, format);
        }
        ResourceCommand::Create {
            category,
            parents,
            access_right,
        } => {
            let mut new = NewResource::new(category.as_str())
                .with_parents(super::parents_for(engine, parents).await?);
            if let Some(right) = access_right {
                new = new.with_access_right(*right);
            }
            let resource = engine.create_resource(ctx, new).await?;
            output::print_success(&format!("Created resource {}", resource.id));
            output::print_list(
                &[ResourceRow {
                    id: resource.id.to_string(),
                    category: resource.category.to_string(),
                    parents: resource.direct_parents.len(),
                    ancestors: resource.ancestors.len(),
                    files: resource.attached_files.len(),
                    status: resource.status.as_str().to_string(),
                }],
                format,
            );
        }
        ResourceCommand::SetParents { id, parents } => {
            let proposed = super::parents_for(engine, parents).await?;
            let resource = engine.set_parents(ctx, *id, proposed).await?;
            output::print_success(&format!(
                "Resource {} now has {} parent(s) and {} ancestor(s)",
                resource.id,
                resource.direct_parents.len(),
                resource.ancestors.len()
            ));
        }
        ResourceCommand::Validate {
            category,
            id,
            parents,
        } => {
            let proposed = super::parents_for(engine, parents).await?;
            let validated = engine
                .validate_parents(*id, &CategorySlug::new(category.as_str()), proposed)
                .await?;
            output::print_success("Parents are valid.");
            output::print_kv(
                "Kept parents",
                &validated.parents.len().to_string(),
            );
            for pruned in &validated.pruned {
                output::print_warning(&format!("Pruned redundant parent {pruned}"));
            }
            output::print_list(&AncestorRow::from_ancestry(&validated.ancestors), format);
        }
        ResourceCommand::Ancestors { id } => {
            let ancestors = engine.resolve_ancestors(*id).await?;
            output::print_list(&AncestorRow::from_ancestry(&ancestors), format);
        }
        ResourceCommand::Descendants { id } => {
            let ids: Vec<String> = engine
                .descendants(*id)
                .await?
                .iter()
                .map(ToString::to_string)
                .collect();
            match format {
                OutputFormat::Json => output::print_item(&ids, format),
                OutputFormat::Table => {
                    output::print_kv("Descendants", &ids.len().to_string());
                    for id in ids {
                        println!("  {id}");
                    }
                }
            }
        }
    }

    Ok(())
}
