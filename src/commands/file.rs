//! File record attachment commands.

use clap::{Args, Subcommand};

use archive_core::error::AppError;
use archive_core::types::{AccessRightId, FileRecordId, ResourceId};
use archive_engine::{AncestryEngine, RequestContext};
use archive_entity::file_record::NewFileRecord;

use crate::output::{self, AncestorRow, OutputFormat};

/// Arguments for file record commands
#[derive(Debug, Args)]
pub struct FileArgs {
    /// File record subcommand
    #[command(subcommand)]
    pub command: FileCommand,
}

/// File record subcommands
#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// Show a stored file record
    Show {
        /// File record ID
        id: FileRecordId,
    },
    /// Attach a new file record to resources
    Attach {
        /// Owning resource ID (repeatable)
        #[arg(short, long = "parent")]
        parents: Vec<ResourceId>,
        /// Explicit access-right option
        #[arg(short, long)]
        access_right: Option<AccessRightId>,
    },
    /// Replace a file record's owning resources
    SetParents {
        /// File record ID
        id: FileRecordId,
        /// Owning resource ID (repeatable)
        #[arg(short, long = "parent")]
        parents: Vec<ResourceId>,
    },
    /// Resolve the ancestor closure
    Ancestors {
        /// File record ID
        id: FileRecordId,
    },
}

/// Execute file record commands
pub async fn execute(
    args: &FileArgs,
    engine: &AncestryEngine,
    ctx: &RequestContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        FileCommand::Show { id } => {
            let record = engine.get_file_record(*id).await?;
            output::print_item(&record, format);
        }
        FileCommand::Attach {
            parents,
            access_right,
        } => {
            let mut new = NewFileRecord::new(super::parents_for(engine, parents).await?);
            new.access_right = *access_right;
            let record = engine.attach_file(ctx, new).await?;
            output::print_success(&format!(
                "Attached file record {} to {} resource(s)",
                record.id,
                record.direct_parents.len()
            ));
        }
        FileCommand::SetParents { id, parents } => {
            let proposed = super::parents_for(engine, parents).await?;
            let record = engine.set_file_parents(ctx, *id, proposed).await?;
            output::print_success(&format!(
                "File record {} now has {} ancestor(s)",
                record.id,
                record.ancestors.len()
            ));
        }
        FileCommand::Ancestors { id } => {
            let ancestors = engine.resolve_file_ancestors(*id).await?;
            output::print_list(&AncestorRow::from_ancestry(&ancestors), format);
        }
    }

    Ok(())
}
