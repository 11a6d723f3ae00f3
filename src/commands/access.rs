//! Access-right resolution commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use archive_core::error::AppError;
use archive_core::types::{AccessRightId, FileRecordId, ResourceId};
use archive_engine::{AncestryEngine, RequestContext};
use archive_entity::access::{AccessSource, EffectiveAccessRight};

use crate::output::{self, OutputFormat};

/// Arguments for access commands
#[derive(Debug, Args)]
pub struct AccessArgs {
    /// Access subcommand
    #[command(subcommand)]
    pub command: AccessCommand,
}

/// Access subcommands
#[derive(Debug, Subcommand)]
pub enum AccessCommand {
    /// Resolve the effective access right of a resource
    Show {
        /// Resource ID
        id: ResourceId,
    },
    /// Resolve the effective access right of a file record
    File {
        /// File record ID
        id: FileRecordId,
    },
    /// Set or clear a resource's own access right
    Set {
        /// Resource ID
        id: ResourceId,
        /// Access-right option
        #[arg(short, long, conflicts_with = "clear")]
        right: Option<AccessRightId>,
        /// Remove the explicit right so it is inherited again
        #[arg(long)]
        clear: bool,
    },
}

/// Effective access display row
#[derive(Debug, Serialize, Tabled)]
struct AccessRow {
    /// Option ID
    right: String,
    /// Display term
    term: String,
    /// Where it was declared
    source: String,
}

impl AccessRow {
    fn from_effective(effective: &EffectiveAccessRight) -> Self {
        let source = match &effective.source {
            AccessSource::Own => "own".to_string(),
            AccessSource::Inherited { from, depth } => format!("{from} (depth {depth})"),
        };
        Self {
            right: effective.right.id.to_string(),
            term: effective.right.term.clone(),
            source,
        }
    }
}

fn print_effective(effective: Option<EffectiveAccessRight>, format: OutputFormat) {
    match effective {
        Some(effective) => output::print_list(&[AccessRow::from_effective(&effective)], format),
        None => match format {
            OutputFormat::Json => println!("null"),
            OutputFormat::Table => println!("Public (no access right declared on the path)."),
        },
    }
}

/// Execute access commands
pub async fn execute(
    args: &AccessArgs,
    engine: &AncestryEngine,
    ctx: &RequestContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        AccessCommand::Show { id } => {
            print_effective(engine.resolve_effective_access(*id).await?, format);
        }
        AccessCommand::File { id } => {
            print_effective(engine.resolve_file_effective_access(*id).await?, format);
        }
        AccessCommand::Set { id, right, clear } => {
            if right.is_none() && !clear {
                return Err(AppError::validation("Pass --right <ID> or --clear"));
            }
            engine.set_access_right(ctx, *id, *right).await?;
            match right {
                Some(right) => output::print_success(&format!("Resource {id} now declares {right}")),
                None => output::print_success(&format!("Resource {id} now inherits its access right")),
            }
        }
    }

    Ok(())
}
