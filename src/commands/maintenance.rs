//! Cascade, rebuild, and subtree deletion commands.

use std::time::Duration;

use clap::{Args, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use archive_core::error::AppError;
use archive_core::types::ResourceId;
use archive_engine::{AncestryEngine, CascadeOptions, CascadeReport, RequestContext};

use crate::output::{self, OutputFormat};

/// Arguments for maintenance commands
#[derive(Debug, Args)]
pub struct MaintenanceArgs {
    /// Maintenance subcommand
    #[command(subcommand)]
    pub command: MaintenanceCommand,
}

/// Maintenance subcommands
#[derive(Debug, Subcommand)]
pub enum MaintenanceCommand {
    /// Recompute closures below a resource
    Cascade {
        /// Root resource ID
        id: ResourceId,
        /// Override the configured timeout, in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },
    /// Recompute every closure in the store
    Rebuild,
    /// Delete a resource and everything below it
    Delete {
        /// Root resource ID
        id: ResourceId,
        /// Required to actually delete
        #[arg(long)]
        force: bool,
    },
}

fn print_cascade(report: &CascadeReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_item(report, format),
        OutputFormat::Table => {
            output::print_kv("Resources visited", &report.resources_visited.to_string());
            output::print_kv("Resources updated", &report.resources_updated.to_string());
            output::print_kv("Files visited", &report.files_visited.to_string());
            output::print_kv("Files updated", &report.files_updated.to_string());
            output::print_kv("Failed", &report.failed.to_string());
            output::print_kv("Elapsed", &format!("{} ms", report.elapsed_ms));
        }
    }
}

/// Execute maintenance commands
pub async fn execute(
    args: &MaintenanceArgs,
    engine: &AncestryEngine,
    ctx: &RequestContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        MaintenanceCommand::Cascade { id, timeout } => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, stopping cascade");
                    on_signal.cancel();
                }
            });

            let options = match timeout {
                Some(seconds) => CascadeOptions::with_timeout(Duration::from_secs(*seconds)),
                None => engine.cascade_options(),
            }
            .cancelled_by(cancel);

            let report = engine.cascade_with(ctx, *id, &options).await?;
            output::print_success(&format!("Cascade from {id} completed"));
            print_cascade(&report, format);
        }
        MaintenanceCommand::Rebuild => {
            let report = engine.rebuild_all(ctx).await?;
            if report.failed > 0 {
                output::print_warning(&format!(
                    "{} document(s) could not be resolved; see logs",
                    report.failed
                ));
            }
            print_cascade(&report, format);
        }
        MaintenanceCommand::Delete { id, force } => {
            if !force {
                let below = engine.descendants(*id).await?.len();
                output::print_warning(&format!(
                    "This would delete {id} and {below} resource(s) below it. Re-run with --force."
                ));
                return Ok(());
            }
            let report = engine.delete_subtree(ctx, *id).await?;
            output::print_success(&format!("Deleted subtree rooted at {id}"));
            match format {
                OutputFormat::Json => output::print_item(&report, format),
                OutputFormat::Table => {
                    output::print_kv("Resources deleted", &report.resources_deleted.to_string());
                    output::print_kv("Files deleted", &report.files_deleted.to_string());
                    output::print_kv("Files detached", &report.files_detached.to_string());
                }
            }
        }
    }

    Ok(())
}
