//! Category rule inspection commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use archive_cache::CacheManager;
use archive_core::config::AppConfig;
use archive_core::error::AppError;
use archive_engine::AncestryEngine;
use archive_entity::category::CategorySlug;
use archive_store::{MemoryResourceStore, StaticOptionResolver, StaticTypeRegistry};

use crate::output::{self, OutputFormat};

/// Arguments for category commands
#[derive(Debug, Args)]
pub struct CategoryArgs {
    /// Category subcommand
    #[command(subcommand)]
    pub command: CategoryCommand,
}

/// Category subcommands
#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    /// List configured categories
    List,
    /// Check whether one category may nest under another
    Check {
        /// Child category slug
        child: String,
        /// Candidate parent category slug
        parent: String,
    },
}

/// Category display row
#[derive(Debug, Serialize, Tabled)]
struct CategoryRow {
    /// Slug
    slug: String,
    /// Nests under itself
    hierarchical: bool,
    /// Accepted parent categories
    allowed_parents: String,
}

/// Execute category commands
///
/// Only the registry tables are consulted, so no database connection is made.
pub async fn execute(
    args: &CategoryArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        CategoryCommand::List => {
            let rows: Vec<CategoryRow> = config
                .registry
                .categories
                .iter()
                .map(|c| CategoryRow {
                    slug: c.slug.clone(),
                    hierarchical: c.hierarchical,
                    allowed_parents: c.allowed_parents.join(", "),
                })
                .collect();
            output::print_list(&rows, format);
        }
        CategoryCommand::Check { child, parent } => {
            let engine = AncestryEngine::new(
                Arc::new(MemoryResourceStore::new()),
                Arc::new(StaticTypeRegistry::from_config(&config.registry)),
                Arc::new(StaticOptionResolver::from_config(&config.registry)),
                Arc::new(CacheManager::disabled()),
                config.ancestry.clone(),
            );
            let allowed = engine
                .is_compatible_parent_category(
                    &CategorySlug::new(child.as_str()),
                    &CategorySlug::new(parent.as_str()),
                )
                .await?;
            if allowed {
                output::print_success(&format!("'{child}' may be placed under '{parent}'"));
            } else {
                output::print_warning(&format!("'{child}' may not be placed under '{parent}'"));
            }
        }
    }

    Ok(())
}
