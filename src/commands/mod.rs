//! CLI command definitions and dispatch.

pub mod access;
pub mod category;
pub mod file;
pub mod maintenance;
pub mod migrate;
pub mod resource;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use archive_cache::CacheManager;
use archive_core::config::AppConfig;
use archive_core::error::AppError;
use archive_core::types::{ResourceId, UserId};
use archive_engine::{AncestryEngine, RequestContext};
use archive_entity::ancestry::{DirectParent, DirectParents};
use archive_store::postgres::{DatabasePool, PgResourceStore};
use archive_store::{StaticOptionResolver, StaticTypeRegistry};

use crate::output::OutputFormat;

/// Archive ancestry and access-right maintenance tool
#[derive(Debug, Parser)]
#[command(name = "archivectl", version, about, long_about = None)]
pub struct Cli {
    /// Base configuration file
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay loaded from `config/{env}`
    #[arg(short, long, env = "ARCHIVE_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Acting user recorded in logs and events (defaults to the system actor)
    #[arg(long)]
    pub user: Option<UserId>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Resource structure and ancestry
    Resource(resource::ResourceArgs),
    /// File record attachment and ancestry
    File(file::FileArgs),
    /// Access-right resolution and assignment
    Access(access::AccessArgs),
    /// Category rules
    Category(category::CategoryArgs),
    /// Cascades, rebuilds, and subtree deletion
    Maintenance(maintenance::MaintenanceArgs),
}

impl Cli {
    /// Load the merged configuration for this invocation.
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        AppConfig::load(&self.config, &self.env)
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        let ctx = match self.user {
            Some(user) => RequestContext::new(user),
            None => RequestContext::system(),
        };

        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Category(args) => category::execute(args, &config, self.format).await,
            Commands::Resource(args) => {
                let engine = build_engine(&config).await?;
                resource::execute(args, &engine, &ctx, self.format).await
            }
            Commands::File(args) => {
                let engine = build_engine(&config).await?;
                file::execute(args, &engine, &ctx, self.format).await
            }
            Commands::Access(args) => {
                let engine = build_engine(&config).await?;
                access::execute(args, &engine, &ctx, self.format).await
            }
            Commands::Maintenance(args) => {
                let engine = build_engine(&config).await?;
                maintenance::execute(args, &engine, &ctx, self.format).await
            }
        }
    }
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: wire an engine over PostgreSQL, the configured cache, and the
/// registry tables.
pub async fn build_engine(config: &AppConfig) -> Result<AncestryEngine, AppError> {
    let db = create_db_pool(config).await?;
    let cache = CacheManager::new(&config.cache).await?;

    Ok(AncestryEngine::new(
        Arc::new(PgResourceStore::new(db.pool().clone())),
        Arc::new(StaticTypeRegistry::from_config(&config.registry)),
        Arc::new(StaticOptionResolver::from_config(&config.registry)),
        Arc::new(cache),
        config.ancestry.clone(),
    ))
}

/// Helper: direct-parent list for `ids`, with categories read from the store.
pub async fn parents_for(
    engine: &AncestryEngine,
    ids: &[ResourceId],
) -> Result<DirectParents, AppError> {
    let mut entries = Vec::with_capacity(ids.len());
    for id in ids {
        let parent = engine.get_resource(*id).await?;
        entries.push(DirectParent::new(parent.id, parent.category));
    }
    Ok(DirectParents::from_entries(entries))
}
