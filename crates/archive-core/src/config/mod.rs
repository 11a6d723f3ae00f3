//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod ancestry;
pub mod cache;
pub mod logging;
pub mod registry;

use serde::{Deserialize, Serialize};

use self::ancestry::AncestryConfig;
use self::cache::CacheConfig;
use self::logging::LoggingConfig;
use self::registry::RegistryConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay + `ARCHIVE__` variables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Cache provider settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Ancestry traversal and cascade settings.
    #[serde(default)]
    pub ancestry: AncestryConfig,
    /// Category and access-right tables.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database connection pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Idle connection timeout in seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl AppConfig {
    /// Load configuration from a base file plus an environment overlay.
    ///
    /// `path` names the base file without extension handling rules of the
    /// `config` crate (e.g. `config/default`). The overlay is
    /// `config/{env}` and environment variables prefixed with `ARCHIVE__`
    /// win over both.
    pub fn load(path: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ARCHIVE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml(document: &str) -> Result<Self, AppError> {
        config::Config::builder()
            .add_source(config::File::from_str(document, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(AppError::from)
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document_fills_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "postgres://localhost/archive"
            "#,
        )
        .expect("parse");

        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.cache.provider, "memory");
        assert_eq!(config.ancestry.max_nodes, 10_000);
        assert!(config.registry.categories.is_empty());
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_registry_tables_parse() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "postgres://localhost/archive"

            [[registry.categories]]
            slug = "collection"
            hierarchical = true

            [[registry.categories]]
            slug = "document"
            allowed_parents = ["collection"]

            [[registry.access_rights]]
            id = "6f1c1a52-2a8c-4d4e-9c55-0a5f0e1d7b11"
            term = "restricted"
            "#,
        )
        .expect("parse");

        assert_eq!(config.registry.categories.len(), 2);
        assert!(config.registry.categories[0].hierarchical);
        assert!(!config.registry.categories[1].hierarchical);
        assert_eq!(config.registry.categories[1].allowed_parents, vec!["collection"]);
        assert_eq!(config.registry.access_rights[0].term, "restricted");
    }
}
