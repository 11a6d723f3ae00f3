//! Option resolver backed by a fixed access-right table.

use std::collections::HashMap;

use async_trait::async_trait;

use archive_core::config::registry::RegistryConfig;
use archive_core::result::AppResult;
use archive_core::types::AccessRightId;
use archive_entity::access::AccessRight;

use crate::traits::OptionResolver;

/// Access-right options held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticOptionResolver {
    options: HashMap<AccessRightId, AccessRight>,
}

impl StaticOptionResolver {
    /// Build from the `[registry]` configuration section.
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::with_options(config.access_rights.iter().map(|entry| AccessRight {
            id: AccessRightId::from_uuid(entry.id),
            term: entry.term.clone(),
        }))
    }

    /// Build from explicit options.
    pub fn with_options(options: impl IntoIterator<Item = AccessRight>) -> Self {
        Self {
            options: options.into_iter().map(|o| (o.id, o)).collect(),
        }
    }
}

#[async_trait]
impl OptionResolver for StaticOptionResolver {
    async fn resolve_option(&self, id: AccessRightId) -> AppResult<Option<AccessRight>> {
        Ok(self.options.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_known_and_unknown() {
        let public = AccessRight {
            id: AccessRightId::new(),
            term: "public".to_string(),
        };
        let resolver = StaticOptionResolver::with_options([public.clone()]);

        assert_eq!(resolver.resolve_option(public.id).await.unwrap(), Some(public));
        assert_eq!(
            resolver.resolve_option(AccessRightId::new()).await.unwrap(),
            None
        );
    }
}
