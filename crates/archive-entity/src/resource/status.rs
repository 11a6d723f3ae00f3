//! Resource lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Editorial status of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// Just created, not yet edited.
    #[default]
    Created,
    /// Work in progress.
    Draft,
    /// Publicly visible.
    Published,
    /// Edited after publication.
    Updated,
    /// Soft-deleted.
    Deleted,
}

impl ResourceStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceStatus {
    type Err = archive_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(Self::Created),
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            _ => Err(archive_core::AppError::validation(format!(
                "Invalid resource status: '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for status in [
            ResourceStatus::Created,
            ResourceStatus::Draft,
            ResourceStatus::Published,
            ResourceStatus::Updated,
            ResourceStatus::Deleted,
        ] {
            assert_eq!(status.as_str().parse::<ResourceStatus>().ok(), Some(status));
        }
        assert!("archived".parse::<ResourceStatus>().is_err());
    }
}
