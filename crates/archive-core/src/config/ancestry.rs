//! Ancestry traversal and cascade configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Limits applied by the ancestry resolver and the cascading updater.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AncestryConfig {
    /// Maximum number of nodes a single closure computation may fetch.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    /// Wall-clock budget for one cascade in seconds. `0` disables the deadline.
    #[serde(default = "default_cascade_timeout")]
    pub cascade_timeout_seconds: u64,
}

impl AncestryConfig {
    /// The cascade deadline, if one is configured.
    pub fn cascade_timeout(&self) -> Option<Duration> {
        (self.cascade_timeout_seconds > 0).then(|| Duration::from_secs(self.cascade_timeout_seconds))
    }
}

impl Default for AncestryConfig {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
            cascade_timeout_seconds: default_cascade_timeout(),
        }
    }
}

fn default_max_nodes() -> usize {
    10_000
}

fn default_cascade_timeout() -> u64 {
    120
}
