//! Cancellation and deadline settings for one cascade.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Bounds on a cascade. Both are checked between nodes, never mid-write.
#[derive(Debug, Clone, Default)]
pub struct CascadeOptions {
    /// Stop once this much time has passed since the cascade started.
    pub timeout: Option<Duration>,
    /// Stop when cancelled.
    pub cancel: CancellationToken,
}

impl CascadeOptions {
    /// Options with a deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    /// Attach a cancellation token.
    pub fn cancelled_by(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Why the cascade must stop now, if it must.
    pub(crate) fn interruption(&self, started: Instant) -> Option<String> {
        if self.cancel.is_cancelled() {
            return Some("cancelled".to_string());
        }
        match self.timeout {
            Some(limit) if started.elapsed() >= limit => {
                Some(format!("timed out after {}ms", limit.as_millis()))
            }
            _ => None,
        }
    }
}
