//! Request context carrying the acting user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use archive_core::types::UserId;

/// Context for the current request.
///
/// Passed into every engine write so logs and events know *who* acted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's ID.
    pub user_id: UserId,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context for `user_id`.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            request_time: Utc::now(),
        }
    }

    /// Context for maintenance work not attributed to a user (CLI, repair jobs).
    pub fn system() -> Self {
        Self::new(UserId::from_uuid(Uuid::nil()))
    }

    /// Whether this is the maintenance context.
    pub fn is_system(&self) -> bool {
        self.user_id.as_uuid().is_nil()
    }
}
