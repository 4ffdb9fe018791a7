use async_trait::async_trait;
use thiserror::Error;

use crate::domain::history::UserId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity lookup for `{user_id}` failed: {reason}")]
    Lookup { user_id: String, reason: String },
}

/// Resolves a user id to a display name. An empty name means the user is unknown.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_display_name(&self, user_id: &UserId) -> Result<String, IdentityError>;
}
