use async_trait::async_trait;
use thiserror::Error;

use shotbot_core::domain::history::{History, UserId};
use shotbot_core::domain::user::UserHistory;

pub mod history;
pub mod memory;

pub use history::SqlHistoryRepository;
pub use memory::InMemoryHistoryRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Per-user history document store.
///
/// `list_all` hands back every stored record as-is. Records with a blank user id can
/// exist and are left for callers to filter.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn find(&self, user_id: &UserId) -> Result<Option<History>, RepositoryError>;

    /// Creates an empty history for `user_id`. Existing records are left untouched.
    async fn create(&self, user_id: &UserId) -> Result<(), RepositoryError>;

    async fn save(&self, record: &UserHistory) -> Result<(), RepositoryError>;

    async fn list_all(&self) -> Result<Vec<UserHistory>, RepositoryError>;
}
