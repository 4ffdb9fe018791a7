use chrono::Utc;
use sqlx::Row;
use tracing::warn;

use shotbot_core::codec;
use shotbot_core::domain::history::{History, UserId};
use shotbot_core::domain::user::UserHistory;

use super::{HistoryRepository, RepositoryError};
use crate::DbPool;

/// Stores each history as a JSON array in the legacy numeric encoding.
pub struct SqlHistoryRepository {
    pool: DbPool,
}

impl SqlHistoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_history(user_id: &str, raw: &str) -> Result<History, RepositoryError> {
    let codes: Vec<f64> = serde_json::from_str(raw).map_err(|e| {
        RepositoryError::Decode(format!("history for user `{user_id}` is not a number array: {e}"))
    })?;
    Ok(codec::decode(&codes))
}

fn encode_history(history: &History) -> Result<String, RepositoryError> {
    serde_json::to_string(&codec::encode(history))
        .map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<UserHistory, RepositoryError> {
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let raw: String =
        row.try_get("history_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let history = decode_history(&user_id, &raw)?;

    Ok(UserHistory::new(UserId(user_id), history))
}

#[async_trait::async_trait]
impl HistoryRepository for SqlHistoryRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<History>, RepositoryError> {
        let row = sqlx::query("SELECT history_json FROM shot_history WHERE user_id = ?")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => {
                let raw: String =
                    r.try_get("history_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(Some(decode_history(user_id.as_str(), &raw)?))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, user_id: &UserId) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO shot_history (user_id, history_json, created_at, updated_at)
             VALUES (?, '[]', ?, ?)
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, record: &UserHistory) -> Result<(), RepositoryError> {
        let history_json = encode_history(&record.history)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO shot_history (user_id, history_json, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 history_json = excluded.history_json,
                 updated_at = excluded.updated_at",
        )
        .bind(record.user_id.as_str())
        .bind(&history_json)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<UserHistory>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT user_id, history_json FROM shot_history ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| match row_to_record(row) {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(
                        event_name = "history.row_skipped",
                        error = %error,
                        "skipping undecodable history row"
                    );
                    None
                }
            })
            .collect())
    }
}
