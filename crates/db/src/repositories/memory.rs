use std::collections::HashMap;

use tokio::sync::RwLock;

use shotbot_core::domain::history::{History, UserId};
use shotbot_core::domain::user::UserHistory;

use super::{HistoryRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryHistoryRepository {
    histories: RwLock<HashMap<UserId, History>>,
    order: RwLock<Vec<UserId>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds records in the given order, which is also the order `list_all` reports.
    pub async fn with_records(records: Vec<UserHistory>) -> Self {
        let repo = Self::default();
        for record in records {
            repo.upsert(record.user_id, record.history).await;
        }
        repo
    }

    async fn upsert(&self, user_id: UserId, history: History) {
        let mut histories = self.histories.write().await;
        if histories.insert(user_id.clone(), history).is_none() {
            self.order.write().await.push(user_id);
        }
    }
}

#[async_trait::async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<History>, RepositoryError> {
        let histories = self.histories.read().await;
        Ok(histories.get(user_id).cloned())
    }

    async fn create(&self, user_id: &UserId) -> Result<(), RepositoryError> {
        let mut histories = self.histories.write().await;
        if !histories.contains_key(user_id) {
            histories.insert(user_id.clone(), History::new());
            self.order.write().await.push(user_id.clone());
        }
        Ok(())
    }

    async fn save(&self, record: &UserHistory) -> Result<(), RepositoryError> {
        self.upsert(record.user_id.clone(), record.history.clone()).await;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<UserHistory>, RepositoryError> {
        let histories = self.histories.read().await;
        let order = self.order.read().await;
        Ok(order
            .iter()
            .filter_map(|user_id| {
                histories
                    .get(user_id)
                    .map(|history| UserHistory::new(user_id.clone(), history.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use shotbot_core::domain::history::{History, HistoryEvent, UserId};
    use shotbot_core::domain::user::UserHistory;

    use crate::repositories::{HistoryRepository, InMemoryHistoryRepository};

    #[tokio::test]
    async fn in_memory_history_repo_round_trip() {
        let repo = InMemoryHistoryRepository::new();
        let record = UserHistory::new(
            UserId::new("U1"),
            History::from_events(vec![HistoryEvent::Limit { limit: 3 }, HistoryEvent::Reset]),
        );

        repo.save(&record).await.expect("save history");
        let found = repo.find(&record.user_id).await.expect("find history");

        assert_eq!(found, Some(record.history));
    }

    #[tokio::test]
    async fn create_keeps_existing_history() {
        let repo = InMemoryHistoryRepository::new();
        let user = UserId::new("U1");
        let history = History::new().with(HistoryEvent::Shot { ts: 1_000.0 });

        repo.save(&UserHistory::new(user.clone(), history.clone())).await.expect("save");
        repo.create(&user).await.expect("create");

        assert_eq!(repo.find(&user).await.expect("find"), Some(history));
        assert!(repo.find(&UserId::new("U2")).await.expect("find missing").is_none());
    }

    #[tokio::test]
    async fn list_all_reports_insertion_order_including_placeholders() {
        let repo = InMemoryHistoryRepository::with_records(vec![
            UserHistory::new(UserId::new("UB"), History::new()),
            UserHistory::new(UserId::new(""), History::new()),
            UserHistory::new(UserId::new("UA"), History::new()),
        ])
        .await;

        let ids: Vec<String> = repo
            .list_all()
            .await
            .expect("list")
            .into_iter()
            .map(|record| record.user_id.0)
            .collect();

        assert_eq!(ids, vec!["UB".to_string(), String::new(), "UA".to_string()]);
    }

    #[tokio::test]
    async fn seeding_a_repeated_user_keeps_the_last_history_and_first_position() {
        let latest = History::new().with(HistoryEvent::Shot { ts: 2_000.0 });
        let repo = InMemoryHistoryRepository::with_records(vec![
            UserHistory::new(UserId::new("UA"), History::new()),
            UserHistory::new(UserId::new("UB"), History::new()),
            UserHistory::new(UserId::new("UA"), latest.clone()),
        ])
        .await;

        let records = repo.list_all().await.expect("list");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], UserHistory::new(UserId::new("UA"), latest));
        assert_eq!(records[1].user_id, UserId::new("UB"));
    }
}
