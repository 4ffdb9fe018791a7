use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::history::UserId;

/// One async lock per user.
///
/// Holding a user's guard makes a read-score-append sequence atomic for that user while
/// events for other users proceed concurrently. Entries are never evicted.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, user_id: &UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = locks.entry(user_id.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(())));
            Arc::clone(entry)
        };
        lock.lock_owned().await
    }

    pub fn tracked_users(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
