//! Live presence tracking

use std::sync::Arc;

use chrono::Utc;

use crate::{error::AppResult, models::SessionId, repository::VisitorStore};

#[derive(Clone)]
pub struct PresenceService {
    store: Arc<dyn VisitorStore>,
    ttl: chrono::Duration,
}

impl PresenceService {
    pub fn new(store: Arc<dyn VisitorStore>, ttl: chrono::Duration) -> Self {
        Self { store, ttl }
    }

    /// Mark a session live, or refresh its last-seen time
    pub async fn join(&self, session_id: &SessionId) -> AppResult<()> {
        self.store.add_live_presence(session_id, Utc::now()).await
    }

    pub async fn leave(&self, session_id: &SessionId) -> AppResult<()> {
        self.store.remove_live_presence(session_id).await
    }

    /// Live sessions, after evicting those that went silent
    pub async fn current_count(&self) -> AppResult<usize> {
        let removed = self
            .store
            .cleanup_stale_live_entries(self.ttl, Utc::now())
            .await?;
        if removed > 0 {
            tracing::debug!(removed, "Evicted stale live entries");
        }
        self.store.count_live_entries().await
    }
}
