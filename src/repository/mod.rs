//! Visitor store: daily visit records and the live presence set

pub mod memory;
pub mod redis;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    config::{StorageBackend, StorageConfig},
    error::AppResult,
    models::SessionId,
};

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Storage backend for visitor data.
///
/// Every method must be atomic with respect to concurrent callers.
/// Use `MockVisitorStore` in tests to simulate backend failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitorStore: Send + Sync {
    /// Record a visit for `date`; `true` if it was not already counted that day
    async fn add_visit(&self, session_id: &SessionId, date: NaiveDate) -> AppResult<bool>;

    /// Insert or refresh a live entry
    async fn add_live_presence(&self, session_id: &SessionId, now: DateTime<Utc>) -> AppResult<()>;

    /// Drop a live entry; absent entries are ignored
    async fn remove_live_presence(&self, session_id: &SessionId) -> AppResult<()>;

    /// Drop entries silent for longer than `ttl`, returning how many went
    async fn cleanup_stale_live_entries(
        &self,
        ttl: chrono::Duration,
        now: DateTime<Utc>,
    ) -> AppResult<usize>;

    async fn count_live_entries(&self) -> AppResult<usize>;

    /// Backend reachability
    async fn ping(&self) -> AppResult<()>;
}

/// Build the backend named in configuration
pub async fn connect(config: &StorageConfig) -> AppResult<Arc<dyn VisitorStore>> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory visitor store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Redis => {
            let store = RedisStore::new(&config.redis_url).await?;
            tracing::info!("Connected to Redis visitor store");
            Ok(Arc::new(store))
        }
    }
}
