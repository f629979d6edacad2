//! Redis-backed visitor store, for deployments running several instances

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use crate::{
    error::{AppError, AppResult},
    models::SessionId,
};

use super::VisitorStore;

const LIVE_KEY: &str = "analytics:live";
/// Visit markers outlive their day by a margin so late requests still dedupe
const VISIT_EXPIRATION_SECONDS: u64 = 2 * 24 * 3600;

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect and verify the server answers
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Store(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Store(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { conn })
    }

    fn visit_key(session_id: &SessionId) -> String {
        format!("analytics:visit:{}", session_id)
    }
}

#[async_trait]
impl VisitorStore for RedisStore {
    async fn add_visit(&self, session_id: &SessionId, date: NaiveDate) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let today = date.format("%Y-%m-%d").to_string();

        // SET .. GET swaps atomically, so two racing requests cannot both count
        let previous: Option<String> = redis::cmd("SET")
            .arg(Self::visit_key(session_id))
            .arg(&today)
            .arg("EX")
            .arg(VISIT_EXPIRATION_SECONDS)
            .arg("GET")
            .query_async(&mut conn)
            .await?;

        Ok(previous.as_deref() != Some(today.as_str()))
    }

    async fn add_live_presence(&self, session_id: &SessionId, now: DateTime<Utc>) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.zadd::<_, _, _, ()>(LIVE_KEY, session_id.as_str(), now.timestamp_millis())
            .await?;
        Ok(())
    }

    async fn remove_live_presence(&self, session_id: &SessionId) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.zrem::<_, _, ()>(LIVE_KEY, session_id.as_str()).await?;
        Ok(())
    }

    async fn cleanup_stale_live_entries(
        &self,
        ttl: chrono::Duration,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        let mut conn = self.conn.clone();
        let cutoff = (now - ttl).timestamp_millis();
        // Exclusive bound: an entry exactly `ttl` old is still live
        let removed: usize = conn
            .zrembyscore(LIVE_KEY, "-inf", format!("({}", cutoff))
            .await?;
        Ok(removed)
    }

    async fn count_live_entries(&self) -> AppResult<usize> {
        let mut conn = self.conn.clone();
        let count: usize = conn.zcard(LIVE_KEY).await?;
        Ok(count)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}
