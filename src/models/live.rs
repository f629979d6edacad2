//! Live presence models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::session::SessionId;

/// A session currently watching the live feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveEntry {
    pub session_id: SessionId,
    pub last_seen_at: DateTime<Utc>,
}

impl LiveEntry {
    /// Stale once silent for strictly longer than `ttl`
    pub fn is_stale(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.last_seen_at > ttl
    }
}

/// Message pushed on the live feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    pub live_visitors: usize,
}
