//! In-process visitor store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;

use crate::{
    error::AppResult,
    models::{LiveEntry, SessionId, VisitRecord},
};

use super::VisitorStore;

/// Single-process store; each collection sits behind its own lock.
#[derive(Default)]
pub struct MemoryStore {
    visits: Mutex<HashMap<SessionId, VisitRecord>>,
    live: Mutex<HashMap<SessionId, LiveEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visit_record(&self, session_id: &SessionId) -> Option<VisitRecord> {
        self.visits.lock().get(session_id).cloned()
    }

    pub fn visit_records(&self) -> usize {
        self.visits.lock().len()
    }
}

#[async_trait]
impl VisitorStore for MemoryStore {
    async fn add_visit(&self, session_id: &SessionId, date: NaiveDate) -> AppResult<bool> {
        let mut visits = self.visits.lock();
        match visits.get_mut(session_id) {
            Some(record) if record.last_counted_date == date => Ok(false),
            Some(record) => {
                record.last_counted_date = date;
                Ok(true)
            }
            None => {
                visits.insert(
                    session_id.clone(),
                    VisitRecord {
                        session_id: session_id.clone(),
                        last_counted_date: date,
                    },
                );
                Ok(true)
            }
        }
    }

    async fn add_live_presence(&self, session_id: &SessionId, now: DateTime<Utc>) -> AppResult<()> {
        self.live.lock().insert(
            session_id.clone(),
            LiveEntry {
                session_id: session_id.clone(),
                last_seen_at: now,
            },
        );
        Ok(())
    }

    async fn remove_live_presence(&self, session_id: &SessionId) -> AppResult<()> {
        self.live.lock().remove(session_id);
        Ok(())
    }

    async fn cleanup_stale_live_entries(
        &self,
        ttl: chrono::Duration,
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        let mut live = self.live.lock();
        let before = live.len();
        live.retain(|_, entry| !entry.is_stale(ttl, now));
        Ok(before - live.len())
    }

    async fn count_live_entries(&self) -> AppResult<usize> {
        Ok(self.live.lock().len())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
