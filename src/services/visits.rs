//! Daily visit counting

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{SessionId, VisitOutcome},
    repository::VisitorStore,
};

#[derive(Clone)]
pub struct VisitsService {
    store: Arc<dyn VisitorStore>,
}

impl VisitsService {
    pub fn new(store: Arc<dyn VisitorStore>) -> Self {
        Self { store }
    }

    /// Count at most one visit per session per calendar day.
    ///
    /// Without a session a new one is minted and the visit always counts.
    pub async fn record(
        &self,
        session_id: Option<SessionId>,
        today: NaiveDate,
    ) -> AppResult<VisitOutcome> {
        match session_id {
            None => {
                let session_id = SessionId::generate();
                self.store.add_visit(&session_id, today).await?;
                tracing::info!(session = session_id.short(), "New visitor session counted");
                Ok(VisitOutcome {
                    session_id,
                    counted: true,
                    is_new: true,
                })
            }
            Some(session_id) => {
                let counted = self.store.add_visit(&session_id, today).await?;
                if counted {
                    tracing::info!(session = session_id.short(), %today, "First visit today, counted");
                } else {
                    tracing::debug!(session = session_id.short(), %today, "Visit already counted today");
                }
                Ok(VisitOutcome {
                    session_id,
                    counted,
                    is_new: false,
                })
            }
        }
    }
}
