//! Visit counting models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::session::SessionId;

/// Last day a session was counted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub session_id: SessionId,
    pub last_counted_date: NaiveDate,
}

/// Result of recording one request against the daily counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitOutcome {
    pub session_id: SessionId,
    pub counted: bool,
    /// The session id was minted by this request
    pub is_new: bool,
}

/// Track endpoint response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackVisitResponse {
    pub success: bool,
    /// Visitor session identifier (also set as the `visitor_session` cookie)
    pub session_id: String,
    /// Whether this request was counted as today's visit
    pub counted: bool,
}

impl From<VisitOutcome> for TrackVisitResponse {
    fn from(outcome: VisitOutcome) -> Self {
        Self {
            success: true,
            session_id: outcome.session_id.into_inner(),
            counted: outcome.counted,
        }
    }
}
