//! Visitor analytics endpoints: daily visit tracking and the live count feed

use axum::{
    extract::State,
    http::{header, HeaderName},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{NaiveDate, Utc};
use tokio_stream::StreamExt;

use crate::{
    error::AppResult,
    models::{SessionId, TrackVisitResponse},
    AppState,
};

use super::{RequiredSession, SESSION_COOKIE};

/// Name of the marker cookie set when a visit is counted on `date`
pub fn counted_cookie_name(date: NaiveDate) -> String {
    format!("last_visit_{}", date.format("%Y-%m-%d"))
}

fn client_cookie(name: String, value: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .same_site(SameSite::Lax)
        .http_only(false)
        .max_age(max_age)
        .build()
}

/// Record a page visit, at most once per session per day
#[utoipa::path(
    post,
    path = "/analytics/track",
    tag = "analytics",
    responses(
        (status = 200, description = "Visit recorded", body = TrackVisitResponse),
        (status = 503, description = "Visitor store unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn track_visit(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<TrackVisitResponse>)> {
    let session_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| SessionId::from_cookie(cookie.value()));
    let today = Utc::now().date_naive();

    let outcome = state.services.visits.record(session_id, today).await?;

    let analytics = &state.config.analytics;
    let mut jar = jar;
    if outcome.is_new {
        jar = jar.add(client_cookie(
            SESSION_COOKIE.to_string(),
            outcome.session_id.to_string(),
            time::Duration::days(analytics.session_cookie_days),
        ));
    }
    if outcome.counted {
        jar = jar.add(client_cookie(
            counted_cookie_name(today),
            "true".to_string(),
            time::Duration::hours(analytics.counted_cookie_hours),
        ));
    }

    Ok((jar, Json(outcome.into())))
}

/// Stream the live visitor count as server-sent events
#[utoipa::path(
    get,
    path = "/analytics/live",
    tag = "analytics",
    responses(
        (status = 200, description = "Event stream of live counts", content_type = "text/event-stream", body = crate::models::LiveSnapshot),
        (status = 400, description = "Missing visitor session cookie", body = crate::error::ErrorResponse)
    )
)]
pub async fn live_visitors(
    State(state): State<AppState>,
    RequiredSession(session_id): RequiredSession,
) -> AppResult<impl IntoResponse> {
    tracing::debug!(session = session_id.short(), "Opening live feed");

    let snapshots = state.services.live_feed.subscribe(session_id).await?;
    let events = snapshots.map(|snapshot| Event::default().json_data(snapshot));

    let headers = [
        (header::CACHE_CONTROL, "no-cache, no-transform"),
        (HeaderName::from_static("x-accel-buffering"), "no"),
    ];

    Ok((headers, Sse::new(events).keep_alive(KeepAlive::default())))
}
