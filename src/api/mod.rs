//! API handlers for the analytics endpoints

pub mod analytics;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::SessionId, AppState};

/// Cookie carrying the visitor session id
pub const SESSION_COOKIE: &str = "visitor_session";

/// Extractor for a request that must carry a visitor session cookie
pub struct RequiredSession(pub SessionId);

#[async_trait]
impl<S> FromRequestParts<S> for RequiredSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .and_then(|cookie| SessionId::from_cookie(cookie.value()))
            .map(RequiredSession)
            .ok_or(AppError::SessionRequired)
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Analytics
        .route("/analytics/track", post(analytics::track_visit))
        .route("/analytics/live", get(analytics::live_visitors))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
