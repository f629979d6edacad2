//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{analytics, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Portfolio Analytics API",
        version = "0.3.0",
        description = "Daily visit counter and live visitor feed",
        license(name = "MIT")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        health::health_check,
        health::readiness_check,
        analytics::track_visit,
        analytics::live_visitors,
    ),
    components(
        schemas(
            crate::models::TrackVisitResponse,
            crate::models::LiveSnapshot,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "analytics", description = "Visit tracking and live visitors")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
