//! API integration tests driven through the router

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use portfolio_analytics::{
    api,
    models::SessionId,
    repository::{MemoryStore, VisitorStore},
    AppConfig, AppError, AppResult, AppState,
};

/// Store whose backend is always down
struct UnreachableStore;

#[async_trait]
impl VisitorStore for UnreachableStore {
    async fn add_visit(&self, _: &SessionId, _: NaiveDate) -> AppResult<bool> {
        Err(AppError::Store("connection refused".into()))
    }
    async fn add_live_presence(&self, _: &SessionId, _: DateTime<Utc>) -> AppResult<()> {
        Err(AppError::Store("connection refused".into()))
    }
    async fn remove_live_presence(&self, _: &SessionId) -> AppResult<()> {
        Err(AppError::Store("connection refused".into()))
    }
    async fn cleanup_stale_live_entries(
        &self,
        _: chrono::Duration,
        _: DateTime<Utc>,
    ) -> AppResult<usize> {
        Err(AppError::Store("connection refused".into()))
    }
    async fn count_live_entries(&self) -> AppResult<usize> {
        Err(AppError::Store("connection refused".into()))
    }
    async fn ping(&self) -> AppResult<()> {
        Err(AppError::Store("connection refused".into()))
    }
}

fn app_with(store: Arc<dyn VisitorStore>) -> Router {
    api::create_router(AppState::new(AppConfig::default(), store))
}

fn track_request(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/analytics/track");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("build track request")
}

fn live_request(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/analytics/live");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("build live request")
}

async fn json_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("parse json body")
}

fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

async fn next_event(body: &mut Body) -> String {
    loop {
        let frame = body
            .frame()
            .await
            .expect("stream ended")
            .expect("read frame");
        if let Ok(data) = frame.into_data() {
            let text = String::from_utf8_lossy(&data).to_string();
            if text.starts_with("data:") {
                return text;
            }
        }
    }
}

#[tokio::test]
async fn test_health_check() {
    let response = app_with(Arc::new(MemoryStore::new()))
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .expect("call health");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_reports_store_state() {
    let ready = app_with(Arc::new(MemoryStore::new()))
        .oneshot(Request::builder().uri("/api/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ready.status(), StatusCode::OK);

    let down = app_with(Arc::new(UnreachableStore))
        .oneshot(Request::builder().uri("/api/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_new_visitor_gets_session_cookie() {
    let response = app_with(Arc::new(MemoryStore::new()))
        .oneshot(track_request(None))
        .await
        .expect("call track");

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    let body = json_body(response).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["counted"], true);
    let session_id = body["sessionId"].as_str().expect("sessionId");
    assert!(!session_id.is_empty());

    let session_cookie = cookies
        .iter()
        .find(|c| c.starts_with("visitor_session="))
        .expect("session cookie");
    assert!(session_cookie.contains(session_id));
    assert!(session_cookie.contains("Max-Age=31536000"));
    assert!(session_cookie.contains("SameSite=Lax"));
    assert!(session_cookie.contains("Path=/"));
    assert!(!session_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_same_session_counted_once_per_day() {
    let app = app_with(Arc::new(MemoryStore::new()));
    let cookie = "visitor_session=returning-visitor";

    let first = app.clone().oneshot(track_request(Some(cookie))).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_cookies = set_cookies(&first);
    let first_body = json_body(first).await;
    assert_eq!(first_body["counted"], true);
    assert_eq!(first_body["sessionId"], "returning-visitor");

    let marker = format!("last_visit_{}=true", Utc::now().format("%Y-%m-%d"));
    let marker_cookie = first_cookies
        .iter()
        .find(|c| c.starts_with(&marker))
        .expect("counted marker cookie");
    assert!(marker_cookie.contains("Max-Age=86400"));
    assert!(!first_cookies.iter().any(|c| c.starts_with("visitor_session=")));

    let second = app.oneshot(track_request(Some(cookie))).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert!(set_cookies(&second).is_empty());
    let second_body = json_body(second).await;
    assert_eq!(second_body["counted"], false);
    assert_eq!(second_body["success"], true);
}

#[tokio::test]
async fn test_blank_session_cookie_starts_new_session() {
    let response = app_with(Arc::new(MemoryStore::new()))
        .oneshot(track_request(Some("visitor_session=")))
        .await
        .unwrap();

    let cookies = set_cookies(&response);
    let body = json_body(response).await;
    assert_eq!(body["counted"], true);
    assert!(cookies.iter().any(|c| c.starts_with("visitor_session=")
        && !c.starts_with("visitor_session=;")));
}

#[tokio::test]
async fn test_track_store_failure_is_server_error() {
    let response = app_with(Arc::new(UnreachableStore))
        .oneshot(track_request(None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["error"], "StoreFailure");
    assert!(body["message"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_live_requires_session_cookie() {
    let store = Arc::new(MemoryStore::new());
    let response = app_with(store.clone())
        .oneshot(live_request(None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "SessionRequired");
    assert_eq!(store.count_live_entries().await.unwrap(), 0);
}

#[tokio::test]
async fn test_live_feed_streams_count_and_cleans_up() {
    let store = Arc::new(MemoryStore::new());
    let app = app_with(store.clone());

    let response = app
        .oneshot(live_request(Some("visitor_session=watcher")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-transform");
    assert_eq!(headers["x-accel-buffering"], "no");

    let mut body = response.into_body();
    let event = next_event(&mut body).await;
    assert!(event.contains(r#"{"liveVisitors":1}"#), "unexpected event: {}", event);
    assert_eq!(store.count_live_entries().await.unwrap(), 1);

    // Client goes away
    drop(body);
    for _ in 0..100 {
        if store.count_live_entries().await.unwrap() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("live entry was not removed after disconnect");
}

#[tokio::test]
async fn test_live_feed_store_failure_is_server_error() {
    let response = app_with(Arc::new(UnreachableStore))
        .oneshot(live_request(Some("visitor_session=watcher")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_openapi_json_route_serves_spec() {
    let response = app_with(Arc::new(MemoryStore::new()))
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["paths"]["/analytics/live"].is_object());
}
