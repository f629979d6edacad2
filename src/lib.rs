//! Portfolio analytics server
//!
//! Counts each visitor session at most once per day and pushes the number of
//! live visitors to connected browsers over server-sent events.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn repository::VisitorStore>) -> Self {
        let services = services::Services::new(store, &config.analytics);
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
