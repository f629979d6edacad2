//! Business logic services

pub mod live_feed;
pub mod presence;
pub mod visits;

use std::sync::Arc;

use crate::{config::AnalyticsConfig, repository::VisitorStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn VisitorStore>,
    pub visits: visits::VisitsService,
    pub live_feed: live_feed::LiveFeedService,
}

impl Services {
    /// Create all services over the given store
    pub fn new(store: Arc<dyn VisitorStore>, config: &AnalyticsConfig) -> Self {
        let presence = presence::PresenceService::new(store.clone(), config.live_ttl());
        Self {
            visits: visits::VisitsService::new(store.clone()),
            live_feed: live_feed::LiveFeedService::new(presence, config.heartbeat()),
            store,
        }
    }
}
