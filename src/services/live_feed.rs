//! Live visitor feed: one publisher task per connected client.
//!
//! A subscription joins the live set, pushes a snapshot straight away and
//! then one per heartbeat. The task ends when the receiving side is dropped,
//! when the store or the channel fails, or on server shutdown; in every case
//! it leaves the live set exactly once and sends nothing afterwards.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    error::{AppError, AppResult},
    models::{LiveSnapshot, SessionId},
};

use super::presence::PresenceService;

const FEED_BUFFER: usize = 4;

/// Why a publisher stopped emitting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    Disconnected,
    StoreFailure,
    Shutdown,
}

#[derive(Clone)]
pub struct LiveFeedService {
    presence: PresenceService,
    heartbeat: Duration,
    shutdown: Arc<watch::Sender<bool>>,
}

impl LiveFeedService {
    pub fn new(presence: PresenceService, heartbeat: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            presence,
            heartbeat,
            shutdown: Arc::new(shutdown),
        }
    }

    /// Open a feed for `session_id`.
    ///
    /// Fails without leaving anything behind if the session cannot be joined
    /// or the first count cannot be read.
    pub async fn subscribe(&self, session_id: SessionId) -> AppResult<ReceiverStream<LiveSnapshot>> {
        // Subscribe before any await so a shutdown racing the open is not missed
        let shutdown = self.shutdown.subscribe();
        if *shutdown.borrow() {
            return Err(AppError::Internal("live feed is shutting down".to_string()));
        }

        self.presence.join(&session_id).await?;
        let initial = match self.presence.current_count().await {
            Ok(live_visitors) => LiveSnapshot { live_visitors },
            Err(e) => {
                self.leave(&session_id).await;
                return Err(e);
            }
        };

        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let feed = self.clone();
        tokio::spawn(async move { feed.publish(session_id, tx, initial, shutdown).await });

        Ok(ReceiverStream::new(rx))
    }

    /// Ask every open feed to close
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    async fn publish(
        &self,
        session_id: SessionId,
        tx: mpsc::Sender<LiveSnapshot>,
        initial: LiveSnapshot,
        shutdown: watch::Receiver<bool>,
    ) {
        tracing::debug!(session = session_id.short(), "Live feed opened");

        let reason = self.emit(&session_id, &tx, initial, shutdown).await;
        self.leave(&session_id).await;

        tracing::debug!(session = session_id.short(), ?reason, "Live feed closed");
        // `tx` drops here, after leave, which ends the client stream
    }

    async fn emit(
        &self,
        session_id: &SessionId,
        tx: &mpsc::Sender<LiveSnapshot>,
        initial: LiveSnapshot,
        mut shutdown: watch::Receiver<bool>,
    ) -> CloseReason {
        if tx.send(initial).await.is_err() {
            return CloseReason::Disconnected;
        }

        let mut ticker = time::interval_at(Instant::now() + self.heartbeat, self.heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tx.closed() => return CloseReason::Disconnected,
                _ = closing(&mut shutdown) => return CloseReason::Shutdown,
                _ = ticker.tick() => {
                    let snapshot = match self.refresh(session_id).await {
                        Ok(snapshot) => snapshot,
                        Err(e) => {
                            tracing::warn!(session = session_id.short(), error = %e, "Live count unavailable, closing feed");
                            return CloseReason::StoreFailure;
                        }
                    };
                    if tx.send(snapshot).await.is_err() {
                        return CloseReason::Disconnected;
                    }
                }
            }
        }
    }

    /// Heartbeat: keep this session live and read the count
    async fn refresh(&self, session_id: &SessionId) -> AppResult<LiveSnapshot> {
        self.presence.join(session_id).await?;
        let live_visitors = self.presence.current_count().await?;
        Ok(LiveSnapshot { live_visitors })
    }

    async fn leave(&self, session_id: &SessionId) {
        if let Err(e) = self.presence.leave(session_id).await {
            tracing::warn!(session = session_id.short(), error = %e, "Failed to remove live entry");
        }
    }
}

/// Resolves once shutdown has been requested, including before this call
async fn closing(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|closing| *closing).await;
}
