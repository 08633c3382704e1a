use std::{sync::Arc, time::Duration};
use tracing::{error, info};

use crate::{models::session::RevokedToken, AppState};

pub struct CleanupService {
    state: Arc<AppState>,
}

impl CleanupService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Removes blacklist rows whose tokens have expired anyway.
    pub async fn purge_expired_sessions(&self) -> u64 {
        match RevokedToken::purge_expired(&self.state.db.pool).await {
            Ok(0) => 0,
            Ok(removed) => {
                info!("🧹 Purged {} expired session records", removed);
                removed
            }
            Err(e) => {
                error!("Failed to purge expired sessions: {}", e);
                0
            }
        }
    }

    /// Runs the purge forever, once per `interval`.
    pub async fn run(self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            self.purge_expired_sessions().await;
        }
    }
}
