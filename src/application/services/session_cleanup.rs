use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::application::errors::StorageError;
use crate::domain::traits::ChatSessionRepository;

/// How often expired sessions are swept (5 minutes)
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 5 * 60 * 1000;

/// Periodically deletes sessions idle past the timeout
pub struct SessionCleanupService {
    sessions: Arc<dyn ChatSessionRepository>,
    timeout_ms: u64,
    interval: Duration,
}

impl SessionCleanupService {
    pub fn new(sessions: Arc<dyn ChatSessionRepository>, timeout_ms: u64) -> Self {
        Self {
            sessions,
            timeout_ms,
            interval: Duration::from_millis(DEFAULT_CLEANUP_INTERVAL_MS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn run_once(&self) -> Result<usize, StorageError> {
        let removed = self.sessions.delete_expired_sessions(self.timeout_ms).await?;
        if removed > 0 {
            tracing::info!("Removed {} expired sessions", removed);
        } else {
            tracing::debug!("No expired sessions");
        }
        Ok(removed)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    tracing::error!("Session cleanup failed: {}", e);
                }
            }
        })
    }
}
