//! Background task that drops session entries nobody is using.
//!
//! Sessions whose members all left without an explicit close linger as
//! empty entries. The sweeper is opt-in (`empty_session_sweep_seconds`).

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::metrics::EngineMetrics;

use super::registry::SessionRegistry;

/// Periodically purges empty sessions from the registry.
#[derive(Debug)]
pub struct EmptySessionSweeper {
    registry: Arc<SessionRegistry>,
    metrics: Arc<EngineMetrics>,
    interval: Duration,
}

impl EmptySessionSweeper {
    pub fn new(
        registry: Arc<SessionRegistry>,
        metrics: Arc<EngineMetrics>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            metrics,
            interval,
        }
    }

    /// Runs one sweep. Returns how many sessions were removed.
    pub fn sweep(&self) -> usize {
        let removed = self.registry.purge_empty_sessions();
        if removed > 0 {
            self.metrics.sessions_swept(removed);
            debug!(removed, "Swept empty sessions");
        }
        removed
    }

    /// Sweeps every interval until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Empty-session sweeper started");
        let mut interval =
            tokio::time::interval_at(tokio::time::Instant::now() + self.interval, self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep();
                }
                _ = shutdown.cancelled() => {
                    info!("Empty-session sweeper shutting down");
                    return;
                }
            }
        }
    }
}
