//! Periodic removal of expired sessions.
//!
//! An expired session is replaced on the client's next request regardless,
//! so dropping it early changes no decision. Live sessions are never touched.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::admission::AdmissionController;
use crate::observability::metrics;

pub struct SessionSweeper {
    controller: Arc<AdmissionController>,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(controller: Arc<AdmissionController>, interval: Duration) -> Self {
        Self {
            controller,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.interval.is_zero() {
            tracing::info!("Session sweeping disabled");
            return;
        }

        tracing::info!(interval = ?self.interval, "Session sweeper starting");

        let mut ticker = time::interval(self.interval);
        // The first tick completes immediately; there is nothing to sweep yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Session sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn sweep_once(&self) -> usize {
        let removed = self.controller.sweep_expired();
        if removed > 0 {
            metrics::record_sessions_swept(removed);
            tracing::debug!(
                removed,
                remaining = self.controller.tracked_sessions(),
                "Swept expired sessions"
            );
        }
        removed
    }
}
