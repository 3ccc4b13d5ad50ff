// Lease Reaper - periodic reconciliation sweep

use crate::application::lease::LeaseManager;
use crate::application::shutdown::ShutdownToken;
use crate::domain::ReconcileStats;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Default sweep interval
pub const DEFAULT_REAPER_INTERVAL_MS: u64 = 1_000;

/// Background sweeper
///
/// Expires stale leases across all namespaces so that namespaces nobody
/// captures from still converge.
pub struct Reaper {
    leases: Arc<LeaseManager>,
    interval: Duration,
}

impl Reaper {
    pub fn new(leases: Arc<LeaseManager>, interval: Duration) -> Self {
        Self { leases, interval }
    }

    /// Run one sweep, logging anything it changed
    pub async fn run_once(&self) -> Result<ReconcileStats> {
        let stats = self.leases.reconcile_all().await?;

        if stats.is_empty() {
            debug!("Reaper sweep: nothing to reconcile");
        } else {
            info!(
                expired = stats.expired,
                requeued = stats.requeued,
                exhausted = stats.exhausted,
                "Reaper sweep reconciled tasks"
            );
        }
        Ok(stats)
    }

    /// Sweep loop (background task), returns once shutdown is signalled
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "Lease reaper started"
        );

        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = tick.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!(error = ?e, "Reaper sweep failed");
                    }
                }
            }
        }

        info!("Lease reaper stopped");
    }
}
