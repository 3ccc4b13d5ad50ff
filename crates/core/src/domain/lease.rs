// Lease Policy Domain Model

use serde::{Deserialize, Serialize};

/// Default lease duration when a task is registered with timeout 0 (60s)
pub const DEFAULT_LEASE_TIMEOUT_SECS: u32 = 60;

/// Default capture budget when a task is registered without retries_left
pub const DEFAULT_RETRIES: u32 = 3;

/// Upper bound on a single Capture batch
pub const DEFAULT_MAX_CAPTURE_BATCH: u32 = 1000;

/// Server-side lease and retry policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeasePolicy {
    /// Lease duration applied to tasks registered with timeout 0
    pub default_timeout_secs: u32,
    /// Budget applied to tasks registered without retries_left
    pub default_retries: u32,
    /// Capture limits above this are clamped
    pub max_capture_batch: u32,
    /// Send failed/timeout tasks with budget left back to idle during reconciliation
    pub requeue_on_failure: bool,
}

impl Default for LeasePolicy {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_LEASE_TIMEOUT_SECS,
            default_retries: DEFAULT_RETRIES,
            max_capture_batch: DEFAULT_MAX_CAPTURE_BATCH,
            requeue_on_failure: true,
        }
    }
}

/// Counts produced by one reconciliation sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    /// in_progress -> timeout
    pub expired: u64,
    /// failed/timeout -> idle
    pub requeued: u64,
    /// idle without budget -> exhausted
    pub exhausted: u64,
}

impl ReconcileStats {
    pub fn is_empty(&self) -> bool {
        self.expired == 0 && self.requeued == 0 && self.exhausted == 0
    }
}

impl std::ops::AddAssign for ReconcileStats {
    fn add_assign(&mut self, other: Self) {
        self.expired += other.expired;
        self.requeued += other.requeued;
        self.exhausted += other.exhausted;
    }
}
