// Task Domain Model

use super::error::{DomainError, Result};
use super::lease::LeasePolicy;
use super::resource::NamespaceId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Task ID (caller-supplied or generated by an IdProvider)
pub type TaskId = String;

/// Task Status
///
/// ```text
/// idle -> in_progress -> {done, failed, timeout}
///                          failed/timeout -> idle       (retries left, requeue enabled)
/// idle (no retries left) -> exhausted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Idle,
    InProgress,
    Done,
    Failed,
    Timeout,
    Exhausted,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Idle => "idle",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
            TaskStatus::Timeout => "timeout",
            TaskStatus::Exhausted => "exhausted",
        }
    }

    /// Statuses a worker may hand a task back with via Release
    pub fn is_release_target(&self) -> bool {
        matches!(
            self,
            TaskStatus::Idle | TaskStatus::Done | TaskStatus::Failed | TaskStatus::Timeout
        )
    }

    /// Statuses that reconciliation may send back to idle
    pub fn is_requeueable(&self) -> bool {
        matches!(self, TaskStatus::Failed | TaskStatus::Timeout)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "idle" => Ok(TaskStatus::Idle),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            "failed" => Ok(TaskStatus::Failed),
            "timeout" => Ok(TaskStatus::Timeout),
            "exhausted" => Ok(TaskStatus::Exhausted),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Task Entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub namespace_id: NamespaceId,
    /// Lease duration in seconds, 0 = server default
    pub timeout: u32,
    pub retries_left: u32,
    /// Epoch ms of the last status change (lease start while in_progress)
    pub updated_at: i64,
    pub status: TaskStatus,
}

impl Task {
    /// Create a new idle task
    ///
    /// # Arguments
    ///
    /// * `id` - Unique task ID (injected, not generated)
    /// * `namespace_id` - Owning namespace
    /// * `timeout` - Lease duration in seconds (0 = server default)
    /// * `retries_left` - Capture budget
    /// * `now_millis` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(
        id: impl Into<String>,
        namespace_id: impl Into<String>,
        timeout: u32,
        retries_left: u32,
        now_millis: i64,
    ) -> Self {
        Self {
            id: id.into(),
            namespace_id: namespace_id.into(),
            timeout,
            retries_left,
            updated_at: now_millis,
            status: TaskStatus::Idle,
        }
    }

    /// Effective lease duration in ms, falling back to the policy default
    pub fn lease_duration_millis(&self, policy: &LeasePolicy) -> i64 {
        let secs = if self.timeout > 0 {
            self.timeout
        } else {
            policy.default_timeout_secs
        };
        i64::from(secs) * 1000
    }

    /// Lease expiry in epoch ms, `None` when the task is not leased
    pub fn lease_expires_at(&self, policy: &LeasePolicy) -> Option<i64> {
        (self.status == TaskStatus::InProgress)
            .then(|| self.updated_at + self.lease_duration_millis(policy))
    }

    /// A task is leased iff it is in_progress and `now < acquired_at + timeout`
    pub fn is_leased(&self, now_millis: i64, policy: &LeasePolicy) -> bool {
        self.lease_expires_at(policy)
            .is_some_and(|expires_at| now_millis < expires_at)
    }

    /// Whether Capture may select this task
    pub fn is_capturable(&self) -> bool {
        self.status == TaskStatus::Idle && self.retries_left > 0
    }

    /// Lease the task: idle -> in_progress, spending one retry
    pub fn capture(&mut self, now_millis: i64) -> Result<()> {
        if self.status != TaskStatus::Idle {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: TaskStatus::InProgress.to_string(),
            });
        }
        if self.retries_left == 0 {
            return Err(DomainError::RetriesExhausted(self.id.clone()));
        }
        self.retries_left -= 1;
        self.status = TaskStatus::InProgress;
        self.updated_at = now_millis;
        Ok(())
    }

    /// Set a release status. The current status is not checked.
    pub fn release(&mut self, status: TaskStatus, now_millis: i64) -> Result<()> {
        if !status.is_release_target() {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }
        self.status = status;
        self.updated_at = now_millis;
        Ok(())
    }

    /// Apply one reconciliation pass to this task.
    ///
    /// Same order as the store: expire, then requeue, then exhaust.
    pub fn reconcile(&mut self, now_millis: i64, policy: &LeasePolicy) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();

        if self.status == TaskStatus::InProgress && !self.is_leased(now_millis, policy) {
            self.status = TaskStatus::Timeout;
            self.updated_at = now_millis;
            outcome.expired = true;
        }

        if policy.requeue_on_failure && self.status.is_requeueable() && self.retries_left > 0 {
            self.status = TaskStatus::Idle;
            self.updated_at = now_millis;
            outcome.requeued = true;
        }

        if self.status == TaskStatus::Idle && self.retries_left == 0 {
            self.status = TaskStatus::Exhausted;
            self.updated_at = now_millis;
            outcome.exhausted = true;
        }

        outcome
    }
}

/// What a reconciliation pass did to a single task
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub expired: bool,
    pub requeued: bool,
    pub exhausted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> LeasePolicy {
        LeasePolicy {
            default_timeout_secs: 30,
            ..LeasePolicy::default()
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            TaskStatus::Idle,
            TaskStatus::InProgress,
            TaskStatus::Done,
            TaskStatus::Failed,
            TaskStatus::Timeout,
            TaskStatus::Exhausted,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("running".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_capture_spends_one_retry() {
        let mut task = Task::new("t1", "ns-1", 10, 5, 1_000);
        task.capture(2_000).unwrap();

        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.retries_left, 4);
        assert_eq!(task.updated_at, 2_000);
    }

    #[test]
    fn test_capture_rejects_non_idle() {
        let mut task = Task::new("t1", "ns-1", 10, 5, 1_000);
        task.capture(2_000).unwrap();

        let err = task.capture(3_000).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStatusTransition { .. }));
        assert_eq!(task.retries_left, 4);
    }

    #[test]
    fn test_capture_rejects_empty_budget() {
        let mut task = Task::new("t1", "ns-1", 10, 0, 1_000);
        let err = task.capture(2_000).unwrap_err();
        assert!(matches!(err, DomainError::RetriesExhausted(_)));
        assert_eq!(task.status, TaskStatus::Idle);
    }

    #[test]
    fn test_release_only_accepts_release_targets() {
        let mut task = Task::new("t1", "ns-1", 10, 5, 1_000);
        assert!(task.release(TaskStatus::InProgress, 2_000).is_err());
        assert!(task.release(TaskStatus::Exhausted, 2_000).is_err());

        task.release(TaskStatus::Done, 2_000).unwrap();
        assert_eq!(task.status, TaskStatus::Done);
    }

    #[test]
    fn test_lease_uses_default_timeout_when_zero() {
        let mut task = Task::new("t1", "ns-1", 0, 5, 0);
        task.capture(1_000).unwrap();

        assert_eq!(task.lease_expires_at(&policy()), Some(31_000));
        assert!(task.is_leased(30_999, &policy()));
        assert!(!task.is_leased(31_000, &policy()));
    }

    #[test]
    fn test_reconcile_expires_then_requeues() {
        let mut task = Task::new("t1", "ns-1", 10, 2, 0);
        task.capture(1_000).unwrap();

        let outcome = task.reconcile(11_000, &policy());
        assert!(outcome.expired);
        assert!(outcome.requeued);
        assert_eq!(task.status, TaskStatus::Idle);
        assert_eq!(task.retries_left, 1);
    }

    #[test]
    fn test_reconcile_keeps_live_lease() {
        let mut task = Task::new("t1", "ns-1", 10, 2, 0);
        task.capture(1_000).unwrap();

        let outcome = task.reconcile(10_999, &policy());
        assert_eq!(outcome, ReconcileOutcome::default());
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[test]
    fn test_reconcile_leaves_spent_failure_terminal() {
        let mut task = Task::new("t1", "ns-1", 10, 1, 0);
        task.capture(1_000).unwrap();
        task.release(TaskStatus::Failed, 2_000).unwrap();

        let outcome = task.reconcile(3_000, &policy());
        assert_eq!(outcome, ReconcileOutcome::default());
        assert_eq!(task.status, TaskStatus::Failed);
    }

    #[test]
    fn test_reconcile_exhausts_idle_without_budget() {
        let mut task = Task::new("t1", "ns-1", 10, 0, 0);
        let outcome = task.reconcile(1_000, &policy());
        assert!(outcome.exhausted);
        assert_eq!(task.status, TaskStatus::Exhausted);
    }

    #[test]
    fn test_reconcile_without_requeue_keeps_failed() {
        let strict = LeasePolicy {
            requeue_on_failure: false,
            ..policy()
        };
        let mut task = Task::new("t1", "ns-1", 10, 3, 0);
        task.capture(1_000).unwrap();
        task.release(TaskStatus::Failed, 2_000).unwrap();

        task.reconcile(3_000, &strict);
        assert_eq!(task.status, TaskStatus::Failed);
    }
}
