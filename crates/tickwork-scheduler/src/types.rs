use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One health sample recorded by the monitoring job. Never mutated after
/// creation; leaves the ledger only through eviction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub captured_at: DateTime<Utc>,
    pub memory_usage: String,
    pub active_jobs: usize,
    /// Value of the execution counter at capture time.
    pub jobs_executed: u64,
}

/// A pending outbound message. Leaves the queue only through a full drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub enqueued_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            enqueued_at,
        }
    }
}

/// Runtime state of a registered job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting for the next fire instant.
    Idle,
    /// A handler invocation is in progress.
    Running,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Idle => "idle",
            JobState::Running => "running",
        };
        write!(f, "{s}")
    }
}

/// Read-only view returned by `GET /metrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsOverview {
    pub total_metrics: usize,
    pub jobs_executed: u64,
    pub last_10_metrics: Vec<HealthSnapshot>,
}

/// Counters read together at one instant, for derived reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounters {
    pub jobs_executed: u64,
    pub metrics_collected: usize,
    pub notifications_queued: usize,
}

/// Non-draining view of the notification queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueOverview {
    pub queue_size: usize,
    pub notifications: Vec<Notification>,
}

/// Acknowledgement for an accepted notification submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub status: String,
    pub id: Uuid,
    pub message: String,
}

impl SubmitReceipt {
    pub fn queued(id: Uuid) -> Self {
        Self {
            status: "queued".to_string(),
            id,
            message: "Notification added to queue".to_string(),
        }
    }
}
