//! Shared state handed to every job: the metrics ledger (with the execution
//! counter) and the notification queue, each behind its own `RwLock`.
//!
//! Every mutation takes the write lock of the collection it touches; reads
//! take the read lock, so a reader never observes a half-applied write.
//! Guards are never held across an `.await`.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    clock::{Clock, SystemClock},
    error::{Result, SchedulerError},
    ledger::MetricsLedger,
    queue::NotificationQueue,
    types::{
        HealthSnapshot, MetricsOverview, Notification, QueueOverview, StateCounters,
        SubmitReceipt,
    },
};

/// Number of snapshots included in [`MetricsOverview::last_10_metrics`].
pub const OVERVIEW_SNAPSHOTS: usize = 10;

pub struct SharedState {
    ledger: RwLock<MetricsLedger>,
    queue: RwLock<NotificationQueue>,
    clock: Arc<dyn Clock>,
}

impl SharedState {
    pub fn new(max_retention: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: RwLock::new(MetricsLedger::new(max_retention)),
            queue: RwLock::new(NotificationQueue::new()),
            clock,
        }
    }

    pub fn with_system_clock(max_retention: usize) -> Self {
        Self::new(max_retention, Arc::new(SystemClock))
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // --- ledger -------------------------------------------------------------

    /// Capture a health snapshot and count one monitoring execution in a
    /// single critical section. The snapshot carries the counter value from
    /// before the increment.
    pub fn record_health(&self, memory_usage: impl Into<String>, active_jobs: usize) -> HealthSnapshot {
        let mut ledger = write(&self.ledger);
        let snapshot = HealthSnapshot {
            captured_at: self.clock.now(),
            memory_usage: memory_usage.into(),
            active_jobs,
            jobs_executed: ledger.total_executed(),
        };
        ledger.append(snapshot.clone());
        ledger.record_execution();
        snapshot
    }

    pub fn append_snapshot(&self, snapshot: HealthSnapshot) {
        write(&self.ledger).append(snapshot);
    }

    /// Returns the new total.
    pub fn record_execution(&self) -> u64 {
        write(&self.ledger).record_execution()
    }

    pub fn evict_metrics_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        write(&self.ledger).evict_older_than(cutoff)
    }

    pub fn last_metrics(&self, n: usize) -> Vec<HealthSnapshot> {
        read(&self.ledger).last_n(n)
    }

    pub fn metrics_len(&self) -> usize {
        read(&self.ledger).len()
    }

    pub fn jobs_executed(&self) -> u64 {
        read(&self.ledger).total_executed()
    }

    // --- queue --------------------------------------------------------------

    pub fn enqueue(&self, notification: Notification) {
        write(&self.queue).enqueue(notification);
    }

    pub fn drain_notifications(&self) -> Vec<Notification> {
        write(&self.queue).drain_all()
    }

    pub fn queue_len(&self) -> usize {
        read(&self.queue).len()
    }

    // --- query / mutation surface -------------------------------------------

    pub fn metrics_overview(&self) -> MetricsOverview {
        let ledger = read(&self.ledger);
        MetricsOverview {
            total_metrics: ledger.len(),
            jobs_executed: ledger.total_executed(),
            last_10_metrics: ledger.last_n(OVERVIEW_SNAPSHOTS),
        }
    }

    /// Counter, ledger length and queue length as of one instant. The ledger
    /// guard is held while the queue is read; locks are always taken in
    /// ledger-then-queue order.
    pub fn counters(&self) -> StateCounters {
        let ledger = read(&self.ledger);
        let queue = read(&self.queue);
        StateCounters {
            jobs_executed: ledger.total_executed(),
            metrics_collected: ledger.len(),
            notifications_queued: queue.len(),
        }
    }

    pub fn queue_overview(&self) -> QueueOverview {
        let queue = read(&self.queue);
        QueueOverview {
            queue_size: queue.len(),
            notifications: queue.snapshot(),
        }
    }

    /// Validate and enqueue an externally submitted notification.
    ///
    /// Every field must contain something other than whitespace; on
    /// rejection nothing is queued.
    pub fn submit_notification(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<SubmitReceipt> {
        for (field, value) in [("recipient", recipient), ("subject", subject), ("body", body)] {
            if value.trim().is_empty() {
                return Err(SchedulerError::Validation {
                    field: field.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }

        let notification = Notification::new(recipient, subject, body, self.clock.now());
        let id = notification.id;
        self.enqueue(notification);
        info!(%recipient, %id, "notification submitted");
        Ok(SubmitReceipt::queued(id))
    }

    /// The full ledger as pretty-printed JSON.
    pub fn export_metrics(&self) -> Result<String> {
        let entries = read(&self.ledger).entries();
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    /// Write [`SharedState::export_metrics`] to `path`, creating parent
    /// directories as needed.
    pub fn export_metrics_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.export_metrics()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "metrics exported");
        Ok(())
    }
}

// A panicking writer cannot leave either collection half-updated: every
// mutation is a single VecDeque call or counter bump, so poisoned guards are
// safe to reuse.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
