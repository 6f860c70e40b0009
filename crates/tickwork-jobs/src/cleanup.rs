//! `data-cleanup`: drops health snapshots past the retention age.

use async_trait::async_trait;
use chrono::Duration;
use tickwork_scheduler::{JobContext, JobHandler};
use tracing::info;

pub struct LogCleanup {
    max_age: Duration,
}

impl LogCleanup {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }
}

#[async_trait]
impl JobHandler for LogCleanup {
    async fn run(&self, ctx: &JobContext) -> anyhow::Result<()> {
        let cutoff = ctx.now() - self.max_age;
        let removed = ctx.state().evict_metrics_older_than(cutoff);
        info!(removed, cutoff = %cutoff, "cleaned old health records");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use tickwork_scheduler::{HealthSnapshot, SharedState, TokioClock};

    #[tokio::test(start_paused = true)]
    async fn removes_only_records_past_max_age() {
        let now = Utc.with_ymd_and_hms(2026, 2, 2, 12, 0, 0).unwrap();
        let state = Arc::new(SharedState::new(100, Arc::new(TokioClock::starting_at(now))));
        for hours_ago in [30, 25, 24, 23, 1] {
            state.append_snapshot(HealthSnapshot {
                captured_at: now - Duration::hours(hours_ago),
                memory_usage: "125MB".to_string(),
                active_jobs: 6,
                jobs_executed: hours_ago as u64,
            });
        }

        let ctx = JobContext::new("data-cleanup", now, Arc::clone(&state));
        LogCleanup::new(Duration::hours(24)).run(&ctx).await.unwrap();

        let left: Vec<u64> = state.last_metrics(10).iter().map(|s| s.jobs_executed).collect();
        assert_eq!(left, vec![23, 1]);

        // Nothing left to remove on a second pass.
        LogCleanup::new(Duration::hours(24)).run(&ctx).await.unwrap();
        assert_eq!(state.metrics_len(), 2);
    }
}
