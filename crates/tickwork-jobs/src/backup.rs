//! `db-backup`: simulated database dump.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tickwork_scheduler::{JobContext, JobHandler};
use tracing::info;

pub struct BackupSimulator {
    directory: String,
    duration: Duration,
}

impl BackupSimulator {
    pub fn new(directory: impl Into<String>, duration: Duration) -> Self {
        Self {
            directory: directory.into(),
            duration,
        }
    }

    pub fn file_name(&self, at: DateTime<Utc>) -> String {
        format!(
            "{}/backup_{}.sql",
            self.directory.trim_end_matches('/'),
            at.format("%Y%m%d_%H%M%S")
        )
    }
}

#[async_trait]
impl JobHandler for BackupSimulator {
    async fn run(&self, ctx: &JobContext) -> anyhow::Result<()> {
        let file = self.file_name(ctx.fired_at());
        info!(%file, "starting backup");

        tokio::time::sleep(self.duration).await;

        info!(%file, elapsed_ms = self.duration.as_millis() as u64, "backup completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tickwork_scheduler::SharedState;

    #[test]
    fn file_name_uses_fire_instant() {
        let backup = BackupSimulator::new("backups/", Duration::ZERO);
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 6, 0, 0).unwrap();
        assert_eq!(backup.file_name(at), "backups/backup_20261019_060000.sql");
    }

    #[tokio::test(start_paused = true)]
    async fn run_takes_the_simulated_duration() {
        let state = Arc::new(SharedState::with_system_clock(100));
        let ctx = JobContext::new("db-backup", state.now(), Arc::clone(&state));
        let started = tokio::time::Instant::now();

        BackupSimulator::new("backups", Duration::from_millis(100))
            .run(&ctx)
            .await
            .unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(100));
    }
}
