//! `system-monitor`: records a health snapshot and counts the execution.

use async_trait::async_trait;
use tickwork_scheduler::{JobContext, JobHandler};
use tracing::info;

pub struct SystemMonitor {
    active_jobs: usize,
}

impl SystemMonitor {
    pub fn new(active_jobs: usize) -> Self {
        Self { active_jobs }
    }
}

#[async_trait]
impl JobHandler for SystemMonitor {
    async fn run(&self, ctx: &JobContext) -> anyhow::Result<()> {
        let snapshot = ctx
            .state()
            .record_health(resident_memory_label(), self.active_jobs);
        info!(
            memory = %snapshot.memory_usage,
            jobs_executed = snapshot.jobs_executed,
            "health check recorded"
        );
        Ok(())
    }
}

/// Resident set size of this process, e.g. `"42MB"`, or `"unknown"` where
/// `/proc` is unavailable.
pub fn resident_memory_label() -> String {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| parse_vm_rss_kb(&status))
        .map(|kb| format!("{}MB", kb / 1024))
        .unwrap_or_else(|| "unknown".to_string())
}

fn parse_vm_rss_kb(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tickwork_scheduler::SharedState;

    #[test]
    fn parses_vm_rss_line() {
        let status = "Name:\ttickwork\nVmPeak:\t  200000 kB\nVmRSS:\t  128000 kB\nThreads:\t8\n";
        assert_eq!(parse_vm_rss_kb(status), Some(128_000));
        assert_eq!(parse_vm_rss_kb("Name:\tx\n"), None);
    }

    #[tokio::test]
    async fn each_run_appends_and_counts() {
        let state = Arc::new(SharedState::with_system_clock(100));
        let monitor = SystemMonitor::new(6);
        for _ in 0..3 {
            let ctx = JobContext::new("system-monitor", state.now(), Arc::clone(&state));
            monitor.run(&ctx).await.unwrap();
        }

        assert_eq!(state.jobs_executed(), 3);
        let history = state.last_metrics(10);
        assert_eq!(history.len(), 3);
        assert_eq!(
            history.iter().map(|s| s.jobs_executed).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(history.iter().all(|s| s.active_jobs == 6 && !s.memory_usage.is_empty()));
    }
}
