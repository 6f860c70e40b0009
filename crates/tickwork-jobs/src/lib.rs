//! Built-in jobs and their default cadences.
//!
//! | Job                | Default cadence     | Handler                       |
//! |--------------------|---------------------|-------------------------------|
//! | `system-monitor`   | every 30 s          | [`monitor::SystemMonitor`]    |
//! | `data-cleanup`     | hourly              | [`cleanup::LogCleanup`]       |
//! | `daily-report`     | 09:00 UTC           | [`report::DailyReport`]       |
//! | `email-processor`  | every 2 min         | [`processor::QueueProcessor`] |
//! | `db-backup`        | every 6 h           | [`backup::BackupSimulator`]   |
//! | `api-health-check` | every 15 s          | [`probe::HealthProber`]       |
//!
//! Each can be re-timed or disabled through `[jobs.<name>]` in the config.

pub mod backup;
pub mod cleanup;
pub mod monitor;
pub mod probe;
pub mod processor;
pub mod report;

use std::sync::Arc;
use std::time::Duration;

use tickwork_core::TickworkConfig;
use tickwork_scheduler::{JobHandler, JobRegistry, SchedulerError};
use tracing::info;

pub const SYSTEM_MONITOR: &str = "system-monitor";
pub const DATA_CLEANUP: &str = "data-cleanup";
pub const DAILY_REPORT: &str = "daily-report";
pub const EMAIL_PROCESSOR: &str = "email-processor";
pub const DB_BACKUP: &str = "db-backup";
pub const API_HEALTH_CHECK: &str = "api-health-check";

/// Built-in jobs with their default cadence, in registration order.
pub const BUILTIN_JOBS: [(&str, &str); 6] = [
    (SYSTEM_MONITOR, "*/30 * * * * *"),
    (DATA_CLEANUP, "0 0 * * * *"),
    (DAILY_REPORT, "0 0 9 * * *"),
    (EMAIL_PROCESSOR, "0 */2 * * * *"),
    (DB_BACKUP, "0 0 */6 * * *"),
    (API_HEALTH_CHECK, "*/15 * * * * *"),
];

/// Register every enabled built-in job. Returns the registered names.
///
/// Fails on the first invalid cadence override or duplicate name; both are
/// startup errors.
pub fn register_builtin_jobs(
    registry: &mut JobRegistry,
    config: &TickworkConfig,
) -> tickwork_scheduler::Result<Vec<String>> {
    let enabled: Vec<(&str, &str)> = BUILTIN_JOBS
        .iter()
        .copied()
        .filter(|(name, _)| config.job(name).map_or(true, |j| j.enabled))
        .collect();

    for &(name, default_cadence) in &enabled {
        let overrides = config.job(name);
        let cadence = overrides
            .and_then(|j| j.cadence.as_deref())
            .unwrap_or(default_cadence);
        let timeout = overrides
            .and_then(|j| j.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or_else(|| registry.default_timeout());

        let handler =
            builtin_handler(name, config, enabled.len()).ok_or_else(|| SchedulerError::Validation {
                field: "job".to_string(),
                reason: format!("'{name}' is not a built-in job"),
            })?;
        registry.register_with_timeout(name, cadence, handler, timeout)?;
        info!(job = %name, %cadence, "built-in job registered");
    }

    Ok(enabled.iter().map(|(name, _)| name.to_string()).collect())
}

fn builtin_handler(
    name: &str,
    config: &TickworkConfig,
    active_jobs: usize,
) -> Option<Arc<dyn JobHandler>> {
    let handler: Arc<dyn JobHandler> = match name {
        SYSTEM_MONITOR => Arc::new(monitor::SystemMonitor::new(active_jobs)),
        DATA_CLEANUP => Arc::new(cleanup::LogCleanup::new(chrono::Duration::hours(
            config.scheduler.metrics_max_age_hours as i64,
        ))),
        DAILY_REPORT => Arc::new(report::DailyReport::new(config.report.recipient.clone())),
        EMAIL_PROCESSOR => Arc::new(processor::QueueProcessor),
        DB_BACKUP => Arc::new(backup::BackupSimulator::new(
            config.backup.directory.clone(),
            Duration::from_millis(config.backup.simulated_duration_ms),
        )),
        API_HEALTH_CHECK => Arc::new(probe::HealthProber::new(config.probe.endpoints.clone())),
        _ => return None,
    };
    Some(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickwork_core::config::JobConfig;

    #[test]
    fn registers_all_six_by_default() {
        let mut registry = JobRegistry::new(Duration::from_secs(300));
        let names = register_builtin_jobs(&mut registry, &TickworkConfig::default()).unwrap();
        assert_eq!(
            names,
            vec![
                SYSTEM_MONITOR,
                DATA_CLEANUP,
                DAILY_REPORT,
                EMAIL_PROCESSOR,
                DB_BACKUP,
                API_HEALTH_CHECK
            ]
        );
        assert_eq!(registry.names(), names);
        assert_eq!(
            registry.get(API_HEALTH_CHECK).unwrap().cadence.expression(),
            "*/15 * * * * *"
        );
    }

    #[test]
    fn overrides_retime_and_disable() {
        let mut config = TickworkConfig::default();
        config.jobs.insert(
            DB_BACKUP.to_string(),
            JobConfig {
                cadence: Some("0 0 3 * * *".to_string()),
                timeout_secs: Some(60),
                enabled: true,
            },
        );
        config.jobs.insert(
            API_HEALTH_CHECK.to_string(),
            JobConfig {
                enabled: false,
                ..JobConfig::default()
            },
        );

        let mut registry = JobRegistry::new(Duration::from_secs(300));
        let names = register_builtin_jobs(&mut registry, &config).unwrap();

        assert_eq!(names.len(), 5);
        assert!(registry.get(API_HEALTH_CHECK).is_none());
        let backup = registry.get(DB_BACKUP).unwrap();
        assert_eq!(backup.cadence.expression(), "0 0 3 * * *");
        assert_eq!(backup.timeout, Duration::from_secs(60));
        assert_eq!(
            registry.get(SYSTEM_MONITOR).unwrap().timeout,
            Duration::from_secs(300)
        );
    }

    #[test]
    fn invalid_override_fails_registration() {
        let mut config = TickworkConfig::default();
        config.jobs.insert(
            DATA_CLEANUP.to_string(),
            JobConfig {
                cadence: Some("hourly".to_string()),
                ..JobConfig::default()
            },
        );
        let mut registry = JobRegistry::new(Duration::from_secs(300));
        let err = register_builtin_jobs(&mut registry, &config).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidCadence { .. }));
    }

    #[test]
    fn only_builtin_names_have_handlers() {
        let config = TickworkConfig::default();
        for (name, _) in BUILTIN_JOBS {
            assert!(builtin_handler(name, &config, 6).is_some(), "{name}");
        }
        assert!(builtin_handler("api-health", &config, 6).is_none());
        assert!(builtin_handler("", &config, 6).is_none());
    }

    #[test]
    fn registering_twice_is_a_duplicate() {
        let mut registry = JobRegistry::new(Duration::from_secs(300));
        register_builtin_jobs(&mut registry, &TickworkConfig::default()).unwrap();
        let err = register_builtin_jobs(&mut registry, &TickworkConfig::default()).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateJobName { .. }));
    }
}
