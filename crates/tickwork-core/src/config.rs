use std::collections::BTreeMap;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_METRICS_RETENTION: usize = 100;
pub const DEFAULT_METRICS_MAX_AGE_HOURS: u64 = 24;
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;
pub const DEFAULT_REPORT_RECIPIENT: &str = "admin@example.com";

/// Top-level config (tickwork.toml + TICKWORK_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickworkConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Per-job overrides keyed by job name, e.g. `[jobs.db-backup]`.
    #[serde(default)]
    pub jobs: BTreeMap<String, JobConfig>,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub backup: BackupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Time budget for a single handler invocation unless the job overrides it.
    #[serde(default = "default_job_timeout_secs")]
    pub default_timeout_secs: u64,
    /// How long shutdown waits for in-flight handlers before abandoning them.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
    /// Maximum number of health snapshots kept in the ledger.
    #[serde(default = "default_metrics_retention")]
    pub metrics_retention: usize,
    /// Snapshots older than this are removed by the cleanup job.
    #[serde(default = "default_metrics_max_age_hours")]
    pub metrics_max_age_hours: u64,
    /// When set, the full ledger is written here as JSON on shutdown.
    pub export_path: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
            metrics_retention: DEFAULT_METRICS_RETENTION,
            metrics_max_age_hours: DEFAULT_METRICS_MAX_AGE_HOURS,
            export_path: None,
        }
    }
}

impl SchedulerConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Override for one built-in job. Unset fields keep the job's defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub cadence: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default = "bool_true")]
    pub enabled: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            cadence: None,
            timeout_secs: None,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Address the daily report notification is queued for.
    #[serde(default = "default_report_recipient")]
    pub recipient: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            recipient: default_report_recipient(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_endpoints")]
    pub endpoints: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            endpoints: default_probe_endpoints(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Directory the (simulated) backup file name is placed under.
    #[serde(default = "default_backup_directory")]
    pub directory: String,
    #[serde(default = "default_backup_duration_ms")]
    pub simulated_duration_ms: u64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            directory: default_backup_directory(),
            simulated_duration_ms: default_backup_duration_ms(),
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_job_timeout_secs() -> u64 {
    DEFAULT_JOB_TIMEOUT_SECS
}
fn default_shutdown_grace_secs() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_SECS
}
fn default_metrics_retention() -> usize {
    DEFAULT_METRICS_RETENTION
}
fn default_metrics_max_age_hours() -> u64 {
    DEFAULT_METRICS_MAX_AGE_HOURS
}
fn default_report_recipient() -> String {
    DEFAULT_REPORT_RECIPIENT.to_string()
}
fn default_probe_endpoints() -> Vec<String> {
    vec![
        "https://api.service1.com/health".to_string(),
        "https://api.service2.com/status".to_string(),
        "https://api.service3.com/ping".to_string(),
    ]
}
fn default_backup_directory() -> String {
    "backups".to_string()
}
fn default_backup_duration_ms() -> u64 {
    100
}

impl TickworkConfig {
    /// Load config from a TOML file with TICKWORK_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `TICKWORK_SCHEDULER__SHUTDOWN_GRACE_SECS=10`. A missing file is not an
    /// error; every section has defaults.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: TickworkConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("TICKWORK_").split("__"))
            .extract()
            .map_err(|e| crate::error::TickworkError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Override block for `name`, if the config has one.
    pub fn job(&self, name: &str) -> Option<&JobConfig> {
        self.jobs.get(name)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.tickwork/tickwork.toml", home)
}
