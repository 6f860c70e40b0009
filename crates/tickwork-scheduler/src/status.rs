//! Per-job runtime records, readable while the engine runs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::{error::SchedulerError, registry::JobDefinition, types::JobState};

/// Snapshot of one job's runtime bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub name: String,
    pub cadence: String,
    pub timeout_ms: u64,
    pub state: JobState,
    pub last_fired_at: Option<DateTime<Utc>>,
    pub last_finished_at: Option<DateTime<Utc>>,
    pub next_fire_at: Option<DateTime<Utc>>,
    /// Invocations that returned `Ok`.
    pub runs: u64,
    /// Fire instants dropped because the job was still running or the
    /// engine was behind.
    pub skipped: u64,
    /// Invocations that errored, panicked or timed out.
    pub failures: u64,
    /// Subset of `failures` caused by the per-job timeout.
    pub timeouts: u64,
    pub last_error: Option<String>,
    #[serde(skip)]
    order: usize,
}

/// Concurrent map of job name to [`JobRecord`].
///
/// The `state` field doubles as the skip-if-running gate: the transition to
/// `Running` happens under the map's shard lock in [`JobStatusBoard::try_begin`].
pub struct JobStatusBoard {
    records: DashMap<String, JobRecord>,
}

impl JobStatusBoard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: DashMap::new(),
        })
    }

    pub fn register(&self, def: &JobDefinition, next_fire_at: Option<DateTime<Utc>>) {
        let order = self.records.len();
        self.records.insert(
            def.name.clone(),
            JobRecord {
                name: def.name.clone(),
                cadence: def.cadence.expression().to_string(),
                timeout_ms: def.timeout.as_millis() as u64,
                state: JobState::Idle,
                last_fired_at: None,
                last_finished_at: None,
                next_fire_at,
                runs: 0,
                skipped: 0,
                failures: 0,
                timeouts: 0,
                last_error: None,
                order,
            },
        );
    }

    /// Move `name` from idle to running. Returns `false` (and counts a skip)
    /// when the previous invocation has not finished yet.
    pub fn try_begin(&self, name: &str, fired_at: DateTime<Utc>) -> bool {
        let Some(mut record) = self.records.get_mut(name) else {
            return false;
        };
        match record.state {
            JobState::Running => {
                record.skipped += 1;
                false
            }
            JobState::Idle => {
                record.state = JobState::Running;
                record.last_fired_at = Some(fired_at);
                true
            }
        }
    }

    /// Return `name` to idle and record how the invocation ended.
    pub fn finish(
        &self,
        name: &str,
        outcome: Result<(), &SchedulerError>,
        finished_at: DateTime<Utc>,
    ) {
        if let Some(mut record) = self.records.get_mut(name) {
            record.state = JobState::Idle;
            record.last_finished_at = Some(finished_at);
            match outcome {
                Ok(()) => record.runs += 1,
                Err(e) => {
                    record.failures += 1;
                    if matches!(e, SchedulerError::HandlerTimeout { .. }) {
                        record.timeouts += 1;
                    }
                    record.last_error = Some(e.to_string());
                }
            }
        }
    }

    pub fn mark_skipped(&self, name: &str) {
        if let Some(mut record) = self.records.get_mut(name) {
            record.skipped += 1;
        }
    }

    pub fn set_next_fire(&self, name: &str, next_fire_at: Option<DateTime<Utc>>) {
        if let Some(mut record) = self.records.get_mut(name) {
            record.next_fire_at = next_fire_at;
        }
    }

    pub fn get(&self, name: &str) -> Option<JobRecord> {
        self.records.get(name).map(|r| r.value().clone())
    }

    /// All records in registration order.
    pub fn all(&self) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.order);
        records
    }

    pub fn running(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|r| r.state == JobState::Running)
            .map(|r| r.name)
            .collect()
    }
}
