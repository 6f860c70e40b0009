//! Job definitions and the registry that holds them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    cadence::Cadence,
    error::{Result, SchedulerError},
    state::SharedState,
};

/// Everything a handler invocation gets to see.
#[derive(Clone)]
pub struct JobContext {
    job: String,
    fired_at: DateTime<Utc>,
    state: Arc<SharedState>,
}

impl JobContext {
    pub fn new(job: impl Into<String>, fired_at: DateTime<Utc>, state: Arc<SharedState>) -> Self {
        Self {
            job: job.into(),
            fired_at,
            state,
        }
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    /// The scheduled fire instant, not the moment the handler started.
    pub fn fired_at(&self) -> DateTime<Utc> {
        self.fired_at
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.state.now()
    }
}

/// Work performed on every fire of a job.
///
/// An `Err` (or a panic) is caught by the engine, logged with the job name
/// and fire instant, and never reaches other jobs.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn run(&self, ctx: &JobContext) -> anyhow::Result<()>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> JobHandler for FnHandler<F>
where
    F: Fn(JobContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self, ctx: &JobContext) -> anyhow::Result<()> {
        (self.0)(ctx.clone()).await
    }
}

/// Wrap an async closure as a [`JobHandler`].
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn JobHandler>
where
    F: Fn(JobContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// A registered job. Immutable once registered.
pub struct JobDefinition {
    pub name: String,
    pub cadence: Cadence,
    pub handler: Arc<dyn JobHandler>,
    /// Upper bound on a single invocation.
    pub timeout: Duration,
}

impl std::fmt::Debug for JobDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobDefinition")
            .field("name", &self.name)
            .field("cadence", &self.cadence.expression())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Named jobs in registration order.
pub struct JobRegistry {
    jobs: Vec<Arc<JobDefinition>>,
    default_timeout: Duration,
}

impl JobRegistry {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            jobs: Vec::new(),
            default_timeout,
        }
    }

    /// Register with the registry's default timeout.
    pub fn register(
        &mut self,
        name: &str,
        cadence: &str,
        handler: Arc<dyn JobHandler>,
    ) -> Result<()> {
        let timeout = self.default_timeout;
        self.register_with_timeout(name, cadence, handler, timeout)
    }

    pub fn register_with_timeout(
        &mut self,
        name: &str,
        cadence: &str,
        handler: Arc<dyn JobHandler>,
        timeout: Duration,
    ) -> Result<()> {
        if name.trim().is_empty() {
            return Err(SchedulerError::Validation {
                field: "name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.get(name).is_some() {
            return Err(SchedulerError::DuplicateJobName {
                name: name.to_string(),
            });
        }
        let cadence = Cadence::parse(cadence)?;

        debug!(job = %name, %cadence, timeout_ms = timeout.as_millis() as u64, "job registered");
        self.jobs.push(Arc::new(JobDefinition {
            name: name.to_string(),
            cadence,
            handler,
            timeout,
        }));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<JobDefinition>> {
        self.jobs.iter().find(|j| j.name == name)
    }

    /// Registration order.
    pub fn all(&self) -> &[Arc<JobDefinition>] {
        &self.jobs
    }

    pub fn names(&self) -> Vec<String> {
        self.jobs.iter().map(|j| j.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}
