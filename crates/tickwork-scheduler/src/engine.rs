use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    error::SchedulerError,
    registry::{JobContext, JobDefinition, JobRegistry},
    state::SharedState,
    status::JobStatusBoard,
};

/// Default wait for in-flight handlers once shutdown is requested.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Which in-flight handlers finished inside the shutdown grace period and
/// which were abandoned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    pub finished: Vec<String>,
    pub unfinished: Vec<String>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.unfinished.is_empty()
    }
}

/// Runtime slot for one registered job.
struct Slot {
    def: Arc<JobDefinition>,
    next_fire: Option<DateTime<Utc>>,
    in_flight: Option<JoinHandle<()>>,
}

/// Core scheduler: owns the registry and the shared state, and dispatches
/// every job on its own cadence.
pub struct SchedulerEngine {
    registry: JobRegistry,
    state: Arc<SharedState>,
    board: Arc<JobStatusBoard>,
    shutdown_grace: Duration,
}

impl SchedulerEngine {
    pub fn new(registry: JobRegistry, state: Arc<SharedState>) -> Self {
        Self {
            registry,
            state,
            board: JobStatusBoard::new(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Status board shared with the engine loop; grab it before `run`.
    pub fn status_board(&self) -> Arc<JobStatusBoard> {
        Arc::clone(&self.board)
    }

    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Main event loop. Runs until `shutdown` broadcasts `true` (or its sender
    /// is dropped), then waits for in-flight handlers up to the grace period.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> ShutdownReport {
        let clock = Arc::clone(self.state.clock());
        let started_at = clock.now();

        let mut slots: Vec<Slot> = self
            .registry
            .all()
            .iter()
            .map(|def| {
                let next_fire = def.cadence.next_fire_after(started_at);
                self.board.register(def, next_fire);
                if next_fire.is_none() {
                    warn!(job = %def.name, cadence = %def.cadence, "cadence never fires; job inactive");
                }
                Slot {
                    def: Arc::clone(def),
                    next_fire,
                    in_flight: None,
                }
            })
            .collect();

        info!(jobs = slots.len(), "scheduler engine started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let Some(wake_at) = slots.iter().filter_map(|s| s.next_fire).min() else {
                // Nothing will ever fire; just wait for the shutdown signal.
                if shutdown.changed().await.is_err() {
                    break;
                }
                continue;
            };

            let delay = (wake_at - clock.now()).to_std().unwrap_or(Duration::ZERO);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            let now = clock.now();
            for slot in slots.iter_mut() {
                self.fire_if_due(slot, now);
            }
        }

        info!("scheduler engine shutting down");
        self.drain(slots).await
    }

    // --- private helpers ---------------------------------------------------

    fn fire_if_due(&self, slot: &mut Slot, now: DateTime<Utc>) {
        let Some(fire_at) = slot.next_fire else {
            return;
        };
        if fire_at > now {
            return;
        }

        self.dispatch(slot, fire_at);

        // Next fire counts from the instant that fired, not from when the
        // handler finishes. Instants already behind us are passed over.
        let name = &slot.def.name;
        let mut next = slot.def.cadence.next_fire_after(fire_at);
        while let Some(missed) = next.filter(|t| *t < now) {
            self.board.mark_skipped(name);
            warn!(job = %name, fired_at = %missed, "fire instant missed while the scheduler was behind");
            next = slot.def.cadence.next_fire_after(missed);
        }
        slot.next_fire = next;
        self.board.set_next_fire(name, next);
    }

    fn dispatch(&self, slot: &mut Slot, fire_at: DateTime<Utc>) {
        let def = &slot.def;
        if !self.board.try_begin(&def.name, fire_at) {
            warn!(job = %def.name, fired_at = %fire_at, "previous invocation still running, fire dropped");
            return;
        }

        let ctx = JobContext::new(def.name.clone(), fire_at, Arc::clone(&self.state));
        let def = Arc::clone(def);
        let board = Arc::clone(&self.board);
        let state = Arc::clone(&self.state);
        slot.in_flight = Some(tokio::spawn(async move {
            invoke(def, ctx, board, state).await;
        }));
    }

    async fn drain(self, slots: Vec<Slot>) -> ShutdownReport {
        let in_flight: Vec<(String, JoinHandle<()>)> = slots
            .into_iter()
            .filter_map(|s| {
                s.in_flight
                    .filter(|h| !h.is_finished())
                    .map(|h| (s.def.name.clone(), h))
            })
            .collect();

        if in_flight.is_empty() {
            info!("scheduler engine stopped, no handlers in flight");
            return ShutdownReport::default();
        }

        info!(
            count = in_flight.len(),
            grace_ms = self.shutdown_grace.as_millis() as u64,
            "waiting for in-flight handlers"
        );
        let deadline = tokio::time::Instant::now() + self.shutdown_grace;
        let waits = in_flight.into_iter().map(|(name, handle)| async move {
            let finished = tokio::time::timeout_at(deadline, handle).await.is_ok();
            (name, finished)
        });

        let mut report = ShutdownReport::default();
        for (name, finished) in join_all(waits).await {
            if finished {
                report.finished.push(name);
            } else {
                // The task keeps running detached; it is not killed.
                warn!(job = %name, "handler still running after grace period, abandoned");
                report.unfinished.push(name);
            }
        }
        info!(
            finished = report.finished.len(),
            unfinished = report.unfinished.len(),
            "scheduler engine stopped"
        );
        report
    }
}

/// One handler invocation: run on its own task so panics are contained,
/// bounded by the job's timeout, always ending back in `Idle`.
async fn invoke(
    def: Arc<JobDefinition>,
    ctx: JobContext,
    board: Arc<JobStatusBoard>,
    state: Arc<SharedState>,
) {
    let fired_at = ctx.fired_at();
    debug!(job = %def.name, fired_at = %fired_at, "handler started");

    let handler = Arc::clone(&def.handler);
    let mut task = tokio::spawn(async move { handler.run(&ctx).await });

    let outcome = match tokio::time::timeout(def.timeout, &mut task).await {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(e))) => Err(SchedulerError::HandlerFailure {
            job: def.name.clone(),
            reason: format!("{e:#}"),
        }),
        Ok(Err(join_err)) => Err(SchedulerError::HandlerFailure {
            job: def.name.clone(),
            reason: if join_err.is_panic() {
                "handler panicked".to_string()
            } else {
                "handler cancelled".to_string()
            },
        }),
        Err(_) => {
            task.abort();
            Err(SchedulerError::HandlerTimeout {
                job: def.name.clone(),
                ms: def.timeout.as_millis() as u64,
            })
        }
    };

    match &outcome {
        Ok(()) => debug!(job = %def.name, fired_at = %fired_at, "handler finished"),
        Err(e) => error!(job = %def.name, fired_at = %fired_at, code = e.code(), "{e}"),
    }
    board.finish(&def.name, outcome.as_ref().map(|_| ()), state.now());
}
