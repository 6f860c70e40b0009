//! `tickwork-scheduler`: cron-style dispatch of named jobs over shared,
//! lock-guarded in-memory state.
//!
//! # Overview
//!
//! Jobs are registered once in a [`registry::JobRegistry`], each pairing a
//! [`cadence::Cadence`] with a [`registry::JobHandler`]. The
//! [`engine::SchedulerEngine`] sleeps until the earliest fire instant, spawns
//! every due handler on its own task and recomputes that job's next fire from
//! the instant it fired.
//!
//! # Dispatch policy
//!
//! | Situation                               | Behaviour                                  |
//! |-----------------------------------------|--------------------------------------------|
//! | Fire while the job is idle              | Handler spawned, job marked running        |
//! | Fire while the previous run is ongoing  | Fire dropped and counted as skipped        |
//! | Handler returns `Err` or panics         | Logged as a failure, job back to idle      |
//! | Handler exceeds its timeout             | Aborted, logged as a failure, back to idle |
//! | Shutdown signal                         | Wait for in-flight handlers up to a grace period |
//!
//! Handlers reach the [`state::SharedState`] (metrics ledger, notification
//! queue, execution counter) only through its locked accessors.

pub mod cadence;
pub mod clock;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod queue;
pub mod registry;
pub mod state;
pub mod status;
pub mod types;

pub use cadence::Cadence;
pub use clock::{Clock, SystemClock, TokioClock};
pub use engine::{SchedulerEngine, ShutdownReport};
pub use error::{Result, SchedulerError};
pub use registry::{handler_fn, JobContext, JobDefinition, JobHandler, JobRegistry};
pub use state::SharedState;
pub use status::{JobRecord, JobStatusBoard};
pub use types::{
    HealthSnapshot, JobState, MetricsOverview, Notification, QueueOverview, StateCounters,
    SubmitReceipt,
};
