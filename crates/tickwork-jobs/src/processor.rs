//! `email-processor`: drains the notification queue and "sends" each entry.
//!
//! Delivery is simulated: each notification is logged. A notification
//! submitted while a drain is in progress stays queued for the next run.

use async_trait::async_trait;
use tickwork_scheduler::{JobContext, JobHandler};
use tracing::info;

pub struct QueueProcessor;

#[async_trait]
impl JobHandler for QueueProcessor {
    async fn run(&self, ctx: &JobContext) -> anyhow::Result<()> {
        let batch = ctx.state().drain_notifications();
        if batch.is_empty() {
            info!("no notifications in queue");
            return Ok(());
        }

        for note in &batch {
            info!(recipient = %note.recipient, subject = %note.subject, id = %note.id, "sending notification");
        }
        info!(processed = batch.len(), "notification queue drained");
        Ok(())
    }
}
