//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! The registry never prunes on its own; this scheduler is the external
//! trigger that sweeps stale unconfirmed registrations.
//!
//! ```text
//! Scheduler (PRUNE_SCHEDULE, hourly by default)
//!     │
//!     └─► MembershipRegistry::prune_expired()
//!             └─► delete unconfirmed members past the expiry window
//! ```

use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::member::MembershipRegistry;

/// Start all scheduled tasks
pub async fn start_scheduler(
    registry: Arc<MembershipRegistry>,
    prune_schedule: &str,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let prune_registry = registry.clone();
    let prune_job = Job::new_async(prune_schedule, move |_uuid, _lock| {
        let registry = prune_registry.clone();
        Box::pin(async move {
            if let Err(e) = run_prune(&registry).await {
                tracing::error!("Prune task failed: {}", e);
            }
        })
    })?;

    scheduler.add(prune_job).await?;
    scheduler.start().await?;

    tracing::info!(
        schedule = prune_schedule,
        "Scheduled tasks started (expired registration pruning)"
    );
    Ok(scheduler)
}

/// Run one pruning sweep with the registry's configured window
async fn run_prune(registry: &MembershipRegistry) -> Result<()> {
    tracing::info!("Running expired registration prune task");

    let deleted = registry.prune_expired().await?;

    tracing::info!(
        "Prune complete: removed {} unconfirmed registrations",
        deleted
    );

    Ok(())
}
