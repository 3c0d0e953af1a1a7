use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::MaintenanceConfig;
use crate::services::AuthService;

/// Background housekeeping. Currently only purges dead revocation entries.
pub struct MaintenanceScheduler {
    auth: Arc<dyn AuthService>,
    config: MaintenanceConfig,
}

impl MaintenanceScheduler {
    pub fn new(auth: Arc<dyn AuthService>, config: MaintenanceConfig) -> Self {
        Self { auth, config }
    }

    /// Registers and starts the cron jobs. Returns `None` when maintenance is
    /// disabled; otherwise the caller owns the scheduler and shuts it down.
    pub async fn start(&self) -> Result<Option<JobScheduler>> {
        if !self.config.purge_enabled {
            info!("Revoked token purge is disabled in config");
            return Ok(None);
        }

        let mut sched = JobScheduler::new().await?;

        let auth = Arc::clone(&self.auth);
        let job = Job::new_async(self.config.purge_cron.as_str(), move |_uuid, _lock| {
            let auth = Arc::clone(&auth);
            Box::pin(async move {
                run_purge(auth.as_ref()).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Revoked token purge scheduled: {}", self.config.purge_cron);

        Ok(Some(sched))
    }

    pub async fn run_once(&self) -> Result<u64> {
        Ok(self.auth.purge_revoked().await?)
    }
}

async fn run_purge(auth: &dyn AuthService) {
    let start = std::time::Instant::now();
    info!(event = "job_started", job_name = "purge_revoked_tokens", "Starting revoked token purge");

    match auth.purge_revoked().await {
        Ok(purged) => info!(
            event = "job_finished",
            job_name = "purge_revoked_tokens",
            purged,
            duration_ms = start.elapsed().as_millis(),
            "Revoked token purge finished"
        ),
        Err(e) => error!(
            event = "job_failed",
            job_name = "purge_revoked_tokens",
            error = %e,
            "Revoked token purge failed"
        ),
    }
}
