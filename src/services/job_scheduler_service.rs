use crate::errors::AppError;
use crate::jobs::price_refresh_job;
use crate::models::IntradayInterval;
use crate::services::ingestion_service::IngestionEngine;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub ingestion: IngestionEngine,
    pub tickers: Arc<Vec<String>>,
    pub intraday_interval: IntradayInterval,
    pub shutdown: watch::Receiver<bool>,
}

impl JobContext {
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub daily_every: Duration,
    pub intraday_every: Duration,
    pub run_on_start: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct JobResult {
    pub items_processed: usize,
    pub items_empty: usize,
    pub items_failed: usize,
    pub bars_ingested: usize,
    pub interrupted: bool,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
    schedule: ScheduleConfig,
    // Held by a job for the whole of a sweep
    running: Vec<(&'static str, Arc<Mutex<()>>)>,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext, schedule: ScheduleConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            context,
            schedule,
            running: Vec::new(),
        })
    }

    /// Start all scheduled jobs
    pub async fn start(&mut self) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        self.schedule_job(
            self.schedule.daily_every,
            "refresh_daily_prices",
            price_refresh_job::refresh_daily_prices,
        )
        .await?;

        self.schedule_job(
            self.schedule.intraday_every,
            "refresh_intraday_prices",
            price_refresh_job::refresh_intraday_prices,
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started successfully with 2 jobs");
        Ok(())
    }

    /// Stop the scheduler and wait for sweeps in flight.
    ///
    /// Raise the shutdown flag first: a running sweep then finishes its current
    /// ticker and returns, and this call returns once every job is idle.
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        if !self.context.is_shutting_down() {
            warn!("Stopping scheduler without the shutdown flag; running sweeps will complete in full");
        }

        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;

        for (job_name, running) in &self.running {
            let _idle = running.lock().await;
            debug!("{} is idle", job_name);
        }

        info!("✅ Job scheduler stopped");
        Ok(())
    }

    /// Helper to schedule a fixed-interval job with tracking
    async fn schedule_job<F, Fut>(
        &mut self,
        every: Duration,
        job_name: &'static str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);
        // One sweep of a given job at a time; the other job is not affected
        let running = Arc::new(Mutex::new(()));
        self.running.push((job_name, running.clone()));

        if self.schedule.run_on_start {
            let context = context.clone();
            let job_fn = job_fn.clone();
            let running = running.clone();
            tokio::spawn(async move {
                execute_job_with_tracking(job_name, context, job_fn, running).await;
            });
        }

        let job = Job::new_repeated_async(every, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            let running = running.clone();
            Box::pin(async move {
                execute_job_with_tracking(job_name, context, job_fn, running).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} every {}s", job_name, every.as_secs());
        Ok(())
    }
}

// Job tracking wrapper
pub(crate) async fn execute_job_with_tracking<F, Fut>(
    job_name: &str,
    context: JobContext,
    job_fn: Arc<F>,
    running: Arc<Mutex<()>>,
) -> Option<JobResult>
where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    let Ok(_running) = running.try_lock() else {
        warn!("⏭️ Skipping {}: previous sweep still running", job_name);
        return None;
    };

    if context.is_shutting_down() {
        info!("Skipping {}: shutdown in progress", job_name);
        return None;
    }

    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let result = job_fn(context).await;

    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, bars: {}, duration: {}ms)",
                job_name,
                job_result.items_processed,
                job_result.items_failed,
                job_result.bars_ingested,
                duration_ms
            );
            Some(job_result)
        }
        Err(e) => {
            error!("❌ Job failed: {} - {}", job_name, e);
            None
        }
    }
}
