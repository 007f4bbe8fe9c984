//! Per-brand monitoring lifecycle on top of [`JobScheduler`].
//!
//! A brand is either idle or active. Starting a brand runs one full cycle
//! (ingest, classify, aggregate, evaluate) right away and registers a
//! repeated job that classifies and aggregates every interval. Stopping
//! removes the job and clears the brand's monitoring flag; stored history is
//! kept. A brand whose flag is cleared behind the scheduler's back (for
//! example by `brandpulse stop`) is retired on its next tick.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use brandpulse_core::Brand;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::error::MonitorError;
use crate::pipeline::{CycleReport, Monitor};

/// Result of [`MonitorScheduler::start`].
#[derive(Debug, Clone, Serialize)]
pub struct StartOutcome {
    pub brand: Brand,
    /// Mentions returned by the source in the immediate cycle.
    pub mentions_found: usize,
    /// The brand was already scheduled; no second job was added.
    pub already_active: bool,
    pub cycle: Option<CycleReport>,
}

#[derive(Debug)]
struct BrandSchedule {
    brand_id: Uuid,
    active: AtomicBool,
    in_flight: AtomicBool,
    job_id: StdMutex<Option<Uuid>>,
}

impl BrandSchedule {
    fn new(brand_id: Uuid) -> Self {
        Self {
            brand_id,
            active: AtomicBool::new(true),
            in_flight: AtomicBool::new(false),
            job_id: StdMutex::new(None),
        }
    }

    fn take_job_id(&self) -> Option<Uuid> {
        self.job_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn set_job_id(&self, id: Uuid) {
        *self.job_id.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
    }
}

/// Clears the in-flight flag when a cycle ends, even if it panics.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

type ScheduleMap = Arc<Mutex<HashMap<Uuid, Arc<BrandSchedule>>>>;

/// Run one cycle for a scheduled brand unless it was stopped or a previous
/// cycle is still running. Skipped ticks are dropped, not queued.
///
/// A brand whose stored monitoring flag is off is marked inactive and no
/// cycle runs.
async fn tick(monitor: &Monitor, schedule: &BrandSchedule, with_ingest: bool) -> Option<CycleReport> {
    if !schedule.active.load(Ordering::SeqCst) {
        tracing::debug!(brand_id = %schedule.brand_id, "brand no longer active; tick ignored");
        return None;
    }
    if schedule.in_flight.swap(true, Ordering::SeqCst) {
        tracing::info!(brand_id = %schedule.brand_id, "previous cycle still running; tick skipped");
        return None;
    }
    let _in_flight = InFlight(&schedule.in_flight);

    let brand = match monitor.brand(schedule.brand_id).await {
        Ok(brand) => brand,
        Err(e) => {
            tracing::error!(brand_id = %schedule.brand_id, error = %e, "scheduler: failed to load brand");
            return None;
        }
    };
    if !brand.is_monitoring {
        schedule.active.store(false, Ordering::SeqCst);
        tracing::info!(brand_id = %brand.id, "monitoring disabled in store; tick skipped");
        return None;
    }

    let report = monitor.run_cycle(&brand, with_ingest).await;
    tracing::info!(
        brand_id = %brand.id,
        analyzed = report.analyzed,
        risk = report.snapshot.as_ref().map(|s| s.risk_level.as_str()),
        "scheduler: cycle complete"
    );
    Some(report)
}

/// Drop an inactive schedule's map entry and interval job. The entry is only
/// removed if it still belongs to `schedule`, so a brand restarted in the
/// meantime keeps its new schedule.
async fn retire(brands: &ScheduleMap, scheduler: &JobScheduler, schedule: &Arc<BrandSchedule>) {
    if schedule.active.load(Ordering::SeqCst) {
        return;
    }
    {
        let mut map = brands.lock().await;
        if map
            .get(&schedule.brand_id)
            .is_some_and(|current| Arc::ptr_eq(current, schedule))
        {
            map.remove(&schedule.brand_id);
        }
    }
    if let Some(job_id) = schedule.take_job_id() {
        if let Err(e) = scheduler.remove(&job_id).await {
            tracing::warn!(brand_id = %schedule.brand_id, error = %e, "failed to remove interval job");
        } else {
            tracing::info!(brand_id = %schedule.brand_id, "interval job retired");
        }
    }
}

pub struct MonitorScheduler {
    monitor: Monitor,
    scheduler: JobScheduler,
    interval: Duration,
    brands: ScheduleMap,
}

impl MonitorScheduler {
    /// Build and start the underlying job scheduler. The re-trigger interval
    /// comes from the monitor's pipeline config.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Scheduler`] if the scheduler cannot be
    /// initialised or started.
    pub async fn new(monitor: Monitor) -> Result<Self, MonitorError> {
        let interval = monitor.config().monitor_interval();
        Self::with_interval(monitor, interval).await
    }

    /// Like [`MonitorScheduler::new`] with an explicit interval.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Validation`] for a zero interval and
    /// [`MonitorError::Scheduler`] if the scheduler cannot be started.
    pub async fn with_interval(monitor: Monitor, interval: Duration) -> Result<Self, MonitorError> {
        if interval.is_zero() {
            return Err(MonitorError::Validation(
                "monitor interval must be positive".to_string(),
            ));
        }
        let scheduler = JobScheduler::new().await?;
        scheduler.start().await?;
        Ok(Self {
            monitor,
            scheduler,
            interval,
            brands: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    #[must_use]
    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    /// Ids of the brands currently scheduled.
    pub async fn active_brands(&self) -> Vec<Uuid> {
        self.brands.lock().await.keys().copied().collect()
    }

    pub async fn is_active(&self, brand_id: Uuid) -> bool {
        self.brands.lock().await.contains_key(&brand_id)
    }

    /// Start monitoring a brand by name, creating it if needed.
    ///
    /// Runs one full cycle before returning. Calling this for a brand that is
    /// already active runs another immediate cycle but does not add a second
    /// interval job.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Validation`] for a bad name, and
    /// [`MonitorError::Db`] or [`MonitorError::Scheduler`] if the brand cannot
    /// be stored or scheduled.
    pub async fn start(&self, brand_name: &str) -> Result<StartOutcome, MonitorError> {
        let brand = self.monitor.register_brand(brand_name).await?;

        let (schedule, already_active) = {
            let mut brands = self.brands.lock().await;
            // A schedule deactivated but not yet retired is replaced.
            match brands.get(&brand.id) {
                Some(existing) if existing.active.load(Ordering::SeqCst) => {
                    (Arc::clone(existing), true)
                }
                _ => {
                    let schedule = Arc::new(BrandSchedule::new(brand.id));
                    brands.insert(brand.id, Arc::clone(&schedule));
                    (schedule, false)
                }
            }
        };

        let cycle = tick(&self.monitor, &schedule, true).await;

        if !already_active {
            if let Err(e) = self.add_job(&schedule).await {
                self.brands.lock().await.remove(&brand.id);
                return Err(e);
            }
        }

        let mentions_found = cycle
            .as_ref()
            .and_then(|c| c.ingest)
            .map_or(0, |i| i.fetched);

        tracing::info!(
            brand_id = %brand.id,
            brand = %brand.name,
            mentions_found,
            already_active,
            "monitoring started"
        );
        Ok(StartOutcome {
            brand,
            mentions_found,
            already_active,
            cycle,
        })
    }

    /// Stop monitoring a brand. A cycle already running completes and its
    /// results are stored and pushed; no later cycle starts.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::BrandNotFound`] for an unknown brand and
    /// [`MonitorError::Db`] if the monitoring flag cannot be cleared.
    pub async fn stop(&self, brand_id: Uuid) -> Result<(), MonitorError> {
        self.monitor.brand(brand_id).await?;

        let schedule = self.brands.lock().await.remove(&brand_id);
        if let Some(schedule) = schedule {
            schedule.active.store(false, Ordering::SeqCst);
            if let Some(job_id) = schedule.take_job_id() {
                if let Err(e) = self.scheduler.remove(&job_id).await {
                    tracing::warn!(brand_id = %brand_id, error = %e, "failed to remove interval job");
                }
            }
        }

        self.monitor.store().set_monitoring(brand_id, false).await?;
        tracing::info!(brand_id = %brand_id, "monitoring stopped");
        Ok(())
    }

    /// Reschedule every brand persisted with monitoring enabled. No immediate
    /// cycle is run. Returns the number of brands scheduled.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Db`] if the brands cannot be listed.
    pub async fn resume_active(&self) -> Result<usize, MonitorError> {
        let brands = self.monitor.store().list_monitoring().await?;
        let mut resumed = 0;

        for brand in brands {
            let schedule = {
                let mut map = self.brands.lock().await;
                if map.contains_key(&brand.id) {
                    continue;
                }
                let schedule = Arc::new(BrandSchedule::new(brand.id));
                map.insert(brand.id, Arc::clone(&schedule));
                schedule
            };
            match self.add_job(&schedule).await {
                Ok(()) => resumed += 1,
                Err(e) => {
                    self.brands.lock().await.remove(&brand.id);
                    tracing::error!(brand_id = %brand.id, error = %e, "failed to resume monitoring");
                }
            }
        }

        tracing::info!(count = resumed, "resumed monitored brands");
        Ok(resumed)
    }

    /// Run one scheduled cycle for an active brand now, with the same
    /// skip rules as the interval job. Returns `None` when the brand is not
    /// active, its stored monitoring flag is off, or a cycle is already in
    /// flight.
    pub async fn trigger(&self, brand_id: Uuid) -> Option<CycleReport> {
        let schedule = self.brands.lock().await.get(&brand_id).cloned()?;
        let report = tick(&self.monitor, &schedule, false).await;
        retire(&self.brands, &self.scheduler, &schedule).await;
        report
    }

    /// Stop the underlying job scheduler. Brand monitoring flags are left as
    /// they are so [`MonitorScheduler::resume_active`] picks them up again.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Scheduler`] if shutdown fails.
    pub async fn shutdown(&self) -> Result<(), MonitorError> {
        let mut scheduler = self.scheduler.clone();
        scheduler.shutdown().await?;
        Ok(())
    }

    async fn add_job(&self, schedule: &Arc<BrandSchedule>) -> Result<(), MonitorError> {
        let monitor = self.monitor.clone();
        let brands = Arc::clone(&self.brands);
        let scheduler = self.scheduler.clone();
        let job_schedule = Arc::clone(schedule);

        let job = Job::new_repeated_async(self.interval, move |_uuid, _lock| {
            let monitor = monitor.clone();
            let brands = Arc::clone(&brands);
            let scheduler = scheduler.clone();
            let schedule = Arc::clone(&job_schedule);
            Box::pin(async move {
                tick(&monitor, &schedule, false).await;
                retire(&brands, &scheduler, &schedule).await;
            })
        })?;

        let job_id = self.scheduler.add(job).await?;
        schedule.set_job_id(job_id);

        // A stop that raced with this registration found no job to remove.
        if !schedule.active.load(Ordering::SeqCst) {
            if let Some(job_id) = schedule.take_job_id() {
                self.scheduler.remove(&job_id).await?;
            }
        }

        tracing::debug!(
            brand_id = %schedule.brand_id,
            interval_secs = self.interval.as_secs(),
            "interval job registered"
        );
        Ok(())
    }
}

impl std::fmt::Debug for MonitorScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorScheduler")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
