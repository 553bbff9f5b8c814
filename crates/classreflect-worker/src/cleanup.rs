//! Stuck and orphaned analysis job cleanup.
//!
//! No job may stay in `processing` forever. Two sweeps enforce this:
//! an orphan sweep at startup (anything still `processing` when the
//! process boots was abandoned by a crash) and a recurring stuck-job
//! sweep (anything `processing` longer than the configured budget has a
//! hung worker). Both mark the job failed and propagate the failure to
//! the parent audio job; they differ only in the selection predicate
//! and the diagnostic message, which is the one signal downstream
//! consumers have to tell a crash from a timeout.

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing;

use classreflect_core::config::CleanupConfig;
use classreflect_core::result::AppResult;
use classreflect_database::repositories::AnalysisJobRepository;

/// Failure message written to jobs orphaned by a process restart.
pub const RESTART_MESSAGE: &str = "Job stopped - backend service was restarted";

/// Failure message for jobs that exceeded the processing budget.
fn timeout_message(timeout_minutes: i64) -> String {
    format!("Job timed out - exceeded maximum processing time ({timeout_minutes} minutes)")
}

/// Result of a manually triggered sweep: how many jobs remain in
/// `processing` afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    /// Jobs still in `processing` after the sweep.
    pub cleaned: i64,
}

/// Background cleanup scheduler for analysis jobs.
///
/// Constructed once by the host's dependency wiring and driven through
/// [`initialize`](Self::initialize) / [`shutdown`](Self::shutdown).
/// The running timer is owned by the instance, so independent instances
/// (and tests) do not share state.
pub struct CleanupService {
    jobs: Arc<AnalysisJobRepository>,
    config: CleanupConfig,
    sweeper: Mutex<Option<watch::Sender<bool>>>,
}

impl CleanupService {
    /// Create a new cleanup service over the shared job repository.
    pub fn new(jobs: Arc<AnalysisJobRepository>, config: CleanupConfig) -> Self {
        Self {
            jobs,
            config,
            sweeper: Mutex::new(None),
        }
    }

    /// Recover orphaned jobs, run one immediate stuck-job sweep, and
    /// start the recurring sweep.
    ///
    /// Called once during process startup, before traffic that could
    /// create or advance jobs. A failure in the orphan sweep is
    /// returned to the caller: starting up over an inconsistent job
    /// table is worse than not starting. The immediate stuck-job sweep
    /// and every scheduled sweep only log their errors; the timer keeps
    /// running and retries on the next tick. Calling `initialize` on an
    /// already-running service logs a warning and changes nothing.
    pub async fn initialize(&self) -> AppResult<()> {
        if self.is_running() {
            tracing::warn!("Cleanup service already running, ignoring initialize");
            return Ok(());
        }

        tracing::info!("Initializing analysis job cleanup");

        recover_orphaned_jobs(&self.jobs).await?;

        if let Err(e) = sweep_stuck_jobs(&self.jobs, self.config.stuck_timeout_minutes).await {
            tracing::error!("Initial stuck-job sweep failed: {}", e);
        }

        let cancel = {
            let mut slot = self.sweeper.lock().expect("cleanup timer lock poisoned");
            if slot.is_some() {
                tracing::warn!("Cleanup service already running, ignoring initialize");
                return Ok(());
            }
            let (tx, rx) = watch::channel(false);
            *slot = Some(tx);
            rx
        };

        let jobs = Arc::clone(&self.jobs);
        let timeout_minutes = self.config.stuck_timeout_minutes;
        let period = StdDuration::from_secs(self.config.sweep_interval_seconds);
        tokio::spawn(run_sweeper(jobs, timeout_minutes, period, cancel));

        tracing::info!(
            "Cleanup service started (sweep every {} seconds, timeout {} minutes)",
            self.config.sweep_interval_seconds,
            self.config.stuck_timeout_minutes
        );
        Ok(())
    }

    /// Stop the recurring sweep.
    ///
    /// Only pending timer firings are cancelled; a sweep already in
    /// flight runs to completion. Safe to call when the service was
    /// never started.
    pub fn shutdown(&self) {
        let sender = self
            .sweeper
            .lock()
            .expect("cleanup timer lock poisoned")
            .take();
        if let Some(cancel) = sender {
            let _ = cancel.send(true);
            tracing::info!("Cleanup service stopped");
        }
    }

    /// Whether the recurring sweep is currently registered.
    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .expect("cleanup timer lock poisoned")
            .is_some()
    }

    /// Run one stuck-job sweep now and report how many jobs remain in
    /// `processing`, for operator visibility outside the timer path.
    pub async fn trigger_manual(&self) -> AppResult<CleanupReport> {
        sweep_stuck_jobs(&self.jobs, self.config.stuck_timeout_minutes).await?;
        let cleaned = self.jobs.count_processing().await?;
        Ok(CleanupReport { cleaned })
    }
}

/// Timer loop for the recurring sweep. Exits when the cancel channel
/// signals or closes; cancellation is only observed between sweeps.
async fn run_sweeper(
    jobs: Arc<AnalysisJobRepository>,
    timeout_minutes: i64,
    period: StdDuration,
    mut cancel: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The interval's first tick fires immediately and the immediate
    // sweep has already run, so consume it.
    ticker.tick().await;

    loop {
        tokio::select! {
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if let Err(e) = sweep_stuck_jobs(&jobs, timeout_minutes).await {
                    tracing::error!("Scheduled cleanup sweep failed: {}", e);
                }
            }
        }
    }

    tracing::debug!("Cleanup sweeper exited");
}

/// Fail every job orphaned in `processing` by a previous run.
///
/// Immediately after a fresh start no worker can legitimately be
/// running, so every `processing` row is presumed abandoned.
async fn recover_orphaned_jobs(jobs: &AnalysisJobRepository) -> AppResult<u64> {
    tracing::info!("Checking for orphaned jobs from a previous run");

    let orphaned = jobs.find_processing(None).await?;
    if orphaned.is_empty() {
        tracing::info!("No orphaned jobs found");
        return Ok(0);
    }

    tracing::warn!(
        "Found {} orphaned analysis jobs, marking as failed",
        orphaned.len()
    );
    for job in &orphaned {
        tracing::warn!(
            "Analysis job {} was orphaned (started at {:?})",
            job.id,
            job.started_at
        );
    }

    let failed = fail_and_propagate(jobs, None, RESTART_MESSAGE).await?;
    tracing::info!("Orphaned job cleanup complete: {} jobs marked as failed", failed);
    Ok(failed)
}

/// Fail every job that has been `processing` longer than the budget.
async fn sweep_stuck_jobs(jobs: &AnalysisJobRepository, timeout_minutes: i64) -> AppResult<u64> {
    let cutoff = Utc::now() - Duration::minutes(timeout_minutes);

    let stuck = jobs.find_processing(Some(cutoff)).await?;
    if stuck.is_empty() {
        tracing::debug!("Cleanup sweep: no stuck jobs found");
        return Ok(0);
    }

    tracing::warn!("Found {} stuck analysis jobs, marking as failed", stuck.len());
    let now = Utc::now();
    for job in &stuck {
        let minutes_stuck = job
            .started_at
            .map(|started| (now - started).num_minutes())
            .unwrap_or_default();
        tracing::warn!("Analysis job {} stuck for {} minutes", job.id, minutes_stuck);
    }

    let failed = fail_and_propagate(jobs, Some(cutoff), &timeout_message(timeout_minutes)).await?;
    tracing::info!("Cleanup sweep complete: {} jobs marked as failed", failed);
    Ok(failed)
}

/// Mark matching `processing` jobs failed, then propagate the failure
/// to parents still showing `analysis_status = 'processing'`.
///
/// Both sweeps funnel through here so the job→parent propagation is
/// defined exactly once; they differ only in predicate and message.
/// The propagation runs even when this sweep failed nothing, which
/// also heals parents left behind if an earlier run stopped between
/// the two updates.
async fn fail_and_propagate(
    jobs: &AnalysisJobRepository,
    started_before: Option<DateTime<Utc>>,
    message: &str,
) -> AppResult<u64> {
    let failed = jobs.fail_processing(started_before, message).await?;
    jobs.propagate_failure(message).await?;
    Ok(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service() -> CleanupService {
        // connect_lazy performs no I/O; these tests never touch the
        // database.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:5432/classreflect_test")
            .unwrap();
        CleanupService::new(
            Arc::new(AnalysisJobRepository::new(pool)),
            CleanupConfig::default(),
        )
    }

    #[test]
    fn test_timeout_message_names_the_budget() {
        assert_eq!(
            timeout_message(30),
            "Job timed out - exceeded maximum processing time (30 minutes)"
        );
        assert!(timeout_message(45).contains("45 minutes"));
    }

    #[test]
    fn test_messages_are_distinguishable() {
        assert_ne!(RESTART_MESSAGE, timeout_message(30));
        assert!(RESTART_MESSAGE.contains("restarted"));
    }

    #[tokio::test]
    async fn test_shutdown_without_initialize_is_noop() {
        let service = service();
        assert!(!service.is_running());
        service.shutdown();
        service.shutdown();
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let report = CleanupReport { cleaned: 3 };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, "{\"cleaned\":3}");
    }
}
