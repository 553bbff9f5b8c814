//! Analysis job repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use classreflect_core::error::{AppError, ErrorKind};
use classreflect_core::result::AppResult;
use classreflect_entity::job::AnalysisJob;

/// Repository for analysis job status queries and failure marking.
///
/// Only the transitions the cleanup scheduler needs are implemented
/// here; the analysis worker that drives the happy path lives in the
/// API service and owns its own queries.
#[derive(Debug, Clone)]
pub struct AnalysisJobRepository {
    pool: PgPool,
}

impl AnalysisJobRepository {
    /// Create a new analysis job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List jobs currently in `processing`, oldest first.
    ///
    /// With `started_before` set, only jobs that started before the
    /// cutoff are returned; with `None`, every `processing` row matches
    /// (the startup orphan case).
    pub async fn find_processing(
        &self,
        started_before: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<AnalysisJob>> {
        sqlx::query_as::<_, AnalysisJob>(
            "SELECT id, job_id, status, started_at, completed_at, error_message, created_at \
             FROM analysis_jobs \
             WHERE status = 'processing' \
             AND ($1::timestamptz IS NULL OR started_at < $1) \
             ORDER BY started_at ASC",
        )
        .bind(started_before)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list processing jobs", e)
        })
    }

    /// Mark matching `processing` jobs as failed.
    ///
    /// Sets `error_message` and `completed_at` together with the status
    /// transition. The predicate mirrors [`find_processing`]: `None`
    /// fails every `processing` row, a cutoff fails only rows started
    /// before it. Returns the number of rows updated; re-running with
    /// the same arguments is a no-op since failed rows no longer match.
    ///
    /// [`find_processing`]: Self::find_processing
    pub async fn fail_processing(
        &self,
        started_before: Option<DateTime<Utc>>,
        message: &str,
    ) -> AppResult<u64> {
        sqlx::query(
            "UPDATE analysis_jobs \
             SET status = 'failed', error_message = $1, completed_at = NOW() \
             WHERE status = 'processing' \
             AND ($2::timestamptz IS NULL OR started_at < $2)",
        )
        .bind(message)
        .bind(started_before)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected())
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark jobs as failed", e)
        })
    }

    /// Propagate a child failure to the parent audio job.
    ///
    /// Parents still showing `analysis_status = 'processing'` whose
    /// child analysis job was failed with exactly `message` are moved to
    /// `failed` with `analysis_completed_at = NOW()`. The message match
    /// is what ties the propagation to the sweep that just ran.
    pub async fn propagate_failure(&self, message: &str) -> AppResult<u64> {
        sqlx::query(
            "UPDATE audio_jobs \
             SET analysis_status = 'failed', analysis_completed_at = NOW() \
             FROM analysis_jobs \
             WHERE analysis_jobs.job_id = audio_jobs.id \
             AND analysis_jobs.status = 'failed' \
             AND analysis_jobs.error_message = $1 \
             AND audio_jobs.analysis_status = 'processing'",
        )
        .bind(message)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected())
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to propagate job failure to audio jobs",
                e,
            )
        })
    }

    /// Count jobs currently in `processing`.
    pub async fn count_processing(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM analysis_jobs WHERE status = 'processing'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count processing jobs", e)
            })
    }
}
