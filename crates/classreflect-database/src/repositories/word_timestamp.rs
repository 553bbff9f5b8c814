//! Word-alignment repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use classreflect_core::error::{AppError, ErrorKind};
use classreflect_core::result::AppResult;
use classreflect_entity::transcript::WordTimestamp;

/// Read-only repository over the word-alignment rows written by the
/// transcription engine.
#[derive(Debug, Clone)]
pub struct WordTimestampRepository {
    pool: PgPool,
}

impl WordTimestampRepository {
    /// Create a new word-timestamp repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch all word rows for a transcription job in transcript order.
    pub async fn find_by_job(&self, job_id: Uuid) -> AppResult<Vec<WordTimestamp>> {
        sqlx::query_as::<_, WordTimestamp>(
            "SELECT job_id, word_index, word_text, start_time, end_time \
             FROM word_timestamps \
             WHERE job_id = $1 \
             ORDER BY word_index ASC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to fetch word timestamps", e)
        })
    }
}
