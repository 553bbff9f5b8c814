//! Analysis job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::AnalysisStatus;

/// One analysis job row.
///
/// Rows are created by the upload handler when a teacher requests an
/// analysis and advanced by the analysis worker; the cleanup scheduler
/// only ever drives `processing` rows to `failed`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisJob {
    /// Unique job identifier.
    pub id: Uuid,
    /// Parent audio job this analysis belongs to (`audio_jobs.id`).
    pub job_id: Uuid,
    /// Current job status.
    pub status: AnalysisStatus,
    /// When the job started executing. Non-null whenever the job is
    /// `processing`.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// Diagnostic message, set only on failure.
    pub error_message: Option<String>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
}
