//! Analysis job status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an analysis job.
///
/// Stored as lowercase text in both `analysis_jobs.status` and the
/// parent `audio_jobs.analysis_status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Waiting to be picked up by the analysis worker.
    Queued,
    /// Currently being processed.
    Processing,
    /// Successfully completed.
    Completed,
    /// Failed, either by the worker or by the cleanup sweep.
    Failed,
}

impl AnalysisStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
