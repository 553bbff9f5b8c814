//! Word-alignment entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One word-alignment row produced by the transcription engine.
///
/// Immutable once written; this core only ever reads these rows.
/// `word_index` defines the canonical transcript order, while
/// `start_time`/`end_time` are offsets in seconds into the source
/// audio. The two orderings usually agree but are not guaranteed to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WordTimestamp {
    /// Transcription job the word belongs to (`audio_jobs.id`).
    pub job_id: Uuid,
    /// Position of the word within the transcript.
    pub word_index: i32,
    /// The transcribed word.
    pub word_text: String,
    /// Start offset in seconds.
    pub start_time: f64,
    /// End offset in seconds.
    pub end_time: f64,
}
