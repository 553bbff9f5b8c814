//! Aggregate silence statistics over word alignments.
//!
//! Summarizes how much of a recording was speech versus silence and how
//! the silences were distributed. The summary rides along with the
//! timing context into the analysis prompt and its audit log.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use classreflect_core::result::AppResult;
use classreflect_database::repositories::WordTimestampRepository;
use classreflect_entity::transcript::WordTimestamp;

use crate::timing::sanitize;

/// Silences at or above this duration count as long.
const LONG_SILENCE_SECS: f64 = 3.0;

/// Silence statistics for one recording.
#[derive(Debug, Clone, Serialize)]
pub struct PauseMetrics {
    /// Usable word alignments in the recording.
    pub total_words: usize,
    /// Seconds from the first word's start to the last word's end.
    pub total_duration_seconds: f64,
    /// Seconds spent inside words.
    pub total_speech_seconds: f64,
    /// Seconds spent in inter-word silence.
    pub total_silence_seconds: f64,
    /// Mean silence duration.
    pub average_silence_seconds: f64,
    /// Median silence duration.
    pub median_silence_seconds: f64,
    /// 90th-percentile silence duration.
    pub p90_silence_seconds: f64,
    /// Longest single silence.
    pub longest_silence_seconds: f64,
    /// Threshold used for the long-silence counts.
    pub long_silence_threshold_seconds: f64,
    /// Silences at or above the threshold.
    pub long_silence_count: usize,
    /// Long silences as a percentage of all silences.
    pub long_silence_percentage: f64,
    /// Silence as a percentage of the total duration.
    pub silence_percentage: f64,
}

/// Compute silence statistics for a transcription job.
///
/// Returns `None` when fewer than two usable word alignments exist,
/// and on any internal failure (logged as a warning), mirroring the
/// timing-context contract.
pub async fn compute_pause_metrics(
    words: &WordTimestampRepository,
    job_id: Uuid,
) -> Option<PauseMetrics> {
    match fetch_pause_metrics(words, job_id).await {
        Ok(metrics) => metrics,
        Err(e) => {
            warn!("Pause metrics unavailable for job {job_id}: {e}");
            None
        }
    }
}

async fn fetch_pause_metrics(
    words: &WordTimestampRepository,
    job_id: Uuid,
) -> AppResult<Option<PauseMetrics>> {
    let rows = words.find_by_job(job_id).await?;
    Ok(summarize(rows))
}

/// Pure aggregation over fetched rows.
fn summarize(rows: Vec<WordTimestamp>) -> Option<PauseMetrics> {
    let words = sanitize(rows);
    if words.len() < 2 {
        return None;
    }

    let total_speech_seconds: f64 = words.iter().map(|w| (w.end - w.start).max(0.0)).sum();

    let mut gaps: Vec<f64> = words
        .windows(2)
        .filter_map(|pair| {
            let gap = pair[1].start - pair[0].end;
            (gap > 0.0).then_some(gap)
        })
        .collect();
    gaps.sort_by(f64::total_cmp);

    let total_silence_seconds: f64 = gaps.iter().sum();
    let average_silence_seconds = if gaps.is_empty() {
        0.0
    } else {
        total_silence_seconds / gaps.len() as f64
    };

    let median_silence_seconds = match gaps.len() {
        0 => 0.0,
        n if n % 2 == 1 => gaps[n / 2],
        n => (gaps[n / 2 - 1] + gaps[n / 2]) / 2.0,
    };
    let p90_silence_seconds = percentile(&gaps, 90.0);
    let longest_silence_seconds = gaps.last().copied().unwrap_or(0.0);

    let long_silence_count = gaps.iter().filter(|g| **g >= LONG_SILENCE_SECS).count();
    let long_silence_percentage = if gaps.is_empty() {
        0.0
    } else {
        long_silence_count as f64 / gaps.len() as f64 * 100.0
    };

    let total_duration_seconds =
        (words[words.len() - 1].end - words[0].start).max(0.0);
    let silence_percentage = if total_duration_seconds > 0.0 {
        total_silence_seconds / total_duration_seconds * 100.0
    } else {
        0.0
    };

    Some(PauseMetrics {
        total_words: words.len(),
        total_duration_seconds,
        total_speech_seconds,
        total_silence_seconds,
        average_silence_seconds,
        median_silence_seconds,
        p90_silence_seconds,
        longest_silence_seconds,
        long_silence_threshold_seconds: LONG_SILENCE_SECS,
        long_silence_count,
        long_silence_percentage,
        silence_percentage,
    })
}

/// Nearest-rank percentile over ascending values.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((p / 100.0) * sorted.len() as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}
