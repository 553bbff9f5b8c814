//! Timing-context synthesis from word alignments.
//!
//! Turns the word-level timestamps of a completed transcription into a
//! short, bounded text block: a time-coded outline of what was said and
//! when, plus the longest silences with the speech around them. The
//! block is injected into the analysis prompt so the model has temporal
//! grounding without the full timestamped transcript.

use tracing::warn;
use uuid::Uuid;

use classreflect_core::result::AppResult;
use classreflect_database::repositories::WordTimestampRepository;
use classreflect_entity::transcript::WordTimestamp;

use crate::clock::format_clock;

/// Gaps at or above this duration are reported as long pauses.
const LONG_PAUSE_SECS: f64 = 3.0;
/// Inter-word gap that forces a new outline segment.
const SEGMENT_BREAK_SECS: f64 = 1.5;
/// Maximum span a single outline segment may cover.
const MAX_SEGMENT_SECS: f64 = 10.0;
/// Seconds of surrounding speech quoted on each side of a pause.
const PAUSE_CONTEXT_SECS: f64 = 4.0;
/// Character budget for each pause excerpt.
const PAUSE_TEXT_MAX: usize = 140;
/// Character budget for each outline segment.
const SEGMENT_TEXT_MAX: usize = 180;
/// At most this many pauses are rendered.
const MAX_PAUSES: usize = 5;
/// At most this many outline segments are rendered.
const MAX_SEGMENTS: usize = 8;

/// A sanitized word alignment, sorted into temporal order.
pub(crate) struct Word {
    index: i32,
    text: String,
    pub(crate) start: f64,
    pub(crate) end: f64,
}

/// The silence between two temporally adjacent words. `preceding` is
/// the position of the earlier word within the sorted word slice.
struct Gap {
    start: f64,
    end: f64,
    duration: f64,
    preceding: usize,
}

/// A run of words merged into one outline row.
struct Segment {
    start: f64,
    end: f64,
    text: String,
}

/// Build the timing-context block for a transcription job.
///
/// Returns `None` when the job has no usable word alignments, and also
/// on any internal failure (logged as a warning): this enrichment must
/// never block the analysis request that depends on it.
pub async fn build_timing_context(
    words: &WordTimestampRepository,
    job_id: Uuid,
) -> Option<String> {
    match fetch_timing_context(words, job_id).await {
        Ok(context) => context,
        Err(e) => {
            warn!("Timing context unavailable for job {job_id}: {e}");
            None
        }
    }
}

async fn fetch_timing_context(
    words: &WordTimestampRepository,
    job_id: Uuid,
) -> AppResult<Option<String>> {
    let rows = words.find_by_job(job_id).await?;
    Ok(compose_timing_context(rows))
}

/// Pure composition over fetched rows.
fn compose_timing_context(rows: Vec<WordTimestamp>) -> Option<String> {
    let words = sanitize(rows);
    if words.is_empty() {
        return None;
    }

    let pauses = longest_pauses(detect_gaps(&words));
    let pause_lines: Vec<String> = if pauses.is_empty() {
        vec![format!("- none ≥ {LONG_PAUSE_SECS:.1}s found")]
    } else {
        pauses.iter().map(|g| render_pause(&words, g)).collect()
    };

    let segment_lines: Vec<String> = Segments::over(&words)
        .take(MAX_SEGMENTS)
        .map(render_segment)
        .collect();

    let mut lines = Vec::with_capacity(segment_lines.len() + pause_lines.len() + 3);
    lines.push("TIME-CODED OUTLINE (selected excerpts):".to_string());
    lines.extend(segment_lines);
    lines.push(String::new());
    lines.push("LONGEST PAUSES (context around silence):".to_string());
    lines.extend(pause_lines);
    Some(lines.join("\n"))
}

/// Project rows into [`Word`]s, discarding corrupt alignments and
/// sorting by start time.
///
/// Rows arrive ordered by `word_index`, but upstream alignment indices
/// are not guaranteed to match temporal order, so the sort is not
/// redundant. `word_index` stays the tie-break for simultaneous starts.
pub(crate) fn sanitize(rows: Vec<WordTimestamp>) -> Vec<Word> {
    let mut words: Vec<Word> = rows
        .into_iter()
        .filter(|r| {
            r.start_time.is_finite() && r.end_time.is_finite() && r.end_time >= r.start_time
        })
        .map(|r| Word {
            index: r.word_index,
            text: r.word_text,
            start: r.start_time,
            end: r.end_time,
        })
        .collect();
    words.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.index.cmp(&b.index)));
    words
}

/// Positive silences between temporally adjacent words.
fn detect_gaps(words: &[Word]) -> Vec<Gap> {
    words
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let duration = pair[1].start - pair[0].end;
            (duration > 0.0).then(|| Gap {
                start: pair[0].end,
                end: pair[1].start,
                duration,
                preceding: i,
            })
        })
        .collect()
}

/// Keep the longest gaps at or above the pause threshold.
fn longest_pauses(mut gaps: Vec<Gap>) -> Vec<Gap> {
    gaps.retain(|g| g.duration >= LONG_PAUSE_SECS);
    gaps.sort_by(|a, b| b.duration.total_cmp(&a.duration));
    gaps.truncate(MAX_PAUSES);
    gaps
}

/// Quote the speech on either side of a pause.
///
/// The before-window covers words ending at the pause start and
/// reaching back [`PAUSE_CONTEXT_SECS`]; the after-window covers words
/// from the pause end reaching forward the same amount (anchored 4 s
/// past the gap end when no following word exists).
fn pause_excerpt(words: &[Word], gap: &Gap) -> (String, String) {
    let last_before = &words[gap.preceding];
    let window_start = (last_before.end - PAUSE_CONTEXT_SECS).max(0.0);
    let before: Vec<&str> = words
        .iter()
        .filter(|w| w.start >= window_start && w.end <= last_before.end)
        .map(|w| w.text.as_str())
        .collect();

    let (after_start, window_end) = match words.get(gap.preceding + 1) {
        Some(next) => (next.start, next.start + PAUSE_CONTEXT_SECS),
        None => (0.0, last_before.end + PAUSE_CONTEXT_SECS),
    };
    let after: Vec<&str> = words
        .iter()
        .filter(|w| w.start >= after_start && w.end <= window_end)
        .map(|w| w.text.as_str())
        .collect();

    (
        truncate_text(&before.join(" "), PAUSE_TEXT_MAX),
        truncate_text(&after.join(" "), PAUSE_TEXT_MAX),
    )
}

fn render_pause(words: &[Word], gap: &Gap) -> String {
    let (before, after) = pause_excerpt(words, gap);
    format!(
        "- {} – {} ({:.2}s) | \"{}\" → \"{}\"",
        format_clock(gap.start),
        format_clock(gap.end),
        gap.duration,
        before,
        after
    )
}

fn render_segment(segment: Segment) -> String {
    format!(
        "[{} - {}] {}",
        format_clock(segment.start),
        format_clock(segment.end),
        truncate_text(&segment.text, SEGMENT_TEXT_MAX)
    )
}

/// Truncate to `max` characters, ellipsis included, when longer.
fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut truncated: String = text.chars().take(max - 1).collect();
        truncated.push('…');
        truncated
    } else {
        text.to_string()
    }
}

/// Lazy segmentation of the sorted words into outline rows.
///
/// A segment closes when the gap to the next word reaches
/// [`SEGMENT_BREAK_SECS`] or when admitting the word would push the
/// segment span past [`MAX_SEGMENT_SECS`].
struct Segments<'a> {
    words: &'a [Word],
    pos: usize,
}

impl<'a> Segments<'a> {
    fn over(words: &'a [Word]) -> Self {
        Self { words, pos: 0 }
    }
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let first = self.words.get(self.pos)?;
        let start = first.start;
        let mut end = first.end;
        let mut text = first.text.clone();
        self.pos += 1;

        while let Some(word) = self.words.get(self.pos) {
            let gap = (word.start - end).max(0.0);
            let span_if_added = end.max(word.end) - start;
            if gap >= SEGMENT_BREAK_SECS || span_if_added > MAX_SEGMENT_SECS {
                break;
            }
            text.push(' ');
            text.push_str(&word.text);
            end = end.max(word.end);
            self.pos += 1;
        }

        Some(Segment { start, end, text })
    }
}
