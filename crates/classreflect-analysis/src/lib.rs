//! # classreflect-analysis
//!
//! Read-only enrichment of analysis prompts from word-alignment data:
//! a time-coded outline with longest-pause excerpts
//! ([`timing::build_timing_context`]) and aggregate silence statistics
//! ([`metrics::compute_pause_metrics`]).
//!
//! Both entry points degrade softly: on missing data or any internal
//! failure they log and return `None`, because prompt enrichment must
//! never block the analysis request that asked for it.

pub mod clock;
pub mod metrics;
pub mod timing;

pub use metrics::{compute_pause_metrics, PauseMetrics};
pub use timing::build_timing_context;
