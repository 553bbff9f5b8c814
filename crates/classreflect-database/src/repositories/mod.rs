//! Concrete repository implementations.

pub mod analysis_job;
pub mod word_timestamp;

pub use analysis_job::AnalysisJobRepository;
pub use word_timestamp::WordTimestampRepository;
