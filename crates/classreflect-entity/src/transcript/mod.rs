//! Transcript domain entities.

pub mod word;

pub use word::WordTimestamp;
