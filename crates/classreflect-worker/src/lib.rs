//! Background maintenance for the ClassReflect processing pipeline.
//!
//! This crate provides the cleanup scheduler that keeps the analysis
//! job table honest: jobs orphaned by a crash are failed at startup,
//! and jobs that exceed the processing budget are failed by a recurring
//! sweep.

pub mod cleanup;

pub use cleanup::{CleanupReport, CleanupService};
