//! # classreflect-database
//!
//! PostgreSQL connection management and repository implementations for
//! the ClassReflect processing core. The schema itself is owned by the
//! upload/transcription subsystem; this crate only reads and mutates
//! the job-status and word-alignment tables it is pointed at.

pub mod connection;
pub mod repositories;

pub use connection::DatabasePool;
