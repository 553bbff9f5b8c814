//! # classreflect-entity
//!
//! Domain entity models for ClassReflect. Every struct in this crate
//! represents a database table row owned by the upload/transcription
//! subsystem and consumed by the processing core. All entities derive
//! `Debug`, `Clone`, `Serialize`, `Deserialize`, and `sqlx::FromRow`.

pub mod job;
pub mod transcript;
