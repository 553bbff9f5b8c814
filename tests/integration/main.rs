//! Integration tests for the ClassReflect processing core.
//!
//! DB-backed tests are `#[ignore]`d by default and expect a PostgreSQL
//! instance reachable via `CLASSREFLECT_TEST_DATABASE_URL`. Run them
//! with `cargo test -- --ignored`.

mod cleanup_test;
mod helpers;
mod timing_test;
