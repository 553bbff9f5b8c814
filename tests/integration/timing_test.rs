//! Timing context and pause metrics tests over database rows.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use classreflect_analysis::{build_timing_context, compute_pause_metrics};
use classreflect_database::repositories::WordTimestampRepository;

use crate::helpers::{db_guard, TestDb};

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn timing_context_from_database_rows() {
    let _guard = db_guard().await;
    let db = TestDb::connect().await;

    let job_id = Uuid::new_v4();
    db.seed_words(
        job_id,
        &[
            ("okay", 0.0, 0.4),
            ("let's", 0.5, 0.9),
            ("begin", 1.0, 1.6),
            ("next", 6.0, 6.5),
        ],
    )
    .await;

    let words = WordTimestampRepository::new(db.pool.clone());

    let context = build_timing_context(&words, job_id).await.unwrap();
    assert!(context.starts_with("TIME-CODED OUTLINE (selected excerpts):"));
    assert!(context.contains("okay let's begin"));
    // The 1.6s → 6.0s silence is the one long pause.
    assert!(context.contains("(4.40s)"));

    let metrics = compute_pause_metrics(&words, job_id).await.unwrap();
    assert_eq!(metrics.total_words, 4);
    assert_eq!(metrics.long_silence_count, 1);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn timing_context_none_without_rows() {
    let _guard = db_guard().await;
    let db = TestDb::connect().await;

    let words = WordTimestampRepository::new(db.pool.clone());
    assert!(build_timing_context(&words, Uuid::new_v4()).await.is_none());
    assert!(compute_pause_metrics(&words, Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn timing_context_none_when_query_fails() {
    // A lazy pool pointed at a closed port makes the fetch fail; the
    // synthesizers must degrade to None instead of propagating.
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy("postgres://localhost:1/classreflect_unreachable")
        .unwrap();
    let words = WordTimestampRepository::new(pool);

    assert!(build_timing_context(&words, Uuid::new_v4()).await.is_none());
    assert!(compute_pause_metrics(&words, Uuid::new_v4()).await.is_none());
}
