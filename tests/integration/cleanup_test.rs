//! Cleanup scheduler lifecycle tests against PostgreSQL.

use std::sync::Arc;

use classreflect_core::config::CleanupConfig;
use classreflect_database::repositories::AnalysisJobRepository;
use classreflect_worker::cleanup::RESTART_MESSAGE;
use classreflect_worker::CleanupService;

use crate::helpers::{db_guard, minutes_ago, TestDb};

const TIMEOUT_MESSAGE: &str = "Job timed out - exceeded maximum processing time (30 minutes)";

fn cleanup_service(db: &TestDb) -> CleanupService {
    CleanupService::new(
        Arc::new(AnalysisJobRepository::new(db.pool.clone())),
        CleanupConfig::default(),
    )
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn orphan_sweep_fails_processing_jobs_and_propagates() {
    let _guard = db_guard().await;
    let db = TestDb::connect().await;

    let audio = db.seed_audio_job("processing").await;
    let job = db
        .seed_analysis_job(audio, "processing", Some(minutes_ago(2)))
        .await;
    let done_audio = db.seed_audio_job("completed").await;
    let done = db
        .seed_analysis_job(done_audio, "completed", Some(minutes_ago(50)))
        .await;

    let service = cleanup_service(&db);
    service.initialize().await.unwrap();
    assert!(service.is_running());
    service.shutdown();
    assert!(!service.is_running());

    // Even a recently started job counts as orphaned at startup.
    let (status, message, completed_at) = db.analysis_row(job).await;
    assert_eq!(status, "failed");
    assert_eq!(message.as_deref(), Some(RESTART_MESSAGE));
    assert!(completed_at.is_some());

    let (audio_status, audio_completed) = db.audio_row(audio).await;
    assert_eq!(audio_status, "failed");
    assert!(audio_completed.is_some());

    // Terminal rows are untouched.
    let (status, message, _) = db.analysis_row(done).await;
    assert_eq!(status, "completed");
    assert!(message.is_none());
    let (audio_status, _) = db.audio_row(done_audio).await;
    assert_eq!(audio_status, "completed");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn initialize_twice_does_not_stack_timers() {
    let _guard = db_guard().await;
    let db = TestDb::connect().await;

    let service = cleanup_service(&db);
    service.initialize().await.unwrap();
    service.initialize().await.unwrap();
    assert!(service.is_running());
    service.shutdown();
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn stuck_sweep_only_fails_timed_out_jobs() {
    let _guard = db_guard().await;
    let db = TestDb::connect().await;

    let old_audio = db.seed_audio_job("processing").await;
    let old = db
        .seed_analysis_job(old_audio, "processing", Some(minutes_ago(45)))
        .await;
    let fresh_audio = db.seed_audio_job("processing").await;
    let fresh = db
        .seed_analysis_job(fresh_audio, "processing", Some(minutes_ago(5)))
        .await;

    let service = cleanup_service(&db);
    let report = service.trigger_manual().await.unwrap();

    // The fresh job is the one still processing afterwards.
    assert_eq!(report.cleaned, 1);

    let (status, message, completed_at) = db.analysis_row(old).await;
    assert_eq!(status, "failed");
    assert_eq!(message.as_deref(), Some(TIMEOUT_MESSAGE));
    assert!(completed_at.is_some());
    assert_eq!(db.audio_row(old_audio).await.0, "failed");

    let (status, message, _) = db.analysis_row(fresh).await;
    assert_eq!(status, "processing");
    assert!(message.is_none());
    assert_eq!(db.audio_row(fresh_audio).await.0, "processing");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn resweep_is_idempotent() {
    let _guard = db_guard().await;
    let db = TestDb::connect().await;

    let audio = db.seed_audio_job("processing").await;
    db.seed_analysis_job(audio, "processing", Some(minutes_ago(60)))
        .await;

    let repo = AnalysisJobRepository::new(db.pool.clone());
    let cutoff = minutes_ago(30);

    let first = repo
        .fail_processing(Some(cutoff), TIMEOUT_MESSAGE)
        .await
        .unwrap();
    assert_eq!(first, 1);
    repo.propagate_failure(TIMEOUT_MESSAGE).await.unwrap();

    let second = repo
        .fail_processing(Some(cutoff), TIMEOUT_MESSAGE)
        .await
        .unwrap();
    assert_eq!(second, 0);
    assert_eq!(repo.count_processing().await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn propagation_skips_parents_not_processing() {
    let _guard = db_guard().await;
    let db = TestDb::connect().await;

    // The child is stuck but the parent already moved on.
    let audio = db.seed_audio_job("completed").await;
    let job = db
        .seed_analysis_job(audio, "processing", Some(minutes_ago(60)))
        .await;

    let service = cleanup_service(&db);
    service.trigger_manual().await.unwrap();

    assert_eq!(db.analysis_row(job).await.0, "failed");
    let (audio_status, audio_completed) = db.audio_row(audio).await;
    assert_eq!(audio_status, "completed");
    assert!(audio_completed.is_none());
}
