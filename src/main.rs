//! ClassReflect maintenance daemon.
//!
//! Hosts the background cleanup scheduler on its own: connects to the
//! shared job store, recovers orphaned jobs, keeps the stuck-job sweep
//! running, and shuts down cleanly on ctrl-c.

use std::sync::Arc;

use tracing;
use tracing_subscriber::{fmt, EnvFilter};

use classreflect_core::config::AppConfig;
use classreflect_core::error::AppError;
use classreflect_database::repositories::AnalysisJobRepository;
use classreflect_database::DatabasePool;
use classreflect_worker::CleanupService;

#[tokio::main]
async fn main() {
    let env = std::env::var("CLASSREFLECT_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Maintenance daemon error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        "Starting ClassReflect maintenance daemon v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db = DatabasePool::connect(&config.database).await?;

    let jobs = Arc::new(AnalysisJobRepository::new(db.pool().clone()));
    let cleanup = CleanupService::new(jobs, config.cleanup.clone());

    // Orphan recovery is startup-critical: abort rather than run with
    // an inconsistent job table.
    cleanup.initialize().await?;

    tracing::info!("Maintenance daemon running, press ctrl-c to stop");
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {e}")))?;

    tracing::info!("Shutdown signal received");
    cleanup.shutdown();
    db.close().await;

    Ok(())
}
