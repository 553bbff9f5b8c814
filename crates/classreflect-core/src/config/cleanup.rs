//! Stuck-job cleanup configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the analysis job cleanup scheduler.
///
/// The defaults match the processing budget the rest of the pipeline is
/// tuned around: a job still `processing` after 30 minutes is treated as
/// stuck, and the sweep looking for such jobs runs every 5 minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Minutes a job may stay in `processing` before it is failed.
    #[serde(default = "default_stuck_timeout_minutes")]
    pub stuck_timeout_minutes: i64,
    /// Seconds between recurring stuck-job sweeps.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            stuck_timeout_minutes: default_stuck_timeout_minutes(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

fn default_stuck_timeout_minutes() -> i64 {
    30
}

fn default_sweep_interval_seconds() -> u64 {
    5 * 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CleanupConfig::default();
        assert_eq!(config.stuck_timeout_minutes, 30);
        assert_eq!(config.sweep_interval_seconds, 300);
    }
}
