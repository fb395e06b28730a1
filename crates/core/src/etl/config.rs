//! ETL run configuration.

use std::time::Duration;

use super::batch::{DEFAULT_CHUNK_PAUSE, DEFAULT_CHUNK_SIZE};
use crate::errors::{Error, Result};

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    /// Records per upsert chunk (one transaction each).
    pub batch_size: usize,
    /// Pause between chunks, a rate-limiting courtesy to the destination.
    pub batch_pause: Duration,
    /// Perform an incremental load (filter against the warehouse watermark).
    pub incremental: bool,
    /// Run the data quality validation and cleaning stage.
    pub enable_validation: bool,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_CHUNK_SIZE,
            batch_pause: DEFAULT_CHUNK_PAUSE,
            incremental: true,
            enable_validation: true,
        }
    }
}

impl EtlConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults for unset keys.
    ///
    /// Recognized keys: `ETL_BATCH_SIZE`, `ETL_BATCH_PAUSE_MS`,
    /// `ETL_INCREMENTAL`, `ETL_ENABLE_VALIDATION`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("ETL_BATCH_SIZE") {
            config.batch_size = raw.parse().map_err(|_| {
                Error::InvalidConfigValue(format!("ETL_BATCH_SIZE: {}", raw))
            })?;
        }
        if let Ok(raw) = std::env::var("ETL_BATCH_PAUSE_MS") {
            let ms: u64 = raw.parse().map_err(|_| {
                Error::InvalidConfigValue(format!("ETL_BATCH_PAUSE_MS: {}", raw))
            })?;
            config.batch_pause = Duration::from_millis(ms);
        }
        if let Ok(raw) = std::env::var("ETL_INCREMENTAL") {
            config.incremental = raw.eq_ignore_ascii_case("true");
        }
        if let Ok(raw) = std::env::var("ETL_ENABLE_VALIDATION") {
            config.enable_validation = raw.eq_ignore_ascii_case("true");
        }

        Ok(config)
    }
}
