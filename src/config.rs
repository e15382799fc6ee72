use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Longest ideal time per question: one day
pub const MAX_IDEAL_MINUTES: u32 = 24 * 60;
/// Longest threshold or bucket bound: one day
pub const MAX_BOUND_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ideal time per question must be at least one minute")]
    ZeroIdealTime,
    #[error("ideal time per question must be at most one day, got {0} minutes")]
    IdealTimeTooLong(u32),
    #[error("long question threshold must be greater than zero")]
    ZeroLongThreshold,
    #[error("long question threshold must be at most one day, got {0}s")]
    LongThresholdTooLong(u64),
    #[error("time bucket bounds must be strictly ascending and non-zero: {0:?}")]
    UnorderedBuckets(Vec<u64>),
    #[error("time bucket bound must be at most one day, got {0}s")]
    BucketTooLarge(u64),
}

/// Thresholds captured at session start
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub ideal_minutes_per_question: u32,
    pub long_question_threshold_secs: u64,
    pub bucket_bounds_secs: Vec<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ideal_minutes_per_question: 2,
            long_question_threshold_secs: 180,
            bucket_bounds_secs: vec![60, 120, 180],
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ideal_minutes_per_question == 0 {
            return Err(ConfigError::ZeroIdealTime);
        }
        if self.ideal_minutes_per_question > MAX_IDEAL_MINUTES {
            return Err(ConfigError::IdealTimeTooLong(
                self.ideal_minutes_per_question,
            ));
        }
        if self.long_question_threshold_secs == 0 {
            return Err(ConfigError::ZeroLongThreshold);
        }
        if self.long_question_threshold_secs > MAX_BOUND_SECS {
            return Err(ConfigError::LongThresholdTooLong(
                self.long_question_threshold_secs,
            ));
        }
        let ascending = self.bucket_bounds_secs.first().map_or(true, |&b| b > 0)
            && self.bucket_bounds_secs.windows(2).all(|w| w[0] < w[1]);
        if !ascending {
            return Err(ConfigError::UnorderedBuckets(self.bucket_bounds_secs.clone()));
        }
        if let Some(&b) = self.bucket_bounds_secs.iter().find(|&&b| b > MAX_BOUND_SECS) {
            return Err(ConfigError::BucketTooLarge(b));
        }
        Ok(())
    }

    /// Budget for a whole session of `question_count` questions
    pub fn total_allocated_ms(&self, question_count: usize) -> i64 {
        i64::try_from(question_count)
            .unwrap_or(i64::MAX)
            .saturating_mul(self.ideal_minutes_per_question as i64)
            .saturating_mul(60_000)
    }

    pub fn long_question_threshold_ms(&self) -> u64 {
        self.long_question_threshold_secs.saturating_mul(1000)
    }

    /// Bucket bounds in milliseconds, saturating for unvalidated configs
    pub fn bucket_bounds_ms(&self) -> Vec<u64> {
        self.bucket_bounds_secs
            .iter()
            .map(|s| s.saturating_mul(1000))
            .collect()
    }
}

pub trait ConfigStore {
    fn load(&self) -> SessionConfig;
    fn save(&self, cfg: &SessionConfig) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = crate::app_dirs::AppDirs::config_path()
            .unwrap_or_else(|| PathBuf::from("qclock_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> SessionConfig {
        let Ok(bytes) = fs::read(&self.path) else {
            return SessionConfig::default();
        };
        match serde_json::from_slice::<SessionConfig>(&bytes) {
            Ok(cfg) if cfg.validate().is_ok() => cfg,
            Ok(_) | Err(_) => {
                warn!(
                    "ignoring unusable config at {}, using defaults",
                    self.path.display()
                );
                SessionConfig::default()
            }
        }
    }

    fn save(&self, cfg: &SessionConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
